//! Transformation session: UI state and the workflow over it.
//!
//! A [`Session`] owns exactly one [`TransformationState`]. Every action
//! builds a new state value from the previous one and publishes it whole,
//! so observers never see a half-applied transition.

use crate::catalog::{self, StyleDefinition};
use crate::error::{Result, StyleGenError, GENERATION_FAILED_MESSAGE};
use crate::image::{EncodedImage, ImageTransformer, TransformRequest};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::watch;

/// Snapshot of everything the UI shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformationState {
    original_image: Option<EncodedImage>,
    result_image: Option<EncodedImage>,
    selected_style_id: &'static str,
    is_processing: bool,
    error: Option<String>,
}

impl Default for TransformationState {
    fn default() -> Self {
        Self::initial()
    }
}

impl TransformationState {
    /// No image, no result, first catalog style, idle, no error.
    pub fn initial() -> Self {
        Self {
            original_image: None,
            result_image: None,
            selected_style_id: catalog::default_style().id,
            is_processing: false,
            error: None,
        }
    }

    /// The loaded source image.
    pub fn original_image(&self) -> Option<&EncodedImage> {
        self.original_image.as_ref()
    }

    /// The last transformed image.
    pub fn result_image(&self) -> Option<&EncodedImage> {
        self.result_image.as_ref()
    }

    /// Id of the selected style. Always present in the catalog.
    pub fn selected_style_id(&self) -> &'static str {
        self.selected_style_id
    }

    /// True while a transform request is in flight.
    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    /// User-facing failure message of the last attempt.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether a transform request would currently be admitted.
    pub fn can_transform(&self) -> bool {
        self.original_image.is_some() && !self.is_processing
    }

    /// Coarse phase, mostly for display and logging.
    pub fn phase(&self) -> Phase {
        if self.is_processing {
            Phase::Processing
        } else if self.result_image.is_some() {
            Phase::HasResult
        } else if self.original_image.is_some() {
            Phase::HasImage
        } else {
            Phase::Idle
        }
    }

    /// New source image; drops any result and error.
    pub fn with_original(self, image: EncodedImage) -> Self {
        Self {
            original_image: Some(image),
            result_image: None,
            error: None,
            ..self
        }
    }

    /// Switches the selected style and nothing else.
    pub fn with_style(self, style: &'static StyleDefinition) -> Self {
        Self {
            selected_style_id: style.id,
            ..self
        }
    }

    /// Marks a request in flight and clears the previous error.
    pub fn processing(self) -> Self {
        Self {
            is_processing: true,
            error: None,
            ..self
        }
    }

    /// Stores a successful result.
    pub fn with_result(self, image: EncodedImage) -> Self {
        Self {
            result_image: Some(image),
            is_processing: false,
            error: None,
            ..self
        }
    }

    /// Records a failed attempt. The result slot is left as it was.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        Self {
            is_processing: false,
            error: Some(message.into()),
            ..self
        }
    }

    /// Clears the processing flag without touching result or error.
    pub fn settled(self) -> Self {
        Self {
            is_processing: false,
            ..self
        }
    }
}

/// Coarse phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing loaded.
    Idle,
    /// Source image loaded, no result yet.
    HasImage,
    /// Waiting on the transformer.
    Processing,
    /// Result available.
    HasResult,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::HasImage => "has-image",
            Self::Processing => "processing",
            Self::HasResult => "has-result",
        };
        f.write_str(s)
    }
}

/// Why a transform request was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformRejection {
    /// No source image loaded.
    NoImage,
    /// Another request is still in flight.
    Busy,
    /// The selected style id did not resolve.
    UnknownStyle,
}

impl fmt::Display for TransformRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NoImage => "no image loaded",
            Self::Busy => "a transformation is already running",
            Self::UnknownStyle => "selected style is not in the catalog",
        };
        f.write_str(s)
    }
}

/// Result of [`Session::transform`].
#[derive(Debug)]
pub enum TransformOutcome {
    /// The result image is now in the state.
    Succeeded,
    /// The transformer failed; the state carries the fixed user message.
    Failed(StyleGenError),
    /// Not admitted; state untouched and nothing was sent.
    Rejected(TransformRejection),
    /// The answer belonged to a superseded request (the session was reset
    /// or a new image was loaded after it was sent) and was dropped.
    Discarded,
}

impl TransformOutcome {
    /// Returns true for [`TransformOutcome::Succeeded`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// An admitted request, produced by [`Session::begin_transform`].
#[derive(Debug, Clone)]
pub struct PendingTransform {
    /// Session-local request id, matched on completion.
    pub id: u64,
    /// Style being applied.
    pub style: &'static StyleDefinition,
    /// Request to hand to the transformer.
    pub request: TransformRequest,
}

/// Builds the export file name for a millisecond timestamp.
pub fn export_file_name(timestamp_ms: i64) -> String {
    format!("transformed-art-{timestamp_ms}.png")
}

/// Reads an image file into an [`EncodedImage`].
///
/// Empty files are rejected so the source-image constraint holds before
/// anything reaches the session state.
pub async fn read_image_file(path: impl AsRef<Path>) -> Result<EncodedImage> {
    let data = tokio::fs::read(path.as_ref()).await?;
    if data.is_empty() {
        return Err(StyleGenError::InvalidRequest(format!(
            "{} is empty",
            path.as_ref().display()
        )));
    }
    Ok(EncodedImage::from_bytes(data))
}

/// The request a session is waiting on.
#[derive(Debug, Clone, Copy)]
struct InFlight {
    id: u64,
    // A new image was loaded after the request was sent.
    superseded: bool,
}

/// One user session driving an [`ImageTransformer`].
pub struct Session<T> {
    transformer: T,
    state: watch::Sender<TransformationState>,
    source_path: Option<PathBuf>,
    next_request_id: u64,
    in_flight: Option<InFlight>,
}

impl<T: ImageTransformer> Session<T> {
    /// Creates a session in the initial state.
    pub fn new(transformer: T) -> Self {
        let (state, _) = watch::channel(TransformationState::initial());
        Self {
            transformer,
            state,
            source_path: None,
            next_request_id: 0,
            in_flight: None,
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> TransformationState {
        self.state.borrow().clone()
    }

    /// Receives every state published from now on.
    pub fn subscribe(&self) -> watch::Receiver<TransformationState> {
        self.state.subscribe()
    }

    /// Path of the file the current image was loaded from, if any.
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// The style currently selected.
    pub fn selected_style(&self) -> &'static StyleDefinition {
        let id = self.state.borrow().selected_style_id();
        catalog::find(id).unwrap_or_else(catalog::default_style)
    }

    fn replace(&self, next: TransformationState, action: &'static str) {
        tracing::debug!(
            action,
            phase = %next.phase(),
            style = next.selected_style_id(),
            "state transition"
        );
        self.state.send_replace(next);
    }

    /// Loads the image at `path`. `None` (nothing chosen) is a no-op.
    ///
    /// A failed read leaves the state unchanged and is returned to the
    /// caller.
    pub async fn load_image(&mut self, path: Option<&Path>) -> Result<()> {
        let Some(path) = path else {
            tracing::debug!("no file chosen");
            return Ok(());
        };

        let image = match read_image_file(path).await {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(path = %path.display(), "failed to read image: {e}");
                return Err(e);
            }
        };

        tracing::info!(
            path = %path.display(),
            bytes = image.size(),
            format = %image.format,
            "image loaded"
        );
        self.set_original(image, Some(path.to_path_buf()));
        Ok(())
    }

    /// Loads an image already held in memory.
    pub fn load_image_bytes(&mut self, data: Vec<u8>) -> Result<()> {
        if data.is_empty() {
            return Err(StyleGenError::InvalidRequest("image is empty".into()));
        }
        self.set_original(EncodedImage::from_bytes(data), None);
        Ok(())
    }

    /// Loads an image from a `data:<mime>;base64,<payload>` URL (or bare
    /// base64). A malformed payload leaves the state unchanged.
    pub fn load_image_data_url(&mut self, input: &str) -> Result<()> {
        let image = match EncodedImage::from_data_url(input.trim()) {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!("failed to decode data URL: {e}");
                return Err(e);
            }
        };
        tracing::info!(
            bytes = image.size(),
            format = %image.format,
            "image loaded from data URL"
        );
        self.set_original(image, None);
        Ok(())
    }

    fn set_original(&mut self, image: EncodedImage, source_path: Option<PathBuf>) {
        // Whatever is in flight was sent for the previous image.
        if let Some(in_flight) = self.in_flight.as_mut() {
            in_flight.superseded = true;
        }
        self.source_path = source_path;
        self.replace(self.state().with_original(image), "load_image");
    }

    /// Selects a catalog style. Legal in every state.
    pub fn select_style(&mut self, id: &str) -> Result<&'static StyleDefinition> {
        let style = catalog::find(id).ok_or_else(|| StyleGenError::UnknownStyle(id.to_string()))?;
        self.replace(self.state().with_style(style), "select_style");
        Ok(style)
    }

    /// Admits a transform request and marks the session as processing.
    ///
    /// Rejections leave the state untouched.
    pub fn begin_transform(&mut self) -> std::result::Result<PendingTransform, TransformRejection> {
        let current = self.state();

        if current.is_processing() {
            tracing::warn!("transform rejected: request already in flight");
            return Err(TransformRejection::Busy);
        }
        let Some(image) = current.original_image().cloned() else {
            tracing::warn!("transform rejected: no image loaded");
            return Err(TransformRejection::NoImage);
        };
        let Some(style) = catalog::find(current.selected_style_id()) else {
            tracing::warn!(style = current.selected_style_id(), "transform rejected: unknown style");
            return Err(TransformRejection::UnknownStyle);
        };

        self.next_request_id += 1;
        let id = self.next_request_id;
        self.in_flight = Some(InFlight {
            id,
            superseded: false,
        });
        self.replace(current.processing(), "begin_transform");
        Ok(PendingTransform {
            id,
            style,
            request: TransformRequest::new(image, style.prompt),
        })
    }

    /// Applies the transformer's answer to the admitted request `pending`.
    ///
    /// Answers to anything but the request currently in flight are dropped
    /// without touching the state. If a new image was loaded while the
    /// request ran, the answer is dropped and only the processing flag is
    /// cleared.
    pub fn complete_transform(
        &mut self,
        pending: &PendingTransform,
        outcome: Result<EncodedImage>,
    ) -> TransformOutcome {
        let in_flight = match self.in_flight {
            Some(in_flight) if in_flight.id == pending.id => in_flight,
            _ => {
                tracing::warn!(request = pending.id, "discarding answer to a superseded request");
                return TransformOutcome::Discarded;
            }
        };
        self.in_flight = None;

        let current = self.state();
        if in_flight.superseded {
            tracing::warn!(request = pending.id, "discarding answer for a replaced image");
            self.replace(current.settled(), "transform_discarded");
            return TransformOutcome::Discarded;
        }
        match outcome {
            Ok(image) => {
                tracing::info!(bytes = image.size(), "transformation finished");
                self.replace(current.with_result(image), "transform_succeeded");
                TransformOutcome::Succeeded
            }
            Err(e) => {
                tracing::error!(
                    style = current.selected_style_id(),
                    "transformation failed: {e}"
                );
                self.replace(
                    current.with_failure(GENERATION_FAILED_MESSAGE),
                    "transform_failed",
                );
                TransformOutcome::Failed(e)
            }
        }
    }

    /// Runs one transformation with the selected style.
    ///
    /// Sends at most one request. Rejected without effect while another
    /// request is in flight or when no image is loaded.
    pub async fn transform(&mut self) -> TransformOutcome {
        let pending = match self.begin_transform() {
            Ok(pending) => pending,
            Err(rejection) => return TransformOutcome::Rejected(rejection),
        };

        tracing::info!(
            style = pending.style.id,
            transformer = self.transformer.name(),
            "starting transformation"
        );
        let outcome = self.transformer.transform(&pending.request).await;
        self.complete_transform(&pending, outcome)
    }

    /// Returns to the initial state and forgets the chosen file.
    pub fn reset(&mut self) {
        self.in_flight = None;
        self.source_path = None;
        self.replace(TransformationState::initial(), "reset");
    }

    /// Saves the result image into `dir` as `transformed-art-<ms>.png`.
    ///
    /// Does not touch the session state.
    pub async fn download(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let Some(image) = self.state().result_image().cloned() else {
            return Err(StyleGenError::NoResult);
        };

        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(export_file_name(chrono::Utc::now().timestamp_millis()));
        image.save(&path).await?;

        tracing::info!(path = %path.display(), bytes = image.size(), "result saved");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationCause;
    use crate::image::ImageFormat;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[derive(Default)]
    struct FakeTransformer {
        fail: bool,
        calls: AtomicUsize,
        last_instruction: Mutex<Option<String>>,
    }

    #[async_trait]
    impl ImageTransformer for FakeTransformer {
        async fn transform(&self, request: &TransformRequest) -> Result<EncodedImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_instruction.lock().unwrap() = Some(request.instruction.clone());
            if self.fail {
                Err(GenerationCause::NoImage {
                    finish_reason: Some("STOP".into()),
                }
                .into())
            } else {
                Ok(EncodedImage::new(vec![9, 9, 9], ImageFormat::Png))
            }
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn image() -> EncodedImage {
        EncodedImage::from_bytes(PNG_MAGIC.to_vec())
    }

    fn session(fail: bool) -> (Session<Arc<FakeTransformer>>, Arc<FakeTransformer>) {
        let fake = Arc::new(FakeTransformer {
            fail,
            ..Default::default()
        });
        (Session::new(Arc::clone(&fake)), fake)
    }

    #[test]
    fn test_initial_state() {
        let state = TransformationState::initial();
        assert!(state.original_image().is_none());
        assert!(state.result_image().is_none());
        assert_eq!(state.selected_style_id(), "watercolor");
        assert!(!state.is_processing());
        assert!(state.error().is_none());
        assert_eq!(state.phase(), Phase::Idle);
        assert!(!state.can_transform());
    }

    #[test]
    fn test_new_original_clears_result_and_error() {
        let state = TransformationState::initial()
            .with_original(image())
            .with_result(EncodedImage::new(vec![1], ImageFormat::Png))
            .with_failure("boom");
        assert!(state.result_image().is_some());
        assert!(state.error().is_some());

        let state = state.with_original(EncodedImage::new(vec![2], ImageFormat::Jpeg));
        assert!(state.result_image().is_none());
        assert!(state.error().is_none());
        assert_eq!(state.original_image().unwrap().data, vec![2]);
    }

    #[test]
    fn test_processing_clears_error() {
        let state = TransformationState::initial()
            .with_original(image())
            .with_failure("boom")
            .processing();
        assert!(state.is_processing());
        assert!(state.error().is_none());
        assert_eq!(state.phase(), Phase::Processing);
    }

    #[test]
    fn test_failure_keeps_previous_result() {
        let first = EncodedImage::new(vec![1], ImageFormat::Png);
        let state = TransformationState::initial()
            .with_original(image())
            .with_result(first.clone())
            .processing()
            .with_failure("boom");
        assert_eq!(state.result_image(), Some(&first));
        assert!(!state.is_processing());
        assert_eq!(state.error(), Some("boom"));
    }

    #[test]
    fn test_select_style_only_changes_style() {
        let (mut session, _) = session(false);
        session.load_image_bytes(PNG_MAGIC.to_vec()).unwrap();
        let before = session.state();

        let style = session.select_style("anime").unwrap();
        assert_eq!(style.id, "anime");

        let after = session.state();
        assert_eq!(after.selected_style_id(), "anime");
        assert_eq!(after.clone().with_style(catalog::find("watercolor").unwrap()), before);
    }

    #[test]
    fn test_select_unknown_style_is_rejected() {
        let (mut session, _) = session(false);
        let err = session.select_style("sepia").unwrap_err();
        assert!(matches!(err, StyleGenError::UnknownStyle(id) if id == "sepia"));
        assert_eq!(session.state(), TransformationState::initial());
    }

    #[tokio::test]
    async fn test_transform_without_image_is_noop() {
        let (mut session, fake) = session(false);
        let outcome = session.transform().await;
        assert!(matches!(
            outcome,
            TransformOutcome::Rejected(TransformRejection::NoImage)
        ));
        assert_eq!(session.state(), TransformationState::initial());
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transform_while_processing_is_noop() {
        let (mut session, fake) = session(false);
        session.load_image_bytes(PNG_MAGIC.to_vec()).unwrap();

        let pending = session.begin_transform().unwrap();
        let in_flight = session.state();
        assert!(in_flight.is_processing());

        let outcome = session.transform().await;
        assert!(matches!(
            outcome,
            TransformOutcome::Rejected(TransformRejection::Busy)
        ));
        assert_eq!(session.state(), in_flight);
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);

        let result = fake.transform(&pending.request).await;
        assert!(session.complete_transform(&pending, result).is_success());
        assert!(!session.state().is_processing());
    }

    #[tokio::test]
    async fn test_transform_uses_selected_style_prompt() {
        let (mut session, fake) = session(false);
        session.load_image_bytes(PNG_MAGIC.to_vec()).unwrap();
        session.select_style("oil-painting").unwrap();

        assert!(session.transform().await.is_success());
        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            fake.last_instruction.lock().unwrap().as_deref(),
            Some(catalog::find("oil-painting").unwrap().prompt)
        );
    }

    #[tokio::test]
    async fn test_failure_sets_fixed_message() {
        let (mut session, fake) = session(true);
        session.load_image_bytes(PNG_MAGIC.to_vec()).unwrap();

        let outcome = session.transform().await;
        match outcome {
            TransformOutcome::Failed(e) => assert!(e.is_generation_failure()),
            other => panic!("expected failure, got {other:?}"),
        }

        let state = session.state();
        assert_eq!(state.error(), Some(GENERATION_FAILED_MESSAGE));
        assert!(!state.is_processing());
        assert!(state.result_image().is_none());
        assert_eq!(state.phase(), Phase::HasImage);
        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_load_image_none_is_noop() {
        let (mut session, _) = session(false);
        session.load_image(None).await.unwrap();
        assert_eq!(session.state(), TransformationState::initial());
    }

    #[tokio::test]
    async fn test_load_image_read_failure_leaves_state() {
        let (mut session, _) = session(false);
        let dir = tempfile::tempdir().unwrap();

        let err = session
            .load_image(Some(dir.path().join("missing.png").as_path()))
            .await
            .unwrap_err();
        assert!(matches!(err, StyleGenError::Io(_)));

        let empty = dir.path().join("empty.png");
        std::fs::write(&empty, b"").unwrap();
        let err = session.load_image(Some(empty.as_path())).await.unwrap_err();
        assert!(matches!(err, StyleGenError::InvalidRequest(_)));

        assert_eq!(session.state(), TransformationState::initial());
        assert!(session.source_path().is_none());
    }

    #[tokio::test]
    async fn test_load_image_from_file() {
        let (mut session, _) = session(false);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3]).unwrap();

        session.load_image(Some(path.as_path())).await.unwrap();
        let state = session.state();
        assert_eq!(state.original_image().unwrap().format, ImageFormat::Jpeg);
        assert_eq!(session.source_path(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_reset_from_result() {
        let (mut session, _) = session(false);
        session.load_image_bytes(PNG_MAGIC.to_vec()).unwrap();
        session.select_style("3d").unwrap();
        assert!(session.transform().await.is_success());

        session.reset();
        assert_eq!(session.state(), TransformationState::initial());
        assert!(session.source_path().is_none());
    }

    #[tokio::test]
    async fn test_download_requires_result() {
        let (session, _) = session(false);
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            session.download(dir.path()).await,
            Err(StyleGenError::NoResult)
        ));
    }

    #[tokio::test]
    async fn test_download_writes_timestamped_file() {
        let (mut session, _) = session(false);
        session.load_image_bytes(PNG_MAGIC.to_vec()).unwrap();
        assert!(session.transform().await.is_success());
        let before = session.state();

        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("exports");
        let path = session.download(&out_dir).await.unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("transformed-art-"));
        assert!(name.ends_with(".png"));
        let millis = name
            .trim_start_matches("transformed-art-")
            .trim_end_matches(".png");
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(std::fs::read(&path).unwrap(), vec![9, 9, 9]);
        assert_eq!(session.state(), before);
    }

    #[tokio::test]
    async fn test_answer_after_reset_is_discarded() {
        let (mut session, fake) = session(false);
        session.load_image_bytes(PNG_MAGIC.to_vec()).unwrap();
        let pending = session.begin_transform().unwrap();
        session.reset();

        let result = fake.transform(&pending.request).await;
        assert!(matches!(
            session.complete_transform(&pending, result),
            TransformOutcome::Discarded
        ));
        assert_eq!(session.state(), TransformationState::initial());
    }

    #[tokio::test]
    async fn test_stale_answer_after_reset_and_reload_is_discarded() {
        let (mut session, fake) = session(false);
        session.load_image_bytes(vec![1, 1, 1]).unwrap();
        let stale = session.begin_transform().unwrap();
        session.reset();

        session.load_image_bytes(vec![2, 2, 2]).unwrap();
        let fresh = session.begin_transform().unwrap();
        assert_ne!(stale.id, fresh.id);
        let waiting = session.state();

        let result = fake.transform(&stale.request).await;
        assert!(matches!(
            session.complete_transform(&stale, result),
            TransformOutcome::Discarded
        ));
        assert_eq!(session.state(), waiting);
        assert!(session.state().is_processing());
        assert!(session.state().result_image().is_none());

        let result = fake.transform(&fresh.request).await;
        assert!(session.complete_transform(&fresh, result).is_success());
        let state = session.state();
        assert_eq!(state.original_image().unwrap().data, vec![2, 2, 2]);
        assert_eq!(state.result_image().unwrap().data, vec![9, 9, 9]);
        assert!(!state.is_processing());
    }

    #[tokio::test]
    async fn test_answer_after_reload_while_processing_is_discarded() {
        let (mut session, fake) = session(true);
        session.load_image_bytes(vec![1, 1, 1]).unwrap();
        let pending = session.begin_transform().unwrap();

        session.load_image_bytes(vec![2, 2, 2]).unwrap();
        assert!(session.state().is_processing());
        assert!(matches!(
            session.begin_transform(),
            Err(TransformRejection::Busy)
        ));

        let result = fake.transform(&pending.request).await;
        assert!(matches!(
            session.complete_transform(&pending, result),
            TransformOutcome::Discarded
        ));
        let state = session.state();
        assert!(!state.is_processing());
        assert!(state.error().is_none());
        assert!(state.result_image().is_none());
        assert_eq!(state.original_image().unwrap().data, vec![2, 2, 2]);
        assert!(state.can_transform());

        // The same answer cannot land twice
        assert!(matches!(
            session.complete_transform(&pending, Ok(image())),
            TransformOutcome::Discarded
        ));
    }

    #[test]
    fn test_load_image_data_url() {
        let (mut session, _) = session(false);
        session
            .load_image_data_url("data:image/jpeg;base64,/9j/4AAQ")
            .unwrap();
        let state = session.state();
        let original = state.original_image().unwrap();
        assert_eq!(original.format, ImageFormat::Jpeg);
        assert_eq!(original.data, vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]);
        assert_eq!(state.phase(), Phase::HasImage);
        assert!(session.source_path().is_none());
    }

    #[test]
    fn test_load_image_data_url_rejects_garbage() {
        let (mut session, _) = session(false);
        session.load_image_bytes(PNG_MAGIC.to_vec()).unwrap();
        let before = session.state();

        assert!(matches!(
            session.load_image_data_url("data:image/png;base64,!!!"),
            Err(StyleGenError::Decode(_))
        ));
        assert!(matches!(
            session.load_image_data_url("data:image/png;base64,"),
            Err(StyleGenError::Decode(_))
        ));
        assert_eq!(session.state(), before);
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(
            export_file_name(1_700_000_000_123),
            "transformed-art-1700000000123.png"
        );
    }

    #[tokio::test]
    async fn test_observers_see_whole_states() {
        let (mut session, _) = session(false);
        let mut rx = session.subscribe();

        session.load_image_bytes(PNG_MAGIC.to_vec()).unwrap();
        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen, session.state());
        assert_eq!(seen.phase(), Phase::HasImage);

        session.transform().await;
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.phase(), Phase::HasResult);
        assert!(!seen.is_processing());
    }
}

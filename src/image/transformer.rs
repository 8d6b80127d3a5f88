//! Image transformer trait.

use crate::error::Result;
use crate::image::types::{EncodedImage, TransformRequest};
use async_trait::async_trait;

/// A service that turns one image plus one instruction into one image.
///
/// Implementations send exactly one request per call and never retry.
/// Every failure is reported as [`StyleGenError::GenerationFailed`]
/// (or [`StyleGenError::InvalidRequest`] for inputs rejected up front).
///
/// [`StyleGenError::GenerationFailed`]: crate::StyleGenError::GenerationFailed
/// [`StyleGenError::InvalidRequest`]: crate::StyleGenError::InvalidRequest
#[async_trait]
pub trait ImageTransformer: Send + Sync {
    /// Transforms the request's image, returning the first image produced.
    async fn transform(&self, request: &TransformRequest) -> Result<EncodedImage>;

    /// Returns the name of this transformer for display.
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: ImageTransformer + ?Sized> ImageTransformer for std::sync::Arc<T> {
    async fn transform(&self, request: &TransformRequest) -> Result<EncodedImage> {
        (**self).transform(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

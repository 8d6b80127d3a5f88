#![warn(missing_docs)]
//! Stylegen - restyle photos into preset art styles with Gemini.
//!
//! Load an image, pick one of the built-in [`catalog`] styles, and let a
//! [`GeminiTransformer`] redraw it. A [`Session`] holds the UI-facing
//! [`TransformationState`] and enforces that at most one request is in
//! flight at a time.
//!
//! # Quick Start
//!
//! ```no_run
//! use stylegen::{Session, Settings};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> stylegen::Result<()> {
//!     let settings = Settings::from_env();
//!     let mut session = Session::new(settings.transformer());
//!
//!     session.load_image(Some(Path::new("photo.jpg"))).await?;
//!     session.select_style("watercolor")?;
//!     session.transform().await;
//!
//!     if let Some(message) = session.state().error() {
//!         eprintln!("{message}");
//!     } else {
//!         let path = session.download(&settings.output_dir).await?;
//!         println!("saved {}", path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! - `API_KEY` / `GEMINI_API_KEY` / `GOOGLE_API_KEY`: service credential
//! - `STYLEGEN_MODEL`: `flash` (default) or `pro`
//! - `STYLEGEN_ENDPOINT`: API base URL
//! - `STYLEGEN_OUTPUT_DIR`: where downloads go (default `.`)

pub mod catalog;
mod config;
mod error;
pub mod image;
pub mod session;

pub use catalog::StyleDefinition;
pub use config::{Settings, API_KEY_VARS};
pub use error::{GenerationCause, Result, StyleGenError, GENERATION_FAILED_MESSAGE};
pub use image::{
    EncodedImage, GeminiModel, GeminiTransformer, GeminiTransformerBuilder, ImageFormat,
    ImageTransformer, TransformRequest,
};
pub use session::{
    Phase, Session, TransformOutcome, TransformRejection, TransformationState,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::catalog::{self, StyleDefinition};
    pub use crate::error::{Result, StyleGenError};
    pub use crate::image::{EncodedImage, GeminiTransformer, ImageTransformer, TransformRequest};
    pub use crate::session::{Session, TransformOutcome, TransformationState};
    pub use crate::Settings;
}

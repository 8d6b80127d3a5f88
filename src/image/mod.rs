//! Image transformation module.

mod gemini;
mod transformer;
mod types;

pub use gemini::{
    GeminiModel, GeminiTransformer, GeminiTransformerBuilder, DEFAULT_ENDPOINT, INSTRUCTION_SUFFIX,
};
pub use transformer::ImageTransformer;
pub use types::{EncodedImage, ImageFormat, TransformRequest};

//! Core types for image transformation.

use crate::error::{Result, StyleGenError};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
    /// GIF format.
    Gif,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Parses a MIME type such as `image/jpeg`.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Binary image content tagged with its format.
///
/// Both the uploaded original and the transformed result are carried as
/// this type. It converts to and from `data:<mime>;base64,<payload>` URLs.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// Image format the bytes are tagged with.
    pub format: ImageFormat,
}

impl EncodedImage {
    /// Creates an image with an explicit format tag.
    pub fn new(data: Vec<u8>, format: ImageFormat) -> Self {
        Self { data, format }
    }

    /// Creates an image, sniffing the format from magic bytes.
    ///
    /// Unrecognized content is tagged PNG, matching what the transform
    /// request sends regardless of the upload encoding.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let format = ImageFormat::from_magic_bytes(&data).unwrap_or_default();
        Self { data, format }
    }

    /// Parses a `data:` URL, or bare base64 when no prefix is present.
    pub fn from_data_url(input: &str) -> Result<Self> {
        let (mime, payload) = match input.split_once(',') {
            Some((header, payload)) if header.starts_with("data:") => {
                let mime = header
                    .trim_start_matches("data:")
                    .split(';')
                    .next()
                    .unwrap_or_default();
                (ImageFormat::from_mime_type(mime), payload)
            }
            _ => (None, input),
        };

        let data = decode_base64_lenient(payload)
            .map_err(|e| StyleGenError::Decode(e.to_string()))?;
        if data.is_empty() {
            return Err(StyleGenError::Decode("empty image payload".into()));
        }

        let format = mime
            .or_else(|| ImageFormat::from_magic_bytes(&data))
            .unwrap_or_default();
        Ok(Self { data, format })
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Returns true if there is no image content.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Encodes the image data as base64.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Returns the image as a data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.format.mime_type(), self.to_base64())
    }

    /// Saves the image to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        tokio::fs::write(path, &self.data).await?;
        Ok(())
    }
}

impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedImage")
            .field("format", &self.format)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Decodes base64 that may carry whitespace or lack padding.
pub(crate) fn decode_base64_lenient(
    input: &str,
) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let cleaned: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    if let Ok(data) = base64::engine::general_purpose::STANDARD.decode(&cleaned) {
        return Ok(data);
    }

    base64::engine::general_purpose::STANDARD_NO_PAD.decode(cleaned.trim_end_matches('='))
}

/// One image plus the instruction to apply to it.
#[derive(Debug, Clone)]
pub struct TransformRequest {
    /// Source image.
    pub image: EncodedImage,
    /// Free-text style instruction.
    pub instruction: String,
}

impl TransformRequest {
    /// Creates a new request.
    pub fn new(image: EncodedImage, instruction: impl Into<String>) -> Self {
        Self {
            image,
            instruction: instruction.into(),
        }
    }

    /// Checks the input constraints: non-empty image and instruction.
    pub fn validate(&self) -> Result<()> {
        if self.image.is_empty() {
            return Err(StyleGenError::InvalidRequest("source image is empty".into()));
        }
        if self.instruction.trim().is_empty() {
            return Err(StyleGenError::InvalidRequest("instruction is empty".into()));
        }
        Ok(())
    }
}

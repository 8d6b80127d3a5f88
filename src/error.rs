//! Error types for style transformation.

/// Fixed message shown to the user whenever a transformation fails.
pub const GENERATION_FAILED_MESSAGE: &str = "生成失败，请稍后重试。";

/// Longest remote error message kept in a [`GenerationCause`].
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Underlying reason a transformation failed.
///
/// Kept for diagnostics only. Callers surface every cause the same way
/// through [`StyleGenError::GenerationFailed`].
#[derive(Debug, thiserror::Error)]
pub enum GenerationCause {
    /// API key missing or rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized error message from the response body.
        message: String,
    },

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Inline image data could not be decoded.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// Prompt or output was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// The model answered without any inline image part.
    #[error("model returned no image (finish reason: {})", .finish_reason.as_deref().unwrap_or("unknown"))]
    NoImage {
        /// Finish reason reported for the first candidate, if any.
        finish_reason: Option<String>,
    },
}

/// Errors that can occur while loading, transforming or exporting images.
#[derive(Debug, thiserror::Error)]
pub enum StyleGenError {
    /// The transform request failed. The single user-visible failure kind.
    #[error("generation failed: {0}")]
    GenerationFailed(#[from] GenerationCause),

    /// Invalid request parameters (empty image, empty instruction).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Style id not present in the catalog.
    #[error("unknown style: {0}")]
    UnknownStyle(String),

    /// Export requested before any result exists.
    #[error("no transformed image to export")]
    NoResult,

    /// Malformed data URL or base64 payload.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (reading the source image, saving the result).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StyleGenError {
    /// Returns true if this error came from the transform call itself.
    pub fn is_generation_failure(&self) -> bool {
        matches!(self, Self::GenerationFailed(_))
    }

    /// Message suitable for end users.
    ///
    /// Generation failures always map to [`GENERATION_FAILED_MESSAGE`];
    /// the cause is left to the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::GenerationFailed(_) => GENERATION_FAILED_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

/// Redacts anything that looks like a credential and caps the length of a
/// remote error message before it is kept in an error value.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let redacted: Vec<String> = text
        .split_whitespace()
        .map(|word| {
            let bare =
                word.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != '-');
            let looks_like_key = bare.starts_with("AIza")
                || bare.starts_with("sk-")
                || bare.contains("key=");
            if looks_like_key {
                "[REDACTED]".to_string()
            } else {
                word.to_string()
            }
        })
        .collect();
    let joined = redacted.join(" ");

    if joined.chars().count() > MAX_ERROR_MESSAGE_LEN {
        let truncated: String = joined.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
        format!("{truncated}...")
    } else {
        joined
    }
}

/// Result type alias for style transformation operations.
pub type Result<T> = std::result::Result<T, StyleGenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_cause() {
        let err = StyleGenError::from(GenerationCause::Api {
            status: 500,
            message: "backend exploded".into(),
        });
        assert!(err.is_generation_failure());
        assert_eq!(err.user_message(), GENERATION_FAILED_MESSAGE);

        let err = StyleGenError::from(GenerationCause::NoImage {
            finish_reason: Some("STOP".into()),
        });
        assert_eq!(err.user_message(), GENERATION_FAILED_MESSAGE);
    }

    #[test]
    fn test_user_message_for_other_errors() {
        let err = StyleGenError::UnknownStyle("sepia".into());
        assert!(!err.is_generation_failure());
        assert_eq!(err.user_message(), "unknown style: sepia");
    }

    #[test]
    fn test_error_display() {
        let err = GenerationCause::Api {
            status: 404,
            message: "Not found".into(),
        };
        assert_eq!(err.to_string(), "API error: 404 - Not found");

        let err = GenerationCause::NoImage {
            finish_reason: None,
        };
        assert_eq!(
            err.to_string(),
            "model returned no image (finish reason: unknown)"
        );

        let err = StyleGenError::GenerationFailed(GenerationCause::Auth("missing key".into()));
        assert_eq!(
            err.to_string(),
            "generation failed: authentication failed: missing key"
        );
    }

    #[test]
    fn test_sanitize_redacts_keys() {
        let msg = sanitize_error_message("API key AIzaSyD-secret123 is invalid");
        assert_eq!(msg, "API key [REDACTED] is invalid");
        assert!(!msg.contains("AIza"));
    }

    #[test]
    fn test_sanitize_truncates_long_messages() {
        let long = "x".repeat(MAX_ERROR_MESSAGE_LEN + 50);
        let msg = sanitize_error_message(&long);
        assert_eq!(msg.chars().count(), MAX_ERROR_MESSAGE_LEN + 3);
        assert!(msg.ends_with("..."));
    }
}

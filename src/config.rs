//! Runtime settings, read once at startup.

use crate::image::{GeminiModel, GeminiTransformer, DEFAULT_ENDPOINT};
use std::path::PathBuf;

/// Environment variables consulted for the API key, in priority order.
pub const API_KEY_VARS: [&str; 3] = ["API_KEY", "GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Settings for a stylegen process.
#[derive(Clone)]
pub struct Settings {
    /// Credential for the generation service. `None` is allowed; calls
    /// then fail at request time.
    pub api_key: Option<String>,
    /// Model variant.
    pub model: GeminiModel,
    /// API base URL.
    pub endpoint: String,
    /// Directory downloads are written to.
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: GeminiModel::default(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Settings::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        settings.api_key = API_KEY_VARS.iter().find_map(|name| non_empty(*name));

        if let Some(v) = non_empty("STYLEGEN_MODEL") {
            match GeminiModel::parse(&v) {
                Some(model) => settings.model = model,
                None => tracing::warn!(value = %v, "ignoring unknown STYLEGEN_MODEL"),
            }
        }
        if let Some(v) = non_empty("STYLEGEN_ENDPOINT") {
            settings.endpoint = v;
        }
        if let Some(v) = non_empty("STYLEGEN_OUTPUT_DIR") {
            settings.output_dir = PathBuf::from(v);
        }

        settings
    }

    /// Builds the Gemini transformer these settings describe.
    pub fn transformer(&self) -> GeminiTransformer {
        if self.api_key.is_none() {
            tracing::warn!(
                vars = ?API_KEY_VARS,
                "no API key configured; every transform will fail"
            );
        }
        GeminiTransformer::builder()
            .maybe_api_key(self.api_key.clone())
            .model(self.model)
            .endpoint(&self.endpoint)
            .build()
    }
}

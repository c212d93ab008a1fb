use std::fmt;
use thiserror::Error;

/// Which side of a language pair a value applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LangSide {
    Source,
    Target,
}

impl fmt::Display for LangSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Target => f.write_str("target"),
        }
    }
}

/// Unified error type for textblk-translator-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - Translator construction (backend setup, language validation)
/// - Translation calls (batch reassembly, backend requests)
/// - Configuration loading
/// - General I/O operations
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Setup Errors
    // ==========================================================================
    /// Backend setup found required parameters absent
    #[error("missing required parameter(s) for translator '{backend}': {}", params.join(", "))]
    MissingParams { backend: String, params: Vec<String> },

    /// Any other failure during backend setup
    #[error("failed to set up translator '{backend}': {source}")]
    SetupFailure {
        backend: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No backend registered under this name
    #[error("unknown translator backend: {0}")]
    UnknownBackend(String),

    // ==========================================================================
    // Language Errors
    // ==========================================================================
    /// Requested language is not in the translator's valid list
    #[error("Invalid {side}: {lang}\n{}", valid.join("\n"))]
    InvalidLanguage {
        side: LangSide,
        lang: String,
        valid: Vec<String>,
    },

    // ==========================================================================
    // Translation Errors
    // ==========================================================================
    /// Backend response split into a different number of fragments than were sent
    #[error("batch mismatch: sent {expected} fragments, backend returned {actual}")]
    BatchMismatch { expected: usize, actual: usize },

    /// Backend returned a single string for a batch or vice versa
    #[error("backend returned a {actual} result for a {expected} request")]
    ShapeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// Translation API request failed
    #[error("translation API request failed: {0}")]
    TranslationRequest(String),

    /// Invalid response from translation API
    #[error("invalid translation API response: {0}")]
    TranslationInvalidResponse(String),

    /// Rate limited by translation API
    #[error("translation rate limited{}", retry_after.map(|s| format!(", retry after {s} seconds")).unwrap_or_default())]
    TranslationRateLimited { retry_after: Option<u64> },

    /// Translation request timed out
    #[error("translation request timed out")]
    TranslationTimeout,

    /// Maximum retry attempts exceeded for translation
    #[error("translation failed after maximum retries")]
    TranslationMaxRetriesExceeded,

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error came from a backend reporting absent configuration
    pub const fn is_missing_params(&self) -> bool {
        matches!(self, Self::MissingParams { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_language_lists_each_valid_name_on_its_own_line() {
        let err = Error::InvalidLanguage {
            side: LangSide::Target,
            lang: "Auto".to_string(),
            valid: vec!["English".to_string(), "日本語".to_string()],
        };
        assert_eq!(err.to_string(), "Invalid target: Auto\nEnglish\n日本語");
    }

    #[test]
    fn test_missing_params_joins_names() {
        let err = Error::MissingParams {
            backend: "openai".to_string(),
            params: vec!["api_base".to_string(), "model".to_string()],
        };
        assert!(err.is_missing_params());
        assert!(err.to_string().ends_with("api_base, model"));
    }

    #[test]
    fn test_rate_limited_message() {
        let err = Error::TranslationRateLimited { retry_after: Some(7) };
        assert_eq!(err.to_string(), "translation rate limited, retry after 7 seconds");
        let err = Error::TranslationRateLimited { retry_after: None };
        assert_eq!(err.to_string(), "translation rate limited");
    }
}

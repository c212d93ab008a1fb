use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::language::{ENGLISH, JAPANESE};

/// Open configuration bag handed to a backend at construction.
///
/// Keys are backend-specific (`api_base`, `model`, ...). The only key the
/// core itself reads is `delay`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslatorParams(BTreeMap<String, Value>);

impl TranslatorParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value for `key`; empty strings count as absent.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Numeric value for `key`, accepting JSON numbers and numeric strings
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match self.get(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Keys from `required` that are absent or blank
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|key| match self.get(key) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            })
            .collect()
    }

    /// Seconds the caller should wait between requests.
    ///
    /// Not enforced by the translator. Unset, falsy, or unparsable values mean 0.
    pub fn delay(&self) -> f64 {
        self.get_f64("delay")
            .filter(|d| d.is_finite())
            .unwrap_or(0.0)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for TranslatorParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Everything a translator needs at construction
#[derive(Debug, Clone)]
pub struct TranslatorOptions {
    /// Source language display name
    pub lang_source: String,
    /// Target language display name
    pub lang_target: String,
    /// Fail on unsupported languages; when false, fall back to the first supported pair
    pub raise_unsupported_lang: bool,
    /// Backend configuration bag
    pub params: TranslatorParams,
}

impl TranslatorOptions {
    pub fn new(lang_source: impl Into<String>, lang_target: impl Into<String>) -> Self {
        Self {
            lang_source: lang_source.into(),
            lang_target: lang_target.into(),
            raise_unsupported_lang: true,
            params: TranslatorParams::default(),
        }
    }

    #[must_use]
    pub const fn raise_unsupported_lang(mut self, raise: bool) -> Self {
        self.raise_unsupported_lang = raise;
        self
    }

    #[must_use]
    pub fn params(mut self, params: TranslatorParams) -> Self {
        self.params = params;
        self
    }
}

fn default_backend() -> String {
    "openai".to_string()
}

fn default_lang_source() -> String {
    JAPANESE.to_string()
}

fn default_lang_target() -> String {
    ENGLISH.to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_batch_size() -> usize {
    16
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Registered backend name
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Source language display name
    #[serde(default = "default_lang_source")]
    pub lang_source: String,

    /// Target language display name
    #[serde(default = "default_lang_target")]
    pub lang_target: String,

    /// Reject unsupported languages instead of falling back
    #[serde(default = "default_true")]
    pub raise_unsupported_lang: bool,

    /// Fragments per translate call (0 = all at once)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Backend parameters
    #[serde(default)]
    pub params: TranslatorParams,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            lang_source: default_lang_source(),
            lang_target: default_lang_target(),
            raise_unsupported_lang: true,
            batch_size: default_batch_size(),
            params: TranslatorParams::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::error::Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::error::Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, crate::error::Error> {
        let config: Self = toml::from_str(content).map_err(|e| {
            crate::error::Error::ConfigLoad(format!("Failed to parse config: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the backend and both languages are named
    pub fn validate(&self) -> Result<(), crate::error::Error> {
        for (field, value) in [
            ("backend", &self.backend),
            ("lang_source", &self.lang_source),
            ("lang_target", &self.lang_target),
        ] {
            if crate::util::is_blank(value) {
                return Err(crate::error::Error::ConfigInvalid {
                    field: field.to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Load from default locations (~/.config/textblk-translator/config.toml, ./config.toml)
    pub fn load() -> Self {
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("textblk-translator").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        let local_config = std::path::PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }

    /// Translator options described by this configuration
    pub fn translator_options(&self) -> TranslatorOptions {
        TranslatorOptions {
            lang_source: self.lang_source.clone(),
            lang_target: self.lang_target.clone(),
            raise_unsupported_lang: self.raise_unsupported_lang,
            params: self.params.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_delay_defaults_to_zero() {
        assert!(TranslatorParams::new().delay().abs() < f64::EPSILON);
        let params = TranslatorParams::new().with("delay", Value::Null);
        assert!(params.delay().abs() < f64::EPSILON);
        let params = TranslatorParams::new().with("delay", "soon");
        assert!(params.delay().abs() < f64::EPSILON);
    }

    #[test]
    fn test_delay_accepts_numbers_and_numeric_strings() {
        let params = TranslatorParams::new().with("delay", 1.5);
        assert!((params.delay() - 1.5).abs() < f64::EPSILON);
        let params = TranslatorParams::new().with("delay", " 2 ");
        assert!((params.delay() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_reports_absent_and_blank_keys() {
        let params: TranslatorParams =
            [("api_base", json!("http://localhost")), ("model", json!(" "))]
                .into_iter()
                .collect();
        assert_eq!(params.missing(&["api_base", "model", "api_key"]), vec!["model", "api_key"]);
    }

    #[test]
    fn test_get_str_skips_blank() {
        let params = TranslatorParams::new().with("api_key", "");
        assert_eq!(params.get_str("api_key"), None);
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.backend, "openai");
        assert_eq!(config.lang_source, JAPANESE);
        assert_eq!(config.lang_target, ENGLISH);
        assert!(config.raise_unsupported_lang);
    }

    #[test]
    fn test_parse_toml_with_params() {
        let config = AppConfig::from_toml(
            r#"
            lang_target = "繁體中文"
            batch_size = 4

            [params]
            api_base = "http://localhost:8080/v1"
            model = "qwen"
            delay = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.lang_target, "繁體中文");
        assert_eq!(config.batch_size, 4);
        assert_eq!(config.params.get_str("model"), Some("qwen"));
        assert!((config.params.delay() - 0.5).abs() < f64::EPSILON);

        let options = config.translator_options();
        assert_eq!(options.lang_source, JAPANESE);
        assert_eq!(options.params, config.params);
    }

    #[test]
    fn test_from_file_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::from_file(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, crate::error::Error::ConfigLoad(_)));
    }

    #[test]
    fn test_blank_backend_is_rejected() {
        let err = AppConfig::from_toml(r#"backend = "  ""#).unwrap_err();
        match err {
            crate::error::Error::ConfigInvalid { field, .. } => assert_eq!(field, "backend"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_target_is_rejected() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());
        config.lang_target.clear();
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid config value for 'lang_target': must not be empty"
        );
    }
}

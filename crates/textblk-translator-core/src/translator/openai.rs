use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn, error};

use crate::config::TranslatorParams;
use crate::error::{Error, Result};
use crate::language::{self, LanguageCatalog};
use super::traits::{Backend, LanguagePair, Text};

/// Default number of retry attempts
pub const DEFAULT_RETRY_COUNT: u32 = 3;
/// Default delay between retries in milliseconds
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const DEFAULT_TEMPERATURE: f32 = 0.3;
const REQUIRED_PARAMS: &[&str] = &["api_base", "model"];

/// Language names used in prompts, keyed by catalog display name
const PROMPT_LANGUAGES: &[(&str, &str)] = &[
    (language::SIMPLIFIED_CHINESE, "Simplified Chinese"),
    (language::TRADITIONAL_CHINESE, "Traditional Chinese"),
    (language::JAPANESE, "Japanese"),
    (language::ENGLISH, "English"),
    ("한국어", "Korean"),
    ("Tiếng Việt", "Vietnamese"),
    ("čeština", "Czech"),
    ("Nederlands", "Dutch"),
    ("français", "French"),
    ("Deutsch", "German"),
    ("magyar nyelv", "Hungarian"),
    ("italiano", "Italian"),
    ("polski", "Polish"),
    ("português", "Portuguese"),
    ("limba română", "Romanian"),
    ("русский язык", "Russian"),
    ("español", "Spanish"),
    ("Türk dili", "Turkish"),
];

/// OpenAI-compatible chat completions backend.
/// Works with: llama.cpp server, Ollama, DeepSeek, OpenAI, etc.
///
/// Settings come from the translator params during setup.
#[derive(Debug, Default)]
pub struct OpenAiBackend {
    client: Option<Client>,
    /// Base URL for the API (e.g., "http://localhost:8080/v1")
    pub api_base: String,
    /// Optional API key for authentication
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    /// Number of retry attempts
    pub retry_count: u32,
    /// Delay between retries in milliseconds
    pub retry_delay_ms: u64,
    pub temperature: f32,
    /// Send batches as one joined request
    pub concat: bool,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

impl OpenAiBackend {
    /// Create translation prompt
    fn create_prompt(text: &str, langs: &LanguagePair<'_>) -> String {
        let source_hint = if langs.source_code.is_empty() {
            String::new()
        } else {
            format!(" from {}", langs.source_code)
        };
        let separator_hint = if text.contains("###") {
            " The text is split into segments by lines containing only ###. Keep every ### line exactly where it is and translate each segment on its own."
        } else {
            ""
        };
        format!(
            "Translate the following text{} into {}. Output only the translation, no explanations.{}\n\nText: \"{}\"",
            source_hint, langs.target_code, separator_hint, text
        )
    }

    /// Make API request with retry logic.
    ///
    /// `Ok(None)` means the API answered without any choices.
    async fn request_with_retry(&self, text: &str, langs: &LanguagePair<'_>) -> Result<Option<String>> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| Error::TranslationRequest("backend used before setup".to_string()))?;
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: Self::create_prompt(text, langs),
            }],
            temperature: Some(self.temperature),
            max_tokens: None,
        };

        let mut last_error = None;

        for attempt in 0..self.retry_count {
            debug!(
                "Translation request attempt {}/{} to {}",
                attempt + 1,
                self.retry_count,
                url
            );

            let mut req = client.post(&url).json(&request);

            if let Some(ref key) = self.api_key {
                req = req.header("Authorization", format!("Bearer {key}"));
            }

            match req.send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        match response.json::<ChatResponse>().await {
                            Ok(chat_response) => {
                                return Ok(chat_response.choices.first().map(|choice| {
                                    strip_wrapping_quotes(&choice.message.content).to_string()
                                }));
                            }
                            Err(e) => {
                                warn!("Failed to parse response: {}", e);
                                last_error = Some(Error::TranslationInvalidResponse(e.to_string()));
                            }
                        }
                    } else if response.status().as_u16() == 429 {
                        let retry_after = response
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse().ok());

                        warn!("Rate limited, retry after {:?}s", retry_after);
                        last_error = Some(Error::TranslationRateLimited { retry_after });

                        let wait_time = retry_after.unwrap_or(5) * 1000;
                        tokio::time::sleep(Duration::from_millis(wait_time)).await;
                        continue;
                    } else {
                        let status = response.status();
                        let body = response.text().await.unwrap_or_default();
                        warn!("API error: {} - {}", status, body);
                        last_error = Some(Error::TranslationRequest(format!(
                            "HTTP {status}: {body}"
                        )));
                    }
                }
                Err(e) => {
                    warn!("Request failed: {}", e);
                    if e.is_timeout() {
                        last_error = Some(Error::TranslationTimeout);
                    } else {
                        last_error = Some(Error::TranslationRequest(e.to_string()));
                    }
                }
            }

            if attempt + 1 < self.retry_count {
                tokio::time::sleep(Duration::from_millis(self.retry_delay_ms)).await;
            }
        }

        error!("Translation failed after {} attempts", self.retry_count);
        Err(last_error.unwrap_or(Error::TranslationMaxRetriesExceeded))
    }
}

/// Trim the answer and drop one pair of quotes the model may have wrapped it in.
///
/// Quotes that belong to the translation itself are kept.
fn strip_wrapping_quotes(content: &str) -> &str {
    let content = content.trim();
    content
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(content)
}

#[async_trait]
impl Backend for OpenAiBackend {
    fn setup(&mut self, catalog: &mut LanguageCatalog, params: &TranslatorParams) -> Result<()> {
        let missing = params.missing(REQUIRED_PARAMS);
        if !missing.is_empty() {
            return Err(Error::MissingParams {
                backend: "openai".to_string(),
                params: missing.into_iter().map(str::to_string).collect(),
            });
        }

        // Checked above
        self.api_base = params.get_str("api_base").unwrap_or_default().to_string();
        self.model = params.get_str("model").unwrap_or_default().to_string();
        self.api_key = params.get_str("api_key").map(str::to_string);
        self.retry_count = params
            .get_u64("retry_count")
            .map_or(DEFAULT_RETRY_COUNT, |n| u32::try_from(n).unwrap_or(u32::MAX))
            .max(1);
        self.retry_delay_ms = params.get_u64("retry_delay_ms").unwrap_or(DEFAULT_RETRY_DELAY_MS);
        #[allow(clippy::cast_possible_truncation)]
        let temperature = params.get_f64("temperature").map_or(DEFAULT_TEMPERATURE, |t| t as f32);
        self.temperature = temperature;
        self.concat = params
            .get("concat_text")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(true);

        let timeout = params.get_u64("timeout_secs").unwrap_or(DEFAULT_TIMEOUT_SECS);
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(|e| Error::TranslationRequest(format!("failed to create HTTP client: {e}")))?;
        self.client = Some(client);

        catalog.set_codes(PROMPT_LANGUAGES.iter().copied());
        debug!("OpenAI backend ready: {} ({})", self.api_base, self.model);
        Ok(())
    }

    async fn translate_raw(&self, text: Text, langs: &LanguagePair<'_>) -> Result<Option<Text>> {
        match text {
            Text::Single(text) => Ok(self.request_with_retry(&text, langs).await?.map(Text::Single)),
            Text::Batch(texts) => {
                let mut translated = Vec::with_capacity(texts.len());
                for text in &texts {
                    translated.push(self.request_with_retry(text, langs).await?.unwrap_or_default());
                }
                Ok(Some(Text::Batch(translated)))
            }
        }
    }

    fn concat_text(&self) -> bool {
        self.concat
    }

    /// Automatic detection is accepted as a source even though it has no code
    fn supported_source_languages(&self, valid: &[String]) -> Vec<String> {
        std::iter::once(language::AUTO.to_string())
            .chain(valid.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> TranslatorParams {
        TranslatorParams::new()
            .with("api_base", "http://localhost:8080/v1")
            .with("model", "qwen")
    }

    fn pair<'a>(source_code: &'a str, target_code: &'a str) -> LanguagePair<'a> {
        LanguagePair {
            source: "",
            target: "",
            source_code,
            target_code,
        }
    }

    #[test]
    fn test_setup_requires_api_base_and_model() {
        let mut backend = OpenAiBackend::default();
        let mut catalog = LanguageCatalog::global();
        match backend.setup(&mut catalog, &TranslatorParams::new()) {
            Err(Error::MissingParams { params, .. }) => assert_eq!(params, vec!["api_base", "model"]),
            other => panic!("expected MissingParams, got {other:?}"),
        }
    }

    #[test]
    fn test_setup_fills_catalog_except_auto() {
        let mut backend = OpenAiBackend::default();
        let mut catalog = LanguageCatalog::global();
        backend.setup(&mut catalog, &configured()).unwrap();

        assert_eq!(catalog.code(language::AUTO), Some(""));
        assert_eq!(catalog.code(language::JAPANESE), Some("Japanese"));
        let valid = catalog.valid_languages();
        assert_eq!(valid.len(), catalog.len() - 1);

        let sources = backend.supported_source_languages(&valid);
        assert_eq!(sources[0], language::AUTO);
        assert_eq!(backend.supported_target_languages(&valid), valid);
    }

    #[test]
    fn test_setup_reads_optional_params() {
        let mut backend = OpenAiBackend::default();
        let params = configured()
            .with("api_key", "sk-test")
            .with("retry_count", 0)
            .with("concat_text", false);
        backend.setup(&mut LanguageCatalog::global(), &params).unwrap();
        assert_eq!(backend.api_key.as_deref(), Some("sk-test"));
        assert_eq!(backend.retry_count, 1);
        assert!(!backend.concat_text());
    }

    #[test]
    fn test_prompt_skips_auto_source() {
        let prompt = OpenAiBackend::create_prompt("hello", &pair("", "French"));
        assert!(prompt.starts_with("Translate the following text into French."));

        let prompt = OpenAiBackend::create_prompt("hello", &pair("English", "French"));
        assert!(prompt.contains("from English into French"));
        assert!(!prompt.contains("###"));
    }

    #[test]
    fn test_prompt_mentions_separator_for_batches() {
        let prompt = OpenAiBackend::create_prompt("a\n###\nb", &pair("English", "French"));
        assert!(prompt.contains("Keep every ### line"));
    }

    #[test]
    fn test_strip_wrapping_quotes_removes_one_pair() {
        assert_eq!(strip_wrapping_quotes("  \"Bonjour\"\n"), "Bonjour");
        assert_eq!(strip_wrapping_quotes("\"\"quoted\"\""), "\"quoted\"");
        assert_eq!(strip_wrapping_quotes("plain"), "plain");
    }

    #[test]
    fn test_strip_wrapping_quotes_keeps_quotes_in_translation() {
        // Batched answer whose last fragment ends with a quote
        let answer = "Hello\n###\nHe said \"hi\"";
        assert_eq!(strip_wrapping_quotes(answer), answer);
        assert_eq!(strip_wrapping_quotes("\"Hi\" she said"), "\"Hi\" she said");
        assert_eq!(strip_wrapping_quotes("\""), "\"");
    }

    #[tokio::test]
    async fn test_request_before_setup_fails() {
        let backend = OpenAiBackend::default();
        let result = backend.translate_raw(Text::from("hi"), &pair("English", "French")).await;
        assert!(matches!(result, Err(Error::TranslationRequest(_))));
    }
}

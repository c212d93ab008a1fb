use async_trait::async_trait;
use std::any::TypeId;

use crate::config::TranslatorParams;
use crate::error::Result;
use crate::language::LanguageCatalog;
use crate::util::is_blank;

/// Text handed to or returned from a translator: one string or an ordered batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Text {
    Single(String),
    Batch(Vec<String>),
}

impl Text {
    /// True for a blank string, or a batch whose fragments are all blank
    /// (an empty batch included).
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(text) => is_blank(text),
            Self::Batch(texts) => texts.iter().all(|t| is_blank(t)),
        }
    }

    /// Number of fragments (1 for a single string)
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Batch(texts) => texts.len(),
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Single(_) => "single",
            Self::Batch(_) => "batch",
        }
    }

    /// Same shape, every fragment empty
    pub fn blank_like(&self) -> Self {
        match self {
            Self::Single(_) => Self::Single(String::new()),
            Self::Batch(texts) => Self::Batch(vec![String::new(); texts.len()]),
        }
    }

    pub fn into_single(self) -> Option<String> {
        match self {
            Self::Single(text) => Some(text),
            Self::Batch(_) => None,
        }
    }

    pub fn into_batch(self) -> Option<Vec<String>> {
        match self {
            Self::Single(_) => None,
            Self::Batch(texts) => Some(texts),
        }
    }
}

impl From<String> for Text {
    fn from(s: String) -> Self {
        Self::Single(s)
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Self::Single(s.to_string())
    }
}

impl From<Vec<String>> for Text {
    fn from(texts: Vec<String>) -> Self {
        Self::Batch(texts)
    }
}

impl From<Vec<&str>> for Text {
    fn from(texts: Vec<&str>) -> Self {
        Self::Batch(texts.into_iter().map(str::to_string).collect())
    }
}

/// Current language pair of a translator, by display name and backend code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguagePair<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub source_code: &'a str,
    pub target_code: &'a str,
}

/// Trait for translation backends.
///
/// A backend supplies setup and the raw request; batching, validation and
/// post-processing live in [`Translator`](super::Translator).
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Fill in catalog codes for the languages this backend handles and check
    /// `params`. Report absent keys with `Error::MissingParams`; any other error
    /// is wrapped as a setup failure.
    fn setup(&mut self, catalog: &mut LanguageCatalog, params: &TranslatorParams) -> Result<()>;

    /// Translate one string or a batch. Must return the same shape as `text`,
    /// or `None` when nothing was produced.
    async fn translate_raw(&self, text: Text, langs: &LanguagePair<'_>) -> Result<Option<Text>>;

    /// Join batches into one delimited string before calling [`Self::translate_raw`]
    fn concat_text(&self) -> bool {
        true
    }

    /// Register the simplified-to-traditional Chinese hook at construction
    fn cht_require_convert(&self) -> bool {
        false
    }

    /// Languages accepted as source; `valid` is every language with a code
    fn supported_source_languages(&self, valid: &[String]) -> Vec<String> {
        valid.to_vec()
    }

    /// Languages accepted as target; `valid` is every language with a code
    fn supported_target_languages(&self, valid: &[String]) -> Vec<String> {
        valid.to_vec()
    }

    /// Tag used to look this backend up in a registry
    fn backend_tag(&self) -> TypeId {
        TypeId::of::<Self>()
    }
}

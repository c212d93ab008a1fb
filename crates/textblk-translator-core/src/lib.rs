//! Textblk Translator Core Library
//!
//! A uniform layer over machine translation backends:
//! - Language catalog and per-translator validation
//! - Batching of many fragments into one backend request
//! - Post-processing hooks (e.g. simplified to traditional Chinese)
//! - Writing translations back onto text records

pub mod config;
pub mod error;
pub mod hooks;
pub mod language;
pub mod record;
pub mod translator;
pub mod util;

pub use config::{AppConfig, TranslatorOptions, TranslatorParams};
pub use error::{Error, LangSide, Result};
pub use hooks::{Hook, HookContext, HookFn, HookId, HookSet, chs_to_cht};
pub use language::{LanguageCatalog, TRADITIONAL_CHINESE};
pub use record::{BoundingBox, TextBlock, TextRecord};
pub use translator::{
    Backend, BatchCodec, LanguagePair, OpenAiBackend, Registry, Text, Translator,
    create_translator, TEXTBLK_BREAK,
};

mod base;
mod batch;
mod openai;
pub mod registry;
mod traits;

pub use base::Translator;
pub use batch::{BatchCodec, TEXTBLK_BREAK};
pub use openai::OpenAiBackend;
pub use registry::{BackendFactory, Registry};
pub use traits::{Backend, LanguagePair, Text};

use crate::config::AppConfig;
use crate::error::Result;

/// Create a translator from configuration using the built-in backends
pub fn create_translator(config: &AppConfig) -> Result<Translator> {
    Translator::from_registry(registry::builtin(), &config.backend, config.translator_options())
}

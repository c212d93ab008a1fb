use tracing::{debug, error, warn};

use crate::config::{TranslatorOptions, TranslatorParams};
use crate::error::{Error, LangSide, Result};
use crate::hooks::{Hook, HookContext, HookSet, chs_to_cht};
use crate::language::{LanguageCatalog, check_supported};
use crate::record::TextRecord;
use super::batch::BatchCodec;
use super::registry::{self, Registry};
use super::traits::{Backend, LanguagePair, Text};

/// A backend wrapped with language validation, batching and post-processing.
///
/// Owns its catalog copy and hooks; nothing is shared between instances.
pub struct Translator {
    name: String,
    backend: Box<dyn Backend>,
    catalog: LanguageCatalog,
    params: TranslatorParams,
    valid_languages: Vec<String>,
    supported_source: Vec<String>,
    supported_target: Vec<String>,
    lang_source: String,
    lang_target: String,
    hooks: HookSet,
    codec: BatchCodec,
}

impl Translator {
    /// Set up `backend` and select the requested languages.
    ///
    /// The name is whatever the backend type is registered as in
    /// [`registry::builtin`], or empty.
    pub fn new<B: Backend>(backend: B, options: TranslatorOptions) -> Result<Self> {
        Self::from_boxed(Box::new(backend), options)
    }

    pub fn from_boxed(backend: Box<dyn Backend>, options: TranslatorOptions) -> Result<Self> {
        let name = registry::builtin()
            .name_of(backend.backend_tag())
            .unwrap_or_default()
            .to_string();
        Self::build(name, backend, options)
    }

    /// Build the backend registered as `name` in `registry`
    pub fn from_registry(registry: &Registry, name: &str, options: TranslatorOptions) -> Result<Self> {
        let backend = registry.create(name)?;
        Self::build(name.to_string(), backend, options)
    }

    fn build(name: String, mut backend: Box<dyn Backend>, options: TranslatorOptions) -> Result<Self> {
        let TranslatorOptions {
            lang_source,
            lang_target,
            raise_unsupported_lang,
            params,
        } = options;

        let mut catalog = LanguageCatalog::global();
        debug!("Setting up translator '{}'", name);
        if let Err(e) = backend.setup(&mut catalog, &params) {
            if e.is_missing_params() {
                return Err(e);
            }
            return Err(Error::SetupFailure {
                backend: name,
                source: Box::new(e),
            });
        }

        let valid_languages = catalog.valid_languages();
        let supported_source = backend.supported_source_languages(&valid_languages);
        let supported_target = backend.supported_target_languages(&valid_languages);
        debug!(
            "Translator '{}' supports {} languages",
            name,
            valid_languages.len()
        );

        let mut translator = Self {
            name,
            backend,
            catalog,
            params,
            valid_languages,
            supported_source,
            supported_target,
            lang_source: String::new(),
            lang_target: String::new(),
            hooks: HookSet::new(),
            codec: BatchCodec::default(),
        };

        if let Err(e) = translator.set_language_pair(&lang_source, &lang_target) {
            if raise_unsupported_lang {
                return Err(e);
            }
            let (Some(source), Some(target)) = (
                translator.supported_source.first().cloned(),
                translator.supported_target.first().cloned(),
            ) else {
                return Err(e);
            };
            warn!(
                "{}: falling back to {} -> {}",
                e.to_string().lines().next().unwrap_or_default(),
                source,
                target
            );
            translator.set_language_pair(&source, &target)?;
        }

        if translator.backend.cht_require_convert() {
            translator.hooks.insert(Hook::from_fn(chs_to_cht));
        }

        Ok(translator)
    }

    fn set_language_pair(&mut self, source: &str, target: &str) -> Result<()> {
        self.set_source(source)?;
        self.set_target(target)
    }

    /// Select the source language; must be one of [`Self::supported_source_languages`]
    pub fn set_source(&mut self, lang: &str) -> Result<()> {
        check_supported(LangSide::Source, lang, &self.supported_source)?;
        self.lang_source = lang.to_string();
        Ok(())
    }

    /// Select the target language; must be one of [`Self::supported_target_languages`]
    pub fn set_target(&mut self, lang: &str) -> Result<()> {
        check_supported(LangSide::Target, lang, &self.supported_target)?;
        self.lang_target = lang.to_string();
        Ok(())
    }

    /// Add a post-processing hook. Registering the same hook again does nothing.
    pub fn register_hook(&mut self, hook: impl Into<Hook>) {
        self.hooks.insert(hook.into());
    }

    /// Add several hooks; `None` adds nothing.
    pub fn register_hooks<I>(&mut self, hooks: I)
    where
        I: IntoIterator,
        I::Item: Into<Hook>,
    {
        self.hooks.extend(hooks);
    }

    /// Translate a string or batch.
    ///
    /// Empty input comes back untouched without a backend call. Batches come
    /// back with the same number of fragments, and every registered hook has
    /// run on each fragment.
    pub async fn translate(&self, text: Text) -> Result<Text> {
        if text.is_empty() {
            return Ok(text);
        }

        let expected = text.len();
        let is_batch = matches!(text, Text::Batch(_));
        let blank = text.blank_like();
        let langs = self.language_pair();

        let translated = match text {
            Text::Batch(fragments) if self.backend.concat_text() => {
                let joined = self.codec.join(&fragments);
                debug!("Sending {} fragments as one request", fragments.len());
                match self.backend.translate_raw(Text::Single(joined), &langs).await? {
                    Some(Text::Single(response)) => Text::Batch(self.codec.split(&response)),
                    Some(other) => return Err(shape_mismatch("single", &other)),
                    None => blank,
                }
            }
            text => match self.backend.translate_raw(text, &langs).await? {
                Some(result) if matches!(result, Text::Batch(_)) == is_batch => result,
                Some(other) => return Err(shape_mismatch(blank.kind(), &other)),
                None => blank,
            },
        };

        let ctx = HookContext {
            source: &self.lang_source,
            target: &self.lang_target,
            record: None,
        };
        match translated {
            Text::Single(text) => Ok(Text::Single(self.hooks.apply(text, &ctx))),
            Text::Batch(texts) => {
                if texts.len() != expected {
                    error!(
                        "Backend '{}' returned {} fragments for {}; separator was likely altered",
                        self.name,
                        texts.len(),
                        expected
                    );
                    return Err(Error::BatchMismatch {
                        expected,
                        actual: texts.len(),
                    });
                }
                Ok(Text::Batch(
                    texts
                        .into_iter()
                        .map(|text| self.hooks.apply(text, &ctx))
                        .collect(),
                ))
            }
        }
    }

    /// Translate one string
    pub async fn translate_one(&self, text: &str) -> Result<String> {
        let translated = self.translate(Text::from(text)).await?;
        let mismatch = shape_mismatch("single", &translated);
        translated.into_single().ok_or(mismatch)
    }

    /// Translate an ordered batch of fragments
    pub async fn translate_batch(&self, texts: Vec<String>) -> Result<Vec<String>> {
        let translated = self.translate(Text::Batch(texts)).await?;
        let mismatch = shape_mismatch("batch", &translated);
        translated.into_batch().ok_or(mismatch)
    }

    /// Translate every record and write the result back onto it.
    ///
    /// Hooks run once inside [`Self::translate`] and once more per record with
    /// the record as context.
    pub async fn translate_records<R: TextRecord>(&self, records: &mut [R]) -> Result<()> {
        let texts = records.iter().map(TextRecord::text).collect();
        let translations = self.translate_batch(texts).await?;

        for (translation, record) in translations.into_iter().zip(records.iter_mut()) {
            let translation = {
                let ctx = HookContext {
                    source: &self.lang_source,
                    target: &self.lang_target,
                    record: Some(&*record),
                };
                self.hooks.apply(translation, &ctx)
            };
            record.set_translation(translation);
        }
        Ok(())
    }

    fn language_pair(&self) -> LanguagePair<'_> {
        LanguagePair {
            source: &self.lang_source,
            target: &self.lang_target,
            source_code: self.catalog.code(&self.lang_source).unwrap_or_default(),
            target_code: self.catalog.code(&self.lang_target).unwrap_or_default(),
        }
    }

    /// Registered backend name, empty if the backend type is unregistered
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lang_source(&self) -> &str {
        &self.lang_source
    }

    pub fn lang_target(&self) -> &str {
        &self.lang_target
    }

    /// Languages with a backend code, in catalog order
    pub fn supported_languages(&self) -> &[String] {
        &self.valid_languages
    }

    pub fn supported_source_languages(&self) -> &[String] {
        &self.supported_source
    }

    pub fn supported_target_languages(&self) -> &[String] {
        &self.supported_target
    }

    pub const fn catalog(&self) -> &LanguageCatalog {
        &self.catalog
    }

    pub const fn params(&self) -> &TranslatorParams {
        &self.params
    }

    pub const fn hooks(&self) -> &HookSet {
        &self.hooks
    }

    /// Seconds callers should wait between requests; not applied here
    pub fn delay(&self) -> f64 {
        self.params.delay()
    }
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("name", &self.name)
            .field("lang_source", &self.lang_source)
            .field("lang_target", &self.lang_target)
            .field("hooks", &self.hooks.len())
            .finish_non_exhaustive()
    }
}

fn shape_mismatch(expected: &'static str, actual: &Text) -> Error {
    Error::ShapeMismatch {
        expected,
        actual: actual.kind(),
    }
}

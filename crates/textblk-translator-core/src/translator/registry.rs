use std::any::TypeId;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use super::openai::OpenAiBackend;
use super::traits::Backend;

/// Builds a fresh, not yet set up backend
pub type BackendFactory = fn() -> Box<dyn Backend>;

struct Entry {
    name: String,
    tag: TypeId,
    factory: BackendFactory,
}

/// Named backend table.
///
/// Each entry records the backend's type tag so a translator built from a bare
/// backend can still report the name it was registered under.
#[derive(Default)]
pub struct Registry {
    entries: Vec<Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `B` under `name`, replacing any entry with the same name.
    pub fn register<B: Backend>(&mut self, name: impl Into<String>, factory: BackendFactory) -> &mut Self {
        let name = name.into();
        let entry = Entry {
            name,
            tag: TypeId::of::<B>(),
            factory,
        };
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        self
    }

    /// Instantiate the backend registered as `name`
    pub fn create(&self, name: &str) -> Result<Box<dyn Backend>> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| (e.factory)())
            .ok_or_else(|| Error::UnknownBackend(name.to_string()))
    }

    /// Name registered for a backend type tag
    pub fn name_of(&self, tag: TypeId) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.tag == tag)
            .map(|e| e.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Registered names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }
}

static BUILTIN: LazyLock<Registry> = LazyLock::new(|| {
    let mut registry = Registry::new();
    registry.register::<OpenAiBackend>("openai", || Box::new(OpenAiBackend::default()));
    registry
});

/// Process-wide registry holding the backends shipped with this crate
pub fn builtin() -> &'static Registry {
    &BUILTIN
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranslatorParams;
    use crate::language::LanguageCatalog;
    use crate::translator::{LanguagePair, Text};
    use async_trait::async_trait;

    #[derive(Default)]
    struct Dummy;

    #[async_trait]
    impl Backend for Dummy {
        fn setup(&mut self, _catalog: &mut LanguageCatalog, _params: &TranslatorParams) -> Result<()> {
            Ok(())
        }

        async fn translate_raw(&self, text: Text, _langs: &LanguagePair<'_>) -> Result<Option<Text>> {
            Ok(Some(text))
        }
    }

    #[test]
    fn test_builtin_has_openai() {
        let registry = builtin();
        assert!(registry.contains("openai"));
        assert_eq!(registry.name_of(TypeId::of::<OpenAiBackend>()), Some("openai"));
        let backend = registry.create("openai").unwrap();
        assert_eq!(registry.name_of(backend.backend_tag()), Some("openai"));
    }

    #[test]
    fn test_lookup_by_tag() {
        let mut registry = Registry::new();
        registry.register::<Dummy>("dummy", || Box::new(Dummy));
        assert_eq!(registry.name_of(TypeId::of::<Dummy>()), Some("dummy"));
        assert_eq!(registry.name_of(TypeId::of::<OpenAiBackend>()), None);
    }

    #[test]
    fn test_unknown_name() {
        let registry = Registry::new();
        assert!(matches!(registry.create("deepl"), Err(Error::UnknownBackend(name)) if name == "deepl"));
    }

    #[test]
    fn test_reregister_replaces() {
        let mut registry = Registry::new();
        registry
            .register::<Dummy>("x", || Box::new(Dummy))
            .register::<OpenAiBackend>("x", || Box::new(OpenAiBackend::default()));
        assert_eq!(registry.names(), vec!["x"]);
        assert_eq!(registry.name_of(TypeId::of::<OpenAiBackend>()), Some("x"));
    }
}

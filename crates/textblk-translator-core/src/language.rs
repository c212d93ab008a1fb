//! Language catalog and validation.
//!
//! The catalog maps display names (what users pick) to backend-specific codes.
//! Every translator starts from a copy of [`LanguageCatalog::global`] and its
//! backend fills in codes during setup. A language is valid for that
//! translator iff its code is non-empty afterwards.

use crate::error::{Error, LangSide, Result};

/// Display name for automatic source detection
pub const AUTO: &str = "Auto";
/// Display name for simplified Chinese
pub const SIMPLIFIED_CHINESE: &str = "简体中文";
/// Display name for traditional Chinese; targeting it enables script conversion
pub const TRADITIONAL_CHINESE: &str = "繁體中文";
/// Display name for Japanese
pub const JAPANESE: &str = "日本語";
/// Display name for English
pub const ENGLISH: &str = "English";

/// Display names known process-wide, in presentation order
pub const GLOBAL_LANGUAGES: &[&str] = &[
    AUTO,
    SIMPLIFIED_CHINESE,
    TRADITIONAL_CHINESE,
    JAPANESE,
    ENGLISH,
    "한국어",
    "Tiếng Việt",
    "čeština",
    "Nederlands",
    "français",
    "Deutsch",
    "magyar nyelv",
    "italiano",
    "polski",
    "português",
    "limba română",
    "русский язык",
    "español",
    "Türk dili",
];

/// Ordered mapping from display name to backend code.
///
/// An empty code means the language is unmapped for this translator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LanguageCatalog {
    entries: Vec<(String, String)>,
}

impl LanguageCatalog {
    /// Catalog with every global language and no codes filled in
    pub fn global() -> Self {
        GLOBAL_LANGUAGES.iter().copied().collect()
    }

    /// Code mapped for `lang`, `None` if the name is not in the catalog
    pub fn code(&self, lang: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == lang)
            .map(|(_, code)| code.as_str())
    }

    /// Set the code for `lang`, appending the language if it is new.
    pub fn set_code(&mut self, lang: impl Into<String>, code: impl Into<String>) {
        let lang = lang.into();
        let code = code.into();
        match self.entries.iter_mut().find(|(name, _)| *name == lang) {
            Some(entry) => entry.1 = code,
            None => self.entries.push((lang, code)),
        }
    }

    /// Fill several codes at once
    pub fn set_codes<'a>(&mut self, codes: impl IntoIterator<Item = (&'a str, &'a str)>) {
        for (lang, code) in codes {
            self.set_code(lang, code);
        }
    }

    /// Languages with a non-empty code, in catalog order
    pub fn valid_languages(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, code)| !code.is_empty())
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for LanguageCatalog {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut catalog = Self::default();
        for lang in iter {
            catalog.set_code(lang, "");
        }
        catalog
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for LanguageCatalog {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut catalog = Self::default();
        catalog.set_codes(iter);
        catalog
    }
}

/// Check that `lang` is one of `supported`.
///
/// The error carries every supported name so callers can show the choices.
pub fn check_supported(side: LangSide, lang: &str, supported: &[String]) -> Result<()> {
    if supported.iter().any(|s| s == lang) {
        return Ok(());
    }
    Err(Error::InvalidLanguage {
        side,
        lang: lang.to_string(),
        valid: supported.to_vec(),
    })
}

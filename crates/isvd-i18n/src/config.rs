//! Localizer configuration.
//!
//! Values come from code (`with_*` builders) or from the environment via
//! [`LocalizerConfig::from_env`]. Environment lookup is injected as a
//! closure so callers and tests never mutate process state.
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `ISVD_LANG` | `language` | system locale |
//! | `ISVD_DEFAULT_LANG` | `default_language` | `en` |
//! | `ISVD_TRANSLATIONS` | `translations` | bundled resources |
//! | `ISVD_TRANSLATIONS_PREFIX` | `file_prefix` | `app` |
//! | `ISVD_NUMBER_PRECISION` | `number_format.precision` | shortest form |

use std::path::PathBuf;

use tracing::warn;

use crate::bundled;
use crate::error::Result;
use crate::format::NumberFormat;
use crate::locale::LanguageId;
use crate::registry::{CatalogRegistry, DEFAULT_PREFIX, RegistryBuilder};

/// Requested active language.
pub const ENV_LANG: &str = "ISVD_LANG";
/// Fallback language.
pub const ENV_DEFAULT_LANG: &str = "ISVD_DEFAULT_LANG";
/// Directory of `.ts` resources.
pub const ENV_TRANSLATIONS: &str = "ISVD_TRANSLATIONS";
/// File-name prefix of resources in that directory.
pub const ENV_TRANSLATIONS_PREFIX: &str = "ISVD_TRANSLATIONS_PREFIX";
/// Fixed float precision.
pub const ENV_NUMBER_PRECISION: &str = "ISVD_NUMBER_PRECISION";

/// Where translation resources are loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TranslationSource {
    /// Resources compiled into the crate.
    #[default]
    Bundled,
    /// `<prefix>_<language>.ts` files in a directory.
    Directory(PathBuf),
}

impl TranslationSource {
    /// Directory source.
    #[must_use]
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::Directory(path.into())
    }
}

/// Configuration for [`Localizer::from_config`](crate::Localizer::from_config).
#[derive(Debug, Clone, PartialEq)]
pub struct LocalizerConfig {
    /// Fallback language tag.
    pub default_language: String,
    /// Requested active language; `None` means detect from the system locale.
    pub language: Option<String>,
    /// Resource location.
    pub translations: TranslationSource,
    /// File-name prefix for [`TranslationSource::Directory`].
    pub file_prefix: String,
    /// Number policy for numeric arguments.
    pub number_format: NumberFormat,
}

impl Default for LocalizerConfig {
    fn default() -> Self {
        Self {
            default_language: bundled::DEFAULT_LANGUAGE.to_string(),
            language: None,
            translations: TranslationSource::Bundled,
            file_prefix: DEFAULT_PREFIX.to_string(),
            number_format: NumberFormat::default(),
        }
    }
}

impl LocalizerConfig {
    /// Read overrides from the environment on top of the defaults.
    ///
    /// Empty values are treated as unset. An unparsable precision is logged
    /// and ignored.
    #[must_use]
    pub fn from_env<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            get_env(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(language) = get(ENV_DEFAULT_LANG) {
            config.default_language = language;
        }
        config.language = get(ENV_LANG);
        if let Some(dir) = get(ENV_TRANSLATIONS) {
            config.translations = TranslationSource::directory(dir);
        }
        if let Some(prefix) = get(ENV_TRANSLATIONS_PREFIX) {
            config.file_prefix = prefix;
        }
        if let Some(raw) = get(ENV_NUMBER_PRECISION) {
            match raw.parse::<usize>() {
                Ok(precision) => config.number_format.precision = Some(precision),
                Err(err) => warn!(value = %raw, %err, "ignoring {ENV_NUMBER_PRECISION}"),
            }
        }
        config
    }

    /// Set the fallback language.
    #[must_use]
    pub fn with_default_language(mut self, language: impl Into<String>) -> Self {
        self.default_language = language.into();
        self
    }

    /// Set (or clear) the requested active language.
    #[must_use]
    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    /// Set the resource location.
    #[must_use]
    pub fn with_translations(mut self, translations: TranslationSource) -> Self {
        self.translations = translations;
        self
    }

    /// Set the resource file-name prefix.
    #[must_use]
    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    /// Set the number policy.
    #[must_use]
    pub fn with_number_format(mut self, number_format: NumberFormat) -> Self {
        self.number_format = number_format;
        self
    }

    /// Load the configured resources into a registry.
    ///
    /// Fails only when `default_language` is not a valid tag; resource
    /// problems end up in [`CatalogRegistry::warnings`].
    pub fn build_registry(&self) -> Result<CatalogRegistry> {
        let builder = RegistryBuilder::new(LanguageId::new(&self.default_language)?);
        let registry = match &self.translations {
            TranslationSource::Bundled => builder.with_bundled().build(),
            TranslationSource::Directory(dir) => {
                let mut builder = builder;
                builder.load_dir(dir, &self.file_prefix);
                builder.build()
            }
        };
        Ok(registry)
    }
}

//! The facade CLI and GUI code resolves messages through.
//!
//! # Invariants
//!
//! 1. **Fallback chain of length one**: a lookup tries the active language,
//!    then the registry's default language, then gives up and returns the
//!    bare key. It never walks further.
//!
//! 2. **Missing data never fails**: an absent key yields the key itself.
//!    Only formatting problems (missing argument, malformed marker) are
//!    returned as errors, because they point at a bug in a call site or a
//!    catalog.
//!
//! 3. **Atomic language switch**: the active language lives behind an
//!    `RwLock`; every `resolve` reads either the old or the new value.
//!    Strings produced before a switch are not touched. Applying a switch to
//!    already-rendered UI is the application's job (the `Gui.reboot`
//!    message), signalled by [`LanguageChange::requires_restart`].
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Key missing in active language | Incomplete translation | Default language template used |
//! | Key missing everywhere | Unknown key | Bare key returned, `warn!` logged |
//! | Argument missing | Call site omits a name | `Err(MissingPlaceholder)` |
//! | Malformed template | Catalog bug | `Err(UnknownPlaceholderSyntax)` |
//! | Unknown language requested | Typo, missing resource | `Err(UnsupportedLanguage)`, state unchanged |

use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::config::LocalizerConfig;
use crate::error::Result;
use crate::format::{Args, Formatter, NumberFormat};
use crate::locale::{self, LanguageId};
use crate::registry::CatalogRegistry;

/// Where a template was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// Defined by the active language.
    Active(&'a str),
    /// Served by the default language.
    Fallback(&'a str),
    /// Defined nowhere.
    Missing,
}

impl<'a> Lookup<'a> {
    /// The template, if any.
    #[must_use]
    pub fn template(self) -> Option<&'a str> {
        match self {
            Self::Active(t) | Self::Fallback(t) => Some(t),
            Self::Missing => None,
        }
    }
}

/// Outcome of [`Localizer::set_active_language`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageChange {
    /// Language active before the call.
    pub previous: LanguageId,
    /// Language active after the call.
    pub current: LanguageId,
}

impl LanguageChange {
    /// Whether text already on screen is now in the wrong language and the
    /// application should restart (or rebuild its UI) to apply the change.
    #[must_use]
    pub fn requires_restart(&self) -> bool {
        self.previous != self.current
    }
}

/// Resolves `(context, key)` to display text in the active language.
///
/// # Example
///
/// ```
/// use isvd_i18n::{args, CatalogRegistry, Localizer};
///
/// let localizer = Localizer::new(CatalogRegistry::bundled());
/// localizer.set_active_language("it").unwrap();
///
/// assert_eq!(
///     localizer.resolve("Cli", "values", &args! { values = 5, max = 3 }).unwrap(),
///     "Impossibile usare 5 valori per un massimo 3 valori"
/// );
/// // Missing keys degrade to the key itself.
/// assert_eq!(localizer.resolve("Gui", "doesNotExist", &args!()).unwrap(), "doesNotExist");
/// ```
#[derive(Debug)]
pub struct Localizer {
    registry: Arc<CatalogRegistry>,
    active: RwLock<LanguageId>,
    formatter: Formatter,
}

impl Localizer {
    /// Localizer starting in the registry's default language, or in the
    /// first registered language when the default has no catalog.
    #[must_use]
    pub fn new(registry: impl Into<Arc<CatalogRegistry>>) -> Self {
        let registry = registry.into();
        let active = initial_language(&registry);
        Self {
            registry,
            active: RwLock::new(active),
            formatter: Formatter::default(),
        }
    }

    /// Localizer starting in `language`, which must be registered.
    pub fn with_language(registry: impl Into<Arc<CatalogRegistry>>, language: &str) -> Result<Self> {
        let localizer = Self::new(registry);
        localizer.set_active_language(language)?;
        Ok(localizer)
    }

    /// Build the registry and pick the active language from `config`.
    ///
    /// Active language: the configured one if registered, else the system
    /// locale (read through `get_env`), else the default language if it has a
    /// catalog, else the first registered language.
    pub fn from_config<F>(config: &LocalizerConfig, get_env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let registry = config.build_registry()?;

        let requested = config.language.as_deref().and_then(|tag| {
            let found = locale::match_language(tag, registry.languages());
            if found.is_none() {
                warn!(language = tag, "configured language has no catalog; ignoring");
            }
            found
        });
        let chosen = requested.or_else(|| locale::detect_language(get_env, registry.languages()));

        let localizer = Self::new(registry).with_number_format(config.number_format);
        if let Some(active) = chosen {
            *localizer.active.write().unwrap_or_else(PoisonError::into_inner) = active;
        }
        Ok(localizer)
    }

    /// Replace the number policy used for numeric arguments.
    #[must_use]
    pub fn with_number_format(mut self, numbers: NumberFormat) -> Self {
        self.formatter = Formatter::new(numbers);
        self
    }

    /// The shared registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<CatalogRegistry> {
        &self.registry
    }

    /// The number policy in use.
    #[must_use]
    pub fn number_format(&self) -> &NumberFormat {
        self.formatter.number_format()
    }

    /// Currently active language.
    #[must_use]
    pub fn active_language(&self) -> LanguageId {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Switch the active language.
    ///
    /// Fails with [`I18nError::UnsupportedLanguage`](crate::I18nError::UnsupportedLanguage) when no catalog is
    /// registered for `language`; the active language is unchanged then.
    pub fn set_active_language(&self, language: &str) -> Result<LanguageChange> {
        let current = self.registry.language(language)?;
        let previous = {
            let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *active, current.clone())
        };
        let change = LanguageChange { previous, current };
        if change.requires_restart() {
            debug!(from = %change.previous, to = %change.current, "active language changed");
        }
        Ok(change)
    }

    /// Find the template for `(context, key)` following the fallback policy.
    #[must_use]
    pub fn lookup(&self, context: &str, key: &str) -> Lookup<'_> {
        self.lookup_in(&self.active_language(), context, key)
    }

    fn lookup_in(&self, language: &LanguageId, context: &str, key: &str) -> Lookup<'_> {
        if let Some(template) = self
            .registry
            .catalog(language)
            .and_then(|catalog| catalog.lookup(context, key))
        {
            return Lookup::Active(template);
        }
        let default = self.registry.default_language();
        if default == language {
            return Lookup::Missing;
        }
        match self
            .registry
            .catalog(default)
            .and_then(|catalog| catalog.lookup(context, key))
        {
            Some(template) => {
                debug!(%language, context, key, "message served by default language");
                Lookup::Fallback(template)
            }
            None => Lookup::Missing,
        }
    }

    /// Resolve and format a message in the active language.
    ///
    /// Returns the bare `key` when no language defines the message.
    pub fn resolve(&self, context: &str, key: &str, args: &Args) -> Result<String> {
        self.resolve_in(&self.active_language(), context, key, args)
    }

    /// Resolve in a specific language without touching the active one.
    pub fn resolve_in(
        &self,
        language: &LanguageId,
        context: &str,
        key: &str,
        args: &Args,
    ) -> Result<String> {
        match self.lookup_in(language, context, key).template() {
            Some(template) => self.formatter.format(template, args),
            None => {
                warn!(%language, context, key, "message not found in any catalog");
                Ok(key.to_string())
            }
        }
    }
}

fn initial_language(registry: &CatalogRegistry) -> LanguageId {
    let default = registry.default_language();
    if registry.contains(default) {
        return default.clone();
    }
    match registry.languages().next() {
        Some(first) => {
            warn!(
                default_language = %default,
                active = %first,
                "default language has no catalog; starting in first registered language"
            );
            first.clone()
        }
        None => default.clone(),
    }
}

// ============================================================================
// Process-wide instance
// ============================================================================

static GLOBAL: OnceLock<Localizer> = OnceLock::new();

/// Install the process-wide localizer. Only the first call wins; a rejected
/// localizer is handed back.
pub fn install_global(localizer: Localizer) -> std::result::Result<(), Localizer> {
    GLOBAL.set(localizer)
}

/// The process-wide localizer, if installed.
#[must_use]
pub fn global() -> Option<&'static Localizer> {
    GLOBAL.get()
}

/// Resolve through the global localizer.
///
/// Without an installed localizer the bare key is returned, matching the
/// behavior for a key no catalog defines.
pub fn translate(context: &str, key: &str, args: &Args) -> Result<String> {
    match global() {
        Some(localizer) => localizer.resolve(context, key, args),
        None => Ok(key.to_string()),
    }
}

/// Resolve a message through the global localizer.
///
/// ```
/// let text = isvd_i18n::tr!("Cli", "values", values = 5, max = 3).unwrap();
/// assert!(!text.is_empty());
/// ```
#[macro_export]
macro_rules! tr {
    ($context:expr, $key:expr $(, $name:ident = $value:expr)* $(,)?) => {{
        #[allow(unused_mut)]
        let mut args = $crate::format::Args::new();
        $( args.set(stringify!($name), $value); )*
        $crate::localizer::translate($context, $key, &args)
    }};
}

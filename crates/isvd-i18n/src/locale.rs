//! Language identifiers and system locale detection.
//!
//! A [`LanguageId`] is opaque: the engine compares identifiers exactly and
//! never rewrites them. The only structure it looks at is the primary
//! subtag (`it` in `it_IT`), and only when matching a system locale against
//! the registered set.

use std::fmt;
use std::sync::Arc;

use crate::error::{I18nError, Result};

/// Environment variables consulted for the system locale, in priority order.
pub const LOCALE_ENV_VARS: &[&str] = &["LC_ALL", "LC_MESSAGES", "LANG"];

/// Identifier of a supported language (e.g. `"en"`, `"it"`, `"en_US"`).
///
/// Cheap to clone; the tag is shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguageId(Arc<str>);

impl LanguageId {
    /// Create an identifier from a tag.
    ///
    /// Surrounding whitespace is trimmed. Empty tags and tags containing
    /// inner whitespace are rejected.
    pub fn new(tag: impl AsRef<str>) -> Result<Self> {
        let tag = tag.as_ref().trim();
        if tag.is_empty() || tag.chars().any(char::is_whitespace) {
            return Err(I18nError::InvalidLanguageId(tag.to_string()));
        }
        Ok(Self(Arc::from(tag)))
    }

    /// Identifier from a tag known to be valid at compile time.
    pub(crate) fn from_static(tag: &'static str) -> Self {
        debug_assert!(Self::new(tag).is_ok(), "invalid built-in tag {tag:?}");
        Self(Arc::from(tag))
    }

    /// The tag as given at construction.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Primary language subtag, lowercased (`"en"` for `"en_US"` or `"EN-gb"`).
    #[must_use]
    pub fn primary(&self) -> String {
        primary_subtag(&self.0)
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LanguageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for LanguageId {
    type Err = I18nError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for LanguageId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

pub(crate) fn primary_subtag(tag: &str) -> String {
    tag.trim()
        .split(['_', '-', '.', '@'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Strip encoding and modifier suffixes from a POSIX locale value.
///
/// `"it_IT.UTF-8@euro"` becomes `"it_IT"`. Returns `None` for the
/// `C`/`POSIX` locales and for empty values.
#[must_use]
pub fn normalize_system_locale(value: &str) -> Option<String> {
    let base = value
        .trim()
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base.eq_ignore_ascii_case("c") || base.eq_ignore_ascii_case("posix") {
        return None;
    }
    Some(base.to_string())
}

/// Pick the registered language matching the system locale.
///
/// Reads [`LOCALE_ENV_VARS`] through `get_env`. The first variable that is
/// set and non-empty decides, as in POSIX; when it names `C` or `POSIX`
/// there is no system language. Matching tries the exact tag first (ASCII
/// case-insensitive, `-` and `_` treated alike), then the primary subtag.
pub fn detect_language<'a, F, I>(get_env: F, available: I) -> Option<LanguageId>
where
    F: Fn(&str) -> Option<String>,
    I: IntoIterator<Item = &'a LanguageId>,
{
    let value = LOCALE_ENV_VARS
        .iter()
        .filter_map(|var| get_env(var))
        .find(|value| !value.trim().is_empty())?;
    let system = normalize_system_locale(&value)?;
    match_language(&system, available)
}

/// Match a locale tag against a set of registered languages.
pub fn match_language<'a, I>(tag: &str, available: I) -> Option<LanguageId>
where
    I: IntoIterator<Item = &'a LanguageId>,
{
    let wanted = canonical(tag);
    let wanted_primary = primary_subtag(tag);
    let mut by_primary = None;
    for language in available {
        if canonical(language.as_str()) == wanted {
            return Some(language.clone());
        }
        if by_primary.is_none() && language.primary() == wanted_primary {
            by_primary = Some(language.clone());
        }
    }
    by_primary
}

fn canonical(tag: &str) -> String {
    tag.trim().replace('-', "_").to_ascii_lowercase()
}

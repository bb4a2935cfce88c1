//! Translation resources compiled into the crate.

use crate::locale::LanguageId;

/// English resource (`translations/app_en.ts`).
pub const APP_EN: &str = include_str!("../translations/app_en.ts");

/// Italian resource (`translations/app_it.ts`).
pub const APP_IT: &str = include_str!("../translations/app_it.ts");

/// `(language tag, source label, document)` for every bundled resource.
pub const RESOURCES: &[(&str, &str, &str)] = &[
    ("en", "bundled:app_en.ts", APP_EN),
    ("it", "bundled:app_it.ts", APP_IT),
];

/// Tag of the bundled fallback language.
pub const DEFAULT_LANGUAGE: &str = "en";

/// The bundled fallback language.
#[must_use]
pub fn default_language() -> LanguageId {
    LanguageId::from_static(DEFAULT_LANGUAGE)
}

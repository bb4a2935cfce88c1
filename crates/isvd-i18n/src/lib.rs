#![forbid(unsafe_code)]

//! Internationalization for ImageS-VD.
//!
//! Loads Qt Linguist (`.ts`) translation resources into per-language
//! message catalogs, resolves `(context, key)` pairs in the active language
//! with a single fallback to the default language, and fills `{name}`
//! placeholders with runtime values.
//!
//! ```
//! use isvd_i18n::{args, CatalogRegistry, Localizer};
//!
//! let localizer = Localizer::new(CatalogRegistry::bundled());
//! let text = localizer.resolve("Cli", "values", &args! { values = 5, max = 3 }).unwrap();
//! assert!(text.contains('5') && text.contains('3'));
//! ```

pub mod bundled;
pub mod catalog;
pub mod config;
pub mod error;
pub mod format;
pub mod locale;
pub mod localizer;
pub mod registry;
pub mod ts;

pub use catalog::{MessageCatalog, MessageId, ResourceEntry};
pub use config::{LocalizerConfig, TranslationSource};
pub use error::{I18nError, Result, SyntaxProblem};
pub use format::{Args, Formatter, NumberFormat, Template, Value};
pub use locale::LanguageId;
pub use localizer::{LanguageChange, Localizer, Lookup, global, install_global};
pub use registry::{
    AuditReport, CatalogRegistry, CoverageReport, LanguageCoverage, LoadIssue, LoadWarning,
    RegistryBuilder,
};
pub use ts::{ParseWarning, ParseWarningKind, ParsedResource};

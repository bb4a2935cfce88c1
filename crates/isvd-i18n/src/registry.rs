//! Catalog registry: one [`MessageCatalog`] per language.
//!
//! # Invariants
//!
//! 1. **Built once**: a [`CatalogRegistry`] is produced by
//!    [`RegistryBuilder::build`] and has no mutating methods. It is
//!    `Send + Sync` and is shared by reference (usually behind an `Arc`).
//!
//! 2. **Registration id is authoritative**: resources are filed under the
//!    [`LanguageId`] supplied by the caller (or derived from the file name),
//!    never under the document's own `language` attribute. Disagreement is
//!    reported as a [`LoadIssue::DeclaredLanguage`] warning.
//!
//! 3. **Loading never fails**: unreadable files and directories, malformed
//!    records and duplicates all become [`LoadWarning`]s.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Unreadable directory | Missing path, permissions | `Unreadable` warning, nothing registered |
//! | Unreadable file | I/O error | `Unreadable` warning, file skipped |
//! | Bad record | See [`crate::ts`] | `Parse` warning, record skipped |
//! | Default language absent | No resource for it | Fallback lookups miss; logged at build |

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::bundled;
use crate::catalog::{MessageCatalog, MessageId, ResourceEntry};
use crate::error::{I18nError, Result};
use crate::format::Template;
use crate::locale::{LanguageId, primary_subtag};
use crate::ts::{self, ParseWarning};

/// File extension of Qt Linguist sources.
pub const TS_EXTENSION: &str = "ts";

/// Default file-name prefix (`app_en.ts`, `app_it.ts`).
pub const DEFAULT_PREFIX: &str = "app";

/// A problem encountered while loading resources into a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LoadWarning {
    /// Where the resource came from (a path or a caller-supplied label).
    pub source: String,
    /// Language the resource was registered under, when known.
    pub language: Option<LanguageId>,
    /// What went wrong.
    pub issue: LoadIssue,
}

/// Classification of a [`LoadWarning`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LoadIssue {
    /// A record-level or document-level parse problem.
    Parse(ParseWarning),
    /// The document declares a different language than it was registered as.
    DeclaredLanguage {
        /// Value of the `TS` root's `language` attribute.
        declared: String,
    },
    /// The file or directory could not be read.
    Unreadable {
        /// I/O error text.
        error: String,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)?;
        if let Some(language) = &self.language {
            write!(f, " [{language}]")?;
        }
        match &self.issue {
            LoadIssue::Parse(warning) => write!(f, ": {warning}"),
            LoadIssue::DeclaredLanguage { declared } => {
                write!(f, ": document declares language '{declared}'")
            }
            LoadIssue::Unreadable { error } => write!(f, ": unreadable: {error}"),
        }
    }
}

/// Accumulates resources, then freezes them into a [`CatalogRegistry`].
///
/// Several resources for the same language are merged in the order they
/// were added; later ones win on conflicting keys.
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
    default_language: LanguageId,
    entries: BTreeMap<LanguageId, Vec<ResourceEntry>>,
    warnings: Vec<LoadWarning>,
}

impl RegistryBuilder {
    /// Start a registry whose fallback language is `default_language`.
    #[must_use]
    pub fn new(default_language: LanguageId) -> Self {
        Self {
            default_language,
            entries: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Register the English and Italian resources shipped with the crate.
    #[must_use]
    pub fn with_bundled(mut self) -> Self {
        for (tag, label, text) in bundled::RESOURCES {
            match LanguageId::new(tag) {
                Ok(language) => {
                    self.add_resource(language, *label, text.as_bytes());
                }
                Err(err) => warn!(%err, "skipping bundled resource"),
            }
        }
        self
    }

    /// Parse and register one resource under `language`.
    pub fn add_resource(
        &mut self,
        language: LanguageId,
        source: impl Into<String>,
        bytes: &[u8],
    ) -> &mut Self {
        let source = source.into();
        let parsed = ts::parse(bytes);

        if let Some(declared) = parsed.declared_language.as_deref() {
            if primary_subtag(declared) != language.primary() {
                self.warn(LoadWarning {
                    source: source.clone(),
                    language: Some(language.clone()),
                    issue: LoadIssue::DeclaredLanguage {
                        declared: declared.to_string(),
                    },
                });
            }
        }
        for warning in parsed.warnings {
            self.warn(LoadWarning {
                source: source.clone(),
                language: Some(language.clone()),
                issue: LoadIssue::Parse(warning),
            });
        }
        self.add_entries(language, parsed.entries)
    }

    /// Register already-parsed entries under `language`.
    pub fn add_entries<I>(&mut self, language: LanguageId, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = ResourceEntry>,
    {
        self.entries.entry(language).or_default().extend(entries);
        self
    }

    /// Read and register one file.
    pub fn load_file(&mut self, language: LanguageId, path: &Path) -> &mut Self {
        match std::fs::read(path) {
            Ok(bytes) => self.add_resource(language, path.display().to_string(), &bytes),
            Err(err) => {
                self.warn(LoadWarning {
                    source: path.display().to_string(),
                    language: Some(language),
                    issue: LoadIssue::Unreadable {
                        error: err.to_string(),
                    },
                });
                self
            }
        }
    }

    /// Discover and register every `<prefix>_<language>.ts` file in `dir`.
    pub fn load_dir(&mut self, dir: &Path, prefix: &str) -> &mut Self {
        match discover(dir, prefix) {
            Ok(found) => {
                for (language, path) in found {
                    self.load_file(language, &path);
                }
            }
            Err(err) => self.warn(LoadWarning {
                source: dir.display().to_string(),
                language: None,
                issue: LoadIssue::Unreadable {
                    error: err.to_string(),
                },
            }),
        }
        self
    }

    /// Warnings collected so far.
    #[must_use]
    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    /// Freeze into an immutable registry.
    #[must_use]
    pub fn build(self) -> CatalogRegistry {
        let catalogs: BTreeMap<LanguageId, MessageCatalog> = self
            .entries
            .into_iter()
            .map(|(language, entries)| (language, MessageCatalog::build(entries)))
            .collect();

        if !catalogs.contains_key(&self.default_language) {
            warn!(
                default_language = %self.default_language,
                "default language has no catalog; fallback lookups will miss"
            );
        }
        info!(
            languages = catalogs.len(),
            messages = catalogs.values().map(MessageCatalog::len).sum::<usize>(),
            warnings = self.warnings.len(),
            "catalog registry built"
        );

        CatalogRegistry {
            catalogs,
            default_language: self.default_language,
            warnings: self.warnings,
        }
    }

    fn warn(&mut self, warning: LoadWarning) {
        warn!(%warning, "translation resource problem");
        self.warnings.push(warning);
    }
}

/// Find `<prefix>_<language>.ts` files in `dir`, sorted by path.
///
/// Files with other extensions, other prefixes, or an unusable language
/// suffix are ignored.
pub fn discover(dir: &Path, prefix: &str) -> std::io::Result<Vec<(LanguageId, PathBuf)>> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(TS_EXTENSION) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let Some(tag) = stem
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('_'))
        else {
            continue;
        };
        if let Ok(language) = LanguageId::new(tag) {
            found.push((language, path));
        }
    }
    found.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(found)
}

/// Immutable set of catalogs keyed by language.
#[derive(Debug, Clone)]
pub struct CatalogRegistry {
    catalogs: BTreeMap<LanguageId, MessageCatalog>,
    default_language: LanguageId,
    warnings: Vec<LoadWarning>,
}

impl CatalogRegistry {
    /// Start building a registry.
    #[must_use]
    pub fn builder(default_language: LanguageId) -> RegistryBuilder {
        RegistryBuilder::new(default_language)
    }

    /// Registry of the bundled English and Italian resources, English fallback.
    #[must_use]
    pub fn bundled() -> Self {
        RegistryBuilder::new(bundled::default_language())
            .with_bundled()
            .build()
    }

    /// The fallback language.
    #[must_use]
    pub fn default_language(&self) -> &LanguageId {
        &self.default_language
    }

    /// Catalog for `language`.
    #[must_use]
    pub fn catalog(&self, language: &LanguageId) -> Option<&MessageCatalog> {
        self.catalogs.get(language)
    }

    /// Whether `language` has a catalog.
    #[must_use]
    pub fn contains(&self, language: &LanguageId) -> bool {
        self.catalogs.contains_key(language)
    }

    /// Resolve a tag to a registered language, or fail with `UnsupportedLanguage`.
    pub fn language(&self, tag: &str) -> Result<LanguageId> {
        let language = LanguageId::new(tag)?;
        if self.contains(&language) {
            Ok(language)
        } else {
            Err(I18nError::UnsupportedLanguage { language })
        }
    }

    /// Registered languages, sorted.
    pub fn languages(&self) -> impl Iterator<Item = &LanguageId> {
        self.catalogs.keys()
    }

    /// Warnings collected while loading.
    #[must_use]
    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    // -----------------------------------------------------------------
    // Coverage & Audit
    // -----------------------------------------------------------------

    /// Every message id defined by at least one language, sorted.
    #[must_use]
    pub fn all_ids(&self) -> Vec<MessageId> {
        let ids: BTreeSet<MessageId> = self.catalogs.values().flat_map(MessageCatalog::ids).collect();
        ids.into_iter().collect()
    }

    /// Coverage of every language against the union of all ids.
    ///
    /// Ids a language lacks but the default language provides are listed
    /// under `fallback` rather than `missing`.
    #[must_use]
    pub fn coverage_report(&self) -> CoverageReport {
        let all = self.all_ids();
        let total = all.len();
        let default = self.catalogs.get(&self.default_language);

        let languages = self
            .catalogs
            .iter()
            .map(|(language, catalog)| {
                let mut fallback = Vec::new();
                let mut missing = Vec::new();
                for id in &all {
                    if catalog.contains(&id.context, &id.key) {
                        continue;
                    }
                    if default.is_some_and(|d| d.contains(&id.context, &id.key)) {
                        fallback.push(id.clone());
                    } else {
                        missing.push(id.clone());
                    }
                }
                let present = total - fallback.len() - missing.len();
                let coverage_percent = if total == 0 {
                    100.0
                } else {
                    (present as f32 / total as f32) * 100.0
                };
                LanguageCoverage {
                    language: language.clone(),
                    present,
                    fallback,
                    missing,
                    coverage_percent,
                }
            })
            .collect();

        CoverageReport {
            total_messages: total,
            languages,
        }
    }

    /// Check every template's syntax and compare placeholder sets with the
    /// default language.
    #[must_use]
    pub fn audit(&self) -> AuditReport {
        let mut report = AuditReport::default();
        let default = self.catalogs.get(&self.default_language);

        for (language, catalog) in &self.catalogs {
            for id in catalog.ids() {
                let Some(template) = catalog.lookup(&id.context, &id.key) else {
                    continue;
                };
                let found = match Template::parse(template) {
                    Ok(parsed) => placeholder_set(&parsed),
                    Err(error) => {
                        report.template_errors.push(TemplateError {
                            language: language.clone(),
                            id,
                            error,
                        });
                        continue;
                    }
                };
                if language == &self.default_language {
                    continue;
                }
                let expected = default
                    .and_then(|d| d.lookup(&id.context, &id.key))
                    .and_then(|t| Template::parse(t).ok())
                    .map(|t| placeholder_set(&t));
                if let Some(expected) = expected {
                    if expected != found {
                        report.placeholder_mismatches.push(PlaceholderMismatch {
                            language: language.clone(),
                            id,
                            expected,
                            found,
                        });
                    }
                }
            }
        }
        report
    }
}

fn placeholder_set(template: &Template<'_>) -> BTreeSet<String> {
    template
        .placeholders()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Coverage report for a registry.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CoverageReport {
    /// Number of distinct `(context, key)` ids across all languages.
    pub total_messages: usize,
    /// Per-language coverage, sorted by language.
    pub languages: Vec<LanguageCoverage>,
}

/// Per-language coverage statistics.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LanguageCoverage {
    /// Language.
    pub language: LanguageId,
    /// Ids the language defines itself.
    pub present: usize,
    /// Ids served by the default language instead.
    pub fallback: Vec<MessageId>,
    /// Ids that resolve to the bare key.
    pub missing: Vec<MessageId>,
    /// `present` as a percentage of all ids (0.0–100.0).
    pub coverage_percent: f32,
}

/// Template problems across a registry.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AuditReport {
    /// Templates that fail to parse.
    pub template_errors: Vec<TemplateError>,
    /// Templates whose placeholders differ from the default language.
    pub placeholder_mismatches: Vec<PlaceholderMismatch>,
}

impl AuditReport {
    /// Whether nothing was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.template_errors.is_empty() && self.placeholder_mismatches.is_empty()
    }
}

/// A template that fails to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateError {
    /// Language of the template.
    pub language: LanguageId,
    /// Message id.
    pub id: MessageId,
    /// Parse failure.
    pub error: I18nError,
}

#[cfg(feature = "serde")]
impl serde::Serialize for TemplateError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("TemplateError", 3)?;
        state.serialize_field("language", &self.language)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("error", &self.error.to_string())?;
        state.end()
    }
}

/// Placeholder names that differ between a translation and the default language.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PlaceholderMismatch {
    /// Language of the translation.
    pub language: LanguageId,
    /// Message id.
    pub id: MessageId,
    /// Names used by the default language.
    pub expected: BTreeSet<String>,
    /// Names used by the translation.
    pub found: BTreeSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyntaxProblem;

    fn lang(tag: &str) -> LanguageId {
        LanguageId::new(tag).unwrap()
    }

    fn ts(language: &str, body: &str) -> String {
        format!("<TS version=\"2.1\" language=\"{language}\">{body}</TS>")
    }

    fn multi_language_registry() -> CatalogRegistry {
        let mut builder = CatalogRegistry::builder(lang("en"));
        builder
            .add_entries(
                lang("en"),
                [
                    ResourceEntry::new("Gui", "open", "Open"),
                    ResourceEntry::new("Gui", "save", "Save"),
                    ResourceEntry::new("Cli", "ratio", "Compression ratio:\t{ratio}"),
                ],
            )
            .add_entries(
                lang("it"),
                [
                    ResourceEntry::new("Gui", "open", "Apri"),
                    ResourceEntry::new("Gui", "info", "Informazione"),
                    ResourceEntry::new("Cli", "ratio", "Rapporto: {rapporto}"),
                ],
            )
            .add_entries(lang("fr"), [ResourceEntry::new("Gui", "open", "Ouvrir {")]);
        builder.build()
    }

    #[test]
    fn resources_for_one_language_merge_in_order() {
        let mut builder = CatalogRegistry::builder(lang("en"));
        builder
            .add_entries(lang("en"), [ResourceEntry::new("Gui", "open", "Open")])
            .add_entries(
                lang("en"),
                [
                    ResourceEntry::new("Gui", "open", "Open..."),
                    ResourceEntry::new("Gui", "exit", "Exit"),
                ],
            );
        let registry = builder.build();
        let en = registry.catalog(&lang("en")).unwrap();
        assert_eq!(en.lookup("Gui", "open"), Some("Open..."));
        assert_eq!(en.len(), 2);
    }

    #[test]
    fn declared_language_mismatch_is_a_warning() {
        let mut builder = CatalogRegistry::builder(lang("en"));
        let doc = ts(
            "en_US",
            "<context><name>Gui</name><message><source>open</source>\
             <translation>Apri</translation></message></context>",
        );
        builder.add_resource(lang("it"), "app_it.ts", doc.as_bytes());
        let registry = builder.build();

        assert_eq!(
            registry.catalog(&lang("it")).unwrap().lookup("Gui", "open"),
            Some("Apri")
        );
        assert_eq!(
            registry.warnings(),
            &[LoadWarning {
                source: "app_it.ts".into(),
                language: Some(lang("it")),
                issue: LoadIssue::DeclaredLanguage {
                    declared: "en_US".into()
                },
            }]
        );
    }

    #[test]
    fn matching_declared_language_is_silent() {
        let mut builder = CatalogRegistry::builder(lang("en"));
        builder.add_resource(lang("en"), "app_en.ts", ts("en_US", "").as_bytes());
        assert!(builder.warnings().is_empty());
    }

    #[test]
    fn parse_warnings_carry_their_source() {
        let mut builder = CatalogRegistry::builder(lang("en"));
        let doc = ts("en", "<context><name>Cli</name><message><source>bad</source></message></context>");
        builder.add_resource(lang("en"), "broken.ts", doc.as_bytes());
        let warning = &builder.warnings()[0];
        assert_eq!(warning.source, "broken.ts");
        assert!(matches!(warning.issue, LoadIssue::Parse(_)));
        assert_eq!(
            warning.to_string(),
            "broken.ts [en]: message has no translation (message #1, Cli.bad)"
        );
    }

    #[test]
    fn language_lookup_validates() {
        let registry = multi_language_registry();
        assert_eq!(registry.language("it").unwrap(), lang("it"));
        assert_eq!(
            registry.language("de"),
            Err(I18nError::UnsupportedLanguage { language: lang("de") })
        );
        assert!(matches!(
            registry.language(""),
            Err(I18nError::InvalidLanguageId(_))
        ));
        let tags: Vec<&str> = registry.languages().map(LanguageId::as_str).collect();
        assert_eq!(tags, vec!["en", "fr", "it"]);
    }

    #[test]
    fn coverage_distinguishes_fallback_from_missing() {
        let registry = multi_language_registry();
        let report = registry.coverage_report();
        assert_eq!(report.total_messages, 4);

        let en = &report.languages[0];
        assert_eq!(en.language, lang("en"));
        assert_eq!(en.present, 3);
        assert!(en.fallback.is_empty());
        assert_eq!(en.missing, vec![MessageId::new("Gui", "info")]);

        let it = &report.languages[2];
        assert_eq!(it.language, lang("it"));
        assert_eq!(it.present, 3);
        assert_eq!(it.fallback, vec![MessageId::new("Gui", "save")]);
        assert!(it.missing.is_empty());
        assert!((it.coverage_percent - 75.0).abs() < f32::EPSILON);
    }

    #[test]
    fn coverage_of_empty_registry() {
        let registry = CatalogRegistry::builder(lang("en")).build();
        let report = registry.coverage_report();
        assert_eq!(report.total_messages, 0);
        assert!(report.languages.is_empty());
    }

    #[test]
    fn audit_finds_syntax_errors_and_placeholder_drift() {
        let registry = multi_language_registry();
        let audit = registry.audit();
        assert!(!audit.is_clean());

        assert_eq!(audit.template_errors.len(), 1);
        let bad = &audit.template_errors[0];
        assert_eq!(bad.language, lang("fr"));
        assert_eq!(bad.id, MessageId::new("Gui", "open"));
        assert_eq!(
            bad.error,
            I18nError::UnknownPlaceholderSyntax {
                offset: 7,
                problem: SyntaxProblem::Unclosed
            }
        );

        assert_eq!(audit.placeholder_mismatches.len(), 1);
        let drift = &audit.placeholder_mismatches[0];
        assert_eq!(drift.language, lang("it"));
        assert_eq!(drift.id, MessageId::new("Cli", "ratio"));
        assert!(drift.expected.contains("ratio"));
        assert!(drift.found.contains("rapporto"));
    }

    #[test]
    fn bundled_registry_loads_both_languages() {
        let registry = CatalogRegistry::bundled();
        let tags: Vec<&str> = registry.languages().map(LanguageId::as_str).collect();
        assert_eq!(tags, vec!["en", "it"]);
        assert_eq!(registry.default_language(), &lang("en"));
        assert!(registry.audit().is_clean());
    }
}

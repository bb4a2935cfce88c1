//! Per-language message catalogs.
//!
//! # Invariants
//!
//! 1. **Last write wins**: building is a fold over entries in order; a later
//!    entry for the same `(context, key)` replaces the earlier template.
//!
//! 2. **Immutable after build**: `MessageCatalog` exposes no mutation, so it
//!    is `Send + Sync` and safe to share across threads without locking.

use std::collections::HashMap;
use std::fmt;

/// One raw `(context, key, template)` record from a resource, before indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    /// Context name (e.g. `"Cli"`).
    pub context: String,
    /// Message key, unique within the context.
    pub key: String,
    /// Translated template with `{name}` placeholders.
    pub template: String,
}

impl ResourceEntry {
    /// Create an entry.
    pub fn new(
        context: impl Into<String>,
        key: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            context: context.into(),
            key: key.into(),
            template: template.into(),
        }
    }
}

/// A `(context, key)` pair identifying one message across languages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MessageId {
    /// Context name.
    pub context: String,
    /// Key within the context.
    pub key: String,
}

impl MessageId {
    /// Create a message id.
    pub fn new(context: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.context, self.key)
    }
}

/// Immutable index of templates for one language: context → key → template.
///
/// # Example
///
/// ```
/// use isvd_i18n::catalog::{MessageCatalog, ResourceEntry};
///
/// let catalog = MessageCatalog::build([
///     ResourceEntry::new("Gui", "open", "Open"),
///     ResourceEntry::new("Gui", "open", "Open..."),
///     ResourceEntry::new("Cli", "ratio", "Compression ratio:\t{ratio}"),
/// ]);
///
/// assert_eq!(catalog.lookup("Gui", "open"), Some("Open..."));
/// assert_eq!(catalog.lookup("Cli", "open"), None);
/// assert_eq!(catalog.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    contexts: HashMap<String, HashMap<String, String>>,
}

impl MessageCatalog {
    /// Index entries in order; later entries overwrite earlier ones.
    #[must_use]
    pub fn build<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = ResourceEntry>,
    {
        let mut contexts: HashMap<String, HashMap<String, String>> = HashMap::new();
        for entry in entries {
            contexts
                .entry(entry.context)
                .or_default()
                .insert(entry.key, entry.template);
        }
        Self { contexts }
    }

    /// Template for `(context, key)`, if this language defines one.
    #[must_use]
    pub fn lookup(&self, context: &str, key: &str) -> Option<&str> {
        self.contexts
            .get(context)
            .and_then(|keys| keys.get(key))
            .map(String::as_str)
    }

    /// Whether `(context, key)` is defined.
    #[must_use]
    pub fn contains(&self, context: &str, key: &str) -> bool {
        self.lookup(context, key).is_some()
    }

    /// Number of messages across all contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.values().map(HashMap::len).sum()
    }

    /// Whether the catalog has no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Context names, sorted.
    #[must_use]
    pub fn contexts(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.contexts.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// All message ids, sorted by context then key.
    #[must_use]
    pub fn ids(&self) -> Vec<MessageId> {
        let mut ids: Vec<MessageId> = self
            .iter()
            .map(|(context, key, _)| MessageId::new(context, key))
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over `(context, key, template)` in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.contexts.iter().flat_map(|(context, keys)| {
            keys.iter()
                .map(move |(key, template)| (context.as_str(), key.as_str(), template.as_str()))
        })
    }
}

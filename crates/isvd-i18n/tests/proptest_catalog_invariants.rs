//! Property-based invariant tests for parsing, indexing, and formatting.
//!
//! 1. Indexing keeps the last template for every `(context, key)`.
//! 2. Every malformed record, including one with a bad entity, costs
//!    exactly one warning and no entry; the well-formed records around it
//!    survive.
//! 3. Substituted values are never rescanned for placeholders.
//! 4. Resolving the same message twice gives the same text.
//! 5. Formatting arbitrary templates never panics.
//! 6. Brace-free templates render unchanged.

use std::collections::HashMap;

use isvd_i18n::{
    Args, CatalogRegistry, Formatter, I18nError, LanguageId, Localizer, MessageCatalog,
    NumberFormat, ResourceEntry, Value, ts,
};
use proptest::prelude::*;

// ── Strategies ────────────────────────────────────────────────────────────

fn entries_strategy() -> impl Strategy<Value = Vec<ResourceEntry>> {
    proptest::collection::vec(
        (0usize..3, 0usize..5, "[A-Za-z ]{0,12}"),
        0..40,
    )
    .prop_map(|records| {
        records
            .into_iter()
            .map(|(c, k, template)| ResourceEntry::new(format!("Ctx{c}"), format!("key{k}"), template))
            .collect()
    })
}

#[derive(Debug, Clone)]
enum Record {
    Good(String),
    NoSource,
    NoTranslation,
    EmptyTranslation,
    Obsolete(String),
    BadEntity(&'static str),
}

fn record_strategy() -> impl Strategy<Value = Record> {
    let text = "[A-Za-z][A-Za-z ]{0,15}";
    prop_oneof![
        3 => text.prop_map(Record::Good),
        1 => Just(Record::NoSource),
        1 => Just(Record::NoTranslation),
        1 => Just(Record::EmptyTranslation),
        1 => text.prop_map(Record::Obsolete),
        1 => prop::sample::select(vec!["Tom &amp Jerry", "a&nbsp;b", "R&D", "&#xZZ;"])
            .prop_map(Record::BadEntity),
    ]
}

fn render_record(index: usize, record: &Record) -> String {
    match record {
        Record::Good(text) => format!(
            "<message><source>k{index}</source><translation>{text}</translation></message>"
        ),
        Record::NoSource => "<message><translation>orphan</translation></message>".to_string(),
        Record::NoTranslation => format!("<message><source>k{index}</source></message>"),
        Record::EmptyTranslation => format!(
            "<message><source>k{index}</source><translation type=\"unfinished\"></translation></message>"
        ),
        Record::BadEntity(text) => format!(
            "<message><source>k{index}</source><translation>{text}</translation></message>"
        ),
        Record::Obsolete(text) => format!(
            "<message><source>k{index}</source>\
             <translation type=\"obsolete\">{text}</translation></message>"
        ),
    }
}

fn text_value_strategy() -> impl Strategy<Value = String> {
    "[{}a-z0-9 ]{0,20}"
}

// ── Indexing ──────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn last_entry_wins(entries in entries_strategy()) {
        let mut expected: HashMap<(String, String), String> = HashMap::new();
        for entry in &entries {
            expected.insert((entry.context.clone(), entry.key.clone()), entry.template.clone());
        }
        let catalog = MessageCatalog::build(entries);
        prop_assert_eq!(catalog.len(), expected.len());
        for ((context, key), template) in &expected {
            prop_assert_eq!(catalog.lookup(context, key), Some(template.as_str()));
        }
    }

    #[test]
    fn malformed_records_cost_one_warning_each(records in proptest::collection::vec(record_strategy(), 0..30)) {
        let body: String = records
            .iter()
            .enumerate()
            .map(|(i, r)| render_record(i, r))
            .collect();
        let doc = format!("<TS version=\"2.1\"><context><name>Gui</name>{body}</context></TS>");
        let parsed = ts::parse_str(&doc);

        let good: Vec<(String, &str)> = records
            .iter()
            .enumerate()
            .filter_map(|(i, r)| match r {
                Record::Good(text) => Some((format!("k{i}"), text.as_str())),
                _ => None,
            })
            .collect();
        prop_assert_eq!(parsed.entries.len(), good.len());
        prop_assert_eq!(parsed.warnings.len(), records.len() - good.len());
        for (entry, (key, text)) in parsed.entries.iter().zip(&good) {
            prop_assert_eq!(&entry.context, "Gui");
            prop_assert_eq!(&entry.key, key);
            prop_assert_eq!(entry.template.as_str(), *text);
        }
    }
}

// ── Formatting ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn values_are_not_rescanned(value in text_value_strategy(), other in text_value_strategy()) {
        let formatter = Formatter::default();
        let args = Args::new().with("x", value.clone()).with("max", other);
        let out = formatter.format("a{x}b", &args).unwrap();
        prop_assert_eq!(out, format!("a{value}b"));
    }

    #[test]
    fn format_never_panics(template in "\\PC{0,40}", n in any::<i64>(), x in any::<f64>()) {
        let formatter = Formatter::new(NumberFormat::fixed(3));
        let args = Args::new().with("n", n).with("x", Value::Float(x)).with("name", "text");
        match formatter.format(&template, &args) {
            Ok(_) => {}
            Err(I18nError::MissingPlaceholder { .. } | I18nError::UnknownPlaceholderSyntax { .. }) => {}
            Err(other) => prop_assert!(false, "unexpected error {other:?}"),
        }
    }

    #[test]
    fn brace_free_templates_render_unchanged(template in "[^{}]{0,40}") {
        let out = Formatter::default().format(&template, &Args::new()).unwrap();
        prop_assert_eq!(out, template);
    }

    #[test]
    fn escaped_braces_render_single(inner in "[a-z]{0,10}") {
        let template = format!("{{{{{inner}}}}}");
        let out = Formatter::default().format(&template, &Args::new()).unwrap();
        prop_assert_eq!(out, format!("{{{inner}}}"));
    }
}

// ── Resolution ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn resolve_is_idempotent(
        language in prop::sample::select(vec!["en", "it"]),
        context in prop::sample::select(vec!["Cli", "Gui", "Missing"]),
        key in prop::sample::select(vec!["values", "ratio", "open", "info", "parse", "unknown"]),
        values in any::<u32>(),
        ratio in 0.0f64..1.0,
    ) {
        let localizer = Localizer::with_language(CatalogRegistry::bundled(), language).unwrap();
        let args = Args::new()
            .with("values", values)
            .with("max", 3)
            .with("ratio", ratio)
            .with("value", "v");
        let first = localizer.resolve(context, key, &args).unwrap();
        let second = localizer.resolve(context, key, &args).unwrap();
        prop_assert_eq!(&first, &second);
        if context == "Missing" || key == "unknown" {
            prop_assert_eq!(first, key);
        }
        prop_assert_eq!(localizer.active_language(), LanguageId::new(language).unwrap());
    }
}

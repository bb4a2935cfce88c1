//! End-to-end resolution against the English and Italian resources shipped
//! with the crate.

use std::sync::Arc;

use isvd_i18n::{
    Args, CatalogRegistry, I18nError, LanguageId, LoadIssue, LoadWarning, Localizer,
    LocalizerConfig, Lookup, NumberFormat, RegistryBuilder, args,
};

fn lang(tag: &str) -> LanguageId {
    LanguageId::new(tag).unwrap()
}

fn italian_default_registry() -> CatalogRegistry {
    RegistryBuilder::new(lang("it")).with_bundled().build()
}

#[test]
fn bundled_resources_load_with_declared_language_warning() {
    let registry = CatalogRegistry::bundled();
    // The shipped Italian document still carries the English language
    // attribute; it is filed as `it` and the mismatch is reported.
    assert_eq!(
        registry.warnings(),
        &[LoadWarning {
            source: "bundled:app_it.ts".into(),
            language: Some(lang("it")),
            issue: LoadIssue::DeclaredLanguage {
                declared: "en_US".into()
            },
        }]
    );
    assert_eq!(registry.catalog(&lang("en")).unwrap().len(), 13);
    assert_eq!(registry.catalog(&lang("it")).unwrap().len(), 15);
}

#[test]
fn italian_values_message() {
    let localizer = Localizer::with_language(CatalogRegistry::bundled(), "it").unwrap();
    let text = localizer
        .resolve("Cli", "values", &args! { values = 5, max = 3 })
        .unwrap();
    assert_eq!(text, "Impossibile usare 5 valori per un massimo 3 valori");
    assert!(!text.contains('{') && !text.contains('}'));
}

#[test]
fn english_values_message() {
    let localizer = Localizer::new(CatalogRegistry::bundled());
    let text = localizer
        .resolve("Cli", "values", &args! { values = 5, max = 3 })
        .unwrap();
    assert_eq!(text, "Cannot use 5 values for a max of 3 values");
}

#[test]
fn character_references_are_decoded() {
    let localizer = Localizer::new(CatalogRegistry::bundled());
    assert_eq!(
        localizer.resolve("Cli", "ratio", &args! { ratio = 0.5 }).unwrap(),
        "Compression ratio:\t0.5"
    );
    localizer.set_active_language("it").unwrap();
    assert_eq!(
        localizer.resolve("Gui", "reboot", &Args::new()).unwrap(),
        "Riavviare l'applicazione per applicare le modifiche."
    );
}

#[test]
fn text_values_are_inserted_verbatim() {
    let localizer = Localizer::with_language(CatalogRegistry::bundled(), "it").unwrap();
    assert_eq!(
        localizer.resolve("Gui", "parse", &args! { value = "{k}" }).unwrap(),
        "Impossibile convertire '{k}' in int"
    );
}

#[test]
fn english_falls_back_to_italian_default() {
    let localizer = Localizer::with_language(italian_default_registry(), "en").unwrap();
    assert_eq!(localizer.lookup("Gui", "info"), Lookup::Fallback("Informazione"));
    assert_eq!(localizer.resolve("Gui", "info", &Args::new()).unwrap(), "Informazione");
    // English's own message still wins.
    assert_eq!(localizer.resolve("Gui", "open", &Args::new()).unwrap(), "Open");
}

#[test]
fn english_default_does_not_borrow_italian_only_keys() {
    let localizer = Localizer::new(CatalogRegistry::bundled());
    assert_eq!(localizer.lookup("Gui", "info"), Lookup::Missing);
    assert_eq!(localizer.resolve("Gui", "info", &Args::new()).unwrap(), "info");
}

#[test]
fn missing_key_returns_key_in_every_language() {
    let localizer = Localizer::new(CatalogRegistry::bundled());
    for tag in ["en", "it"] {
        localizer.set_active_language(tag).unwrap();
        assert_eq!(
            localizer.resolve("Gui", "doesNotExist", &Args::new()).unwrap(),
            "doesNotExist"
        );
        assert_eq!(
            localizer.resolve("NoSuchContext", "open", &Args::new()).unwrap(),
            "open"
        );
    }
}

#[test]
fn unsupported_language_keeps_previous() {
    let localizer = Localizer::with_language(CatalogRegistry::bundled(), "it").unwrap();
    let err = localizer.set_active_language("fr").unwrap_err();
    assert_eq!(err, I18nError::UnsupportedLanguage { language: lang("fr") });
    assert_eq!(err.to_string(), "unsupported language: fr");
    assert_eq!(localizer.active_language(), lang("it"));
    assert_eq!(localizer.resolve("Gui", "open", &Args::new()).unwrap(), "Apri");
}

#[test]
fn missing_argument_is_an_error() {
    let localizer = Localizer::new(CatalogRegistry::bundled());
    let err = localizer
        .resolve("Cli", "values", &args! { values = 5 })
        .unwrap_err();
    assert_eq!(err, I18nError::MissingPlaceholder { name: "max".into() });
}

#[test]
fn extra_arguments_are_ignored() {
    let localizer = Localizer::new(CatalogRegistry::bundled());
    assert_eq!(
        localizer
            .resolve("Cli", "bad", &args! { unused = 1, other = "x" })
            .unwrap(),
        "Bad arguments"
    );
}

#[test]
fn fixed_precision_number_policy() {
    let localizer =
        Localizer::new(CatalogRegistry::bundled()).with_number_format(NumberFormat::fixed(2));
    assert_eq!(
        localizer.resolve("Cli", "ratio", &args! { ratio = 0.4567 }).unwrap(),
        "Compression ratio:\t0.46"
    );
    // Integers are never affected by the float precision.
    assert_eq!(
        localizer.resolve("Cli", "unexpected_value", &args! { k = 7 }).unwrap(),
        "Unexpected k value:\t7"
    );
}

#[test]
fn shared_localizer_across_threads() {
    let localizer = Arc::new(Localizer::new(CatalogRegistry::bundled()));
    let workers: Vec<_> = (0..8)
        .map(|i| {
            let localizer = Arc::clone(&localizer);
            std::thread::spawn(move || {
                for _ in 0..100 {
                    if i == 0 {
                        localizer.set_active_language("it").unwrap();
                        localizer.set_active_language("en").unwrap();
                    }
                    let text = localizer.resolve("Gui", "save", &Args::new()).unwrap();
                    assert!(text == "Save" || text == "Salva", "unexpected {text:?}");
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
}

#[test]
fn config_selects_language_from_environment() {
    let env = |key: &str| match key {
        "ISVD_LANG" => Some("it".to_string()),
        "ISVD_NUMBER_PRECISION" => Some("1".to_string()),
        _ => None,
    };
    let config = LocalizerConfig::from_env(env);
    let localizer = Localizer::from_config(&config, |_| None).unwrap();
    assert_eq!(localizer.active_language(), lang("it"));
    assert_eq!(
        localizer.resolve("Gui", "compression", &args! { ratio = 0.42 }).unwrap(),
        "Rapporto di compressione: '0.4'"
    );
}

#[test]
fn bundled_coverage_and_audit() {
    let registry = CatalogRegistry::bundled();
    let report = registry.coverage_report();
    assert_eq!(report.total_messages, 15);

    let en = &report.languages[0];
    assert_eq!(en.language, lang("en"));
    assert_eq!(en.present, 13);
    assert_eq!(en.missing.len(), 2);

    let it = &report.languages[1];
    assert_eq!(it.present, 15);
    assert!(it.fallback.is_empty() && it.missing.is_empty());

    assert!(registry.audit().is_clean());
}

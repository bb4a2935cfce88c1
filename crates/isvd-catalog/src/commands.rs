//! Subcommand implementations. Output goes to the given writer; logs go to
//! stderr through `tracing`.

use std::io::Write;

use anyhow::Context as _;
use isvd_i18n::locale::match_language;
use isvd_i18n::{Args, CatalogRegistry, I18nError, LanguageId, Localizer, MessageId};
use tracing::debug;

use crate::cli::{Cli, Command};

/// Result of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to report.
    Clean,
    /// `check` found problems.
    Problems,
}

/// Run the parsed command.
pub fn run<F, W>(cli: &Cli, get_env: F, out: &mut W) -> anyhow::Result<Outcome>
where
    F: Fn(&str) -> Option<String>,
    W: Write,
{
    let config = cli.config(&get_env);
    debug!(?config, "effective configuration");

    match &cli.command {
        Command::Check { strict } => {
            let registry = config.build_registry()?;
            check(&registry, *strict, out)
        }
        Command::Coverage { json } => {
            let registry = config.build_registry()?;
            coverage(&registry, *json, out)?;
            Ok(Outcome::Clean)
        }
        Command::Languages => {
            let registry = config.build_registry()?;
            languages(&registry, out)?;
            Ok(Outcome::Clean)
        }
        Command::Resolve {
            lang,
            context,
            key,
            args,
            ..
        } => {
            let localizer = Localizer::from_config(&config, &get_env)?;
            if let Some(tag) = lang {
                // Surface an unknown language instead of silently falling back.
                let Some(language) = match_language(tag, localizer.registry().languages()) else {
                    let language = LanguageId::new(tag)?;
                    return Err(I18nError::UnsupportedLanguage { language }.into());
                };
                localizer.set_active_language(language.as_str())?;
            }
            let args: Args = args.iter().cloned().collect();
            let text = localizer
                .resolve(context, key, &args)
                .with_context(|| format!("cannot format {}", MessageId::new(context, key)))?;
            writeln!(out, "{text}")?;
            Ok(Outcome::Clean)
        }
    }
}

fn check<W: Write>(registry: &CatalogRegistry, strict: bool, out: &mut W) -> anyhow::Result<Outcome> {
    for warning in registry.warnings() {
        writeln!(out, "warning: {warning}")?;
    }
    let audit = registry.audit();
    for problem in &audit.template_errors {
        writeln!(out, "error: {} {}: {}", problem.language, problem.id, problem.error)?;
    }
    for drift in &audit.placeholder_mismatches {
        writeln!(
            out,
            "error: {} {}: placeholders {} differ from default {}",
            drift.language,
            drift.id,
            braced(&drift.found),
            braced(&drift.expected),
        )?;
    }

    let errors = audit.template_errors.len() + audit.placeholder_mismatches.len();
    let warnings = registry.warnings().len();
    writeln!(
        out,
        "{} languages, {} messages, {warnings} warnings, {errors} errors",
        registry.languages().count(),
        registry.all_ids().len(),
    )?;

    if errors > 0 || (strict && warnings > 0) {
        Ok(Outcome::Problems)
    } else {
        Ok(Outcome::Clean)
    }
}

fn braced<'a>(names: impl IntoIterator<Item = &'a String>) -> String {
    let names: Vec<String> = names.into_iter().map(|n| format!("{{{n}}}")).collect();
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(" ")
    }
}

fn coverage<W: Write>(registry: &CatalogRegistry, json: bool, out: &mut W) -> anyhow::Result<()> {
    let report = registry.coverage_report();
    if json {
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "{} messages", report.total_messages)?;
    for language in &report.languages {
        writeln!(
            out,
            "{:<8} {:>4}/{:<4} {:>5.1}%  fallback {}  missing {}",
            language.language.as_str(),
            language.present,
            report.total_messages,
            language.coverage_percent,
            language.fallback.len(),
            language.missing.len(),
        )?;
        for id in &language.missing {
            writeln!(out, "  missing  {id}")?;
        }
    }
    Ok(())
}

fn languages<W: Write>(registry: &CatalogRegistry, out: &mut W) -> anyhow::Result<()> {
    for language in registry.languages() {
        let messages = registry.catalog(language).map_or(0, |c| c.len());
        let marker = if language == registry.default_language() {
            " (default)"
        } else {
            ""
        };
        writeln!(out, "{language}{marker}\t{messages} messages")?;
    }
    Ok(())
}

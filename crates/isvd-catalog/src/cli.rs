//! Command-line surface.
//!
//! Settings are layered: built-in defaults, then `ISVD_*` environment
//! variables (see [`isvd_i18n::config`]), then flags.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use isvd_i18n::{LocalizerConfig, TranslationSource, Value};

/// Inspect, check, and query ImageS-VD translation catalogs.
#[derive(Debug, Parser)]
#[command(name = "isvd-catalog", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory of `<prefix>_<lang>.ts` files [default: bundled resources].
    #[arg(long, global = true, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Resource file-name prefix [default: app].
    #[arg(long, global = true)]
    pub prefix: Option<String>,

    /// Fallback language [default: en].
    #[arg(long = "default-lang", global = true, value_name = "LANG")]
    pub default_lang: Option<String>,

    /// Log at debug level (overrides ISVD_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Report load warnings and template problems; fails on problems.
    Check {
        /// Also fail on load warnings.
        #[arg(long)]
        strict: bool,
    },
    /// Show how completely each language is translated.
    Coverage {
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List registered languages.
    Languages,
    /// Resolve and format one message.
    Resolve {
        /// Language to resolve in [default: ISVD_LANG, then system locale].
        #[arg(long, value_name = "LANG")]
        lang: Option<String>,
        /// Fixed number of fractional digits for float arguments.
        #[arg(long)]
        precision: Option<usize>,
        /// Message context (e.g. Cli).
        context: String,
        /// Message key (e.g. values).
        key: String,
        /// Arguments as name=value.
        #[arg(value_name = "NAME=VALUE", value_parser = parse_assignment)]
        args: Vec<(String, Value)>,
    },
}

impl Cli {
    /// Effective configuration: environment first, flags on top.
    pub fn config<F>(&self, get_env: F) -> LocalizerConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LocalizerConfig::from_env(get_env);
        if let Some(dir) = &self.dir {
            config = config.with_translations(TranslationSource::directory(dir));
        }
        if let Some(prefix) = &self.prefix {
            config = config.with_file_prefix(prefix.as_str());
        }
        if let Some(language) = &self.default_lang {
            config = config.with_default_language(language.as_str());
        }
        if let Command::Resolve { lang, precision, .. } = &self.command {
            if lang.is_some() {
                config = config.with_language(lang.clone());
            }
            if precision.is_some() {
                config.number_format.precision = *precision;
            }
        }
        config
    }
}

/// Parse `name=value`.
///
/// The value becomes an integer if it parses as one, else a float if it
/// parses as a finite number, else text.
pub fn parse_assignment(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing argument name in '{raw}'"));
    }
    Ok((name.to_string(), parse_value(value)))
}

fn parse_value(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Int(n);
    }
    if let Ok(n) = raw.parse::<u64>() {
        return Value::UInt(n);
    }
    match raw.parse::<f64>() {
        Ok(x) if x.is_finite() => Value::Float(x),
        _ => Value::Text(raw.to_string()),
    }
}

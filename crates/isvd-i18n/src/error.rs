//! Hard failures surfaced by the engine.
//!
//! Load-time problems never show up here; they degrade to
//! [`ParseWarning`](crate::ts::ParseWarning) and
//! [`LoadWarning`](crate::registry::LoadWarning) values instead.

use std::fmt;

use crate::locale::LanguageId;

/// Errors from i18n operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum I18nError {
    /// A language identifier was empty or contained whitespace.
    #[error("invalid language identifier: {0:?}")]
    InvalidLanguageId(String),
    /// No catalog is registered for the requested language.
    #[error("unsupported language: {language}")]
    UnsupportedLanguage { language: LanguageId },
    /// The template references a placeholder the caller did not supply.
    #[error("missing placeholder argument '{name}'")]
    MissingPlaceholder { name: String },
    /// The template contains a malformed placeholder marker.
    #[error("malformed placeholder at byte {offset}: {problem}")]
    UnknownPlaceholderSyntax { offset: usize, problem: SyntaxProblem },
}

/// The specific way a placeholder marker is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SyntaxProblem {
    /// `{` without a matching `}`.
    Unclosed,
    /// `}` that does not close a placeholder and is not escaped as `}}`.
    StrayClose,
    /// `{}`.
    EmptyName,
    /// `{` inside a placeholder name.
    Nested,
    /// Name contains a character outside `[A-Za-z0-9_]` or starts with a digit.
    InvalidName,
}

impl fmt::Display for SyntaxProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Unclosed => "unclosed '{'",
            Self::StrayClose => "unmatched '}'",
            Self::EmptyName => "empty placeholder name",
            Self::Nested => "nested '{'",
            Self::InvalidName => "invalid placeholder name",
        };
        f.write_str(text)
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, I18nError>;

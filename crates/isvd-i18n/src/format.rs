//! Placeholder substitution.
//!
//! Templates use `{name}` markers. `{{` and `}}` stand for literal braces.
//! Names are `[A-Za-z_][A-Za-z0-9_]*`.
//!
//! # Invariants
//!
//! 1. **Single pass**: substituted values are copied verbatim and never
//!    scanned for markers, so a value like `"{max}"` cannot inject a
//!    placeholder.
//!
//! 2. **Validate before render**: the whole template is parsed and every
//!    referenced name checked against the arguments before any output is
//!    produced. Errors report the first problem in template order.
//!
//! 3. **Supersets are fine**: arguments the template does not reference are
//!    ignored.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{I18nError, Result, SyntaxProblem};

/// A runtime value substituted into a placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Inserted as-is.
    Text(String),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point number, rendered through [`NumberFormat`].
    Float(f64),
}

impl Value {
    /// Render with the given number policy.
    #[must_use]
    pub fn render(&self, numbers: &NumberFormat) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Int(n) => n.to_string(),
            Self::UInt(n) => n.to_string(),
            Self::Float(x) => numbers.float(*x),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

macro_rules! value_from {
    ($variant:ident: $($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::$variant(value.into())
                }
            }
        )+
    };
}

value_from!(Int: i8, i16, i32, i64);
value_from!(UInt: u8, u16, u32, u64);
value_from!(Float: f64);

// Widening would print the binary expansion (0.1f32 as 0.10000000149011612);
// go through the f32's own shortest form instead.
impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(value.to_string().parse().unwrap_or(f64::from(value)))
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Self::UInt(value as u64)
    }
}

impl From<isize> for Value {
    fn from(value: isize) -> Self {
        Self::Int(value as i64)
    }
}

/// Named arguments for a template.
///
/// Setting the same name twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: Vec<(String, Value)>,
}

impl Args {
    /// Empty argument set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an argument, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Add or replace an argument.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.values.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.values.push((name, value));
        }
    }

    /// Value bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no arguments are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Args
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut args = Self::new();
        for (name, value) in iter {
            args.set(name, value);
        }
        args
    }
}

/// Build [`Args`] from `name = value` pairs.
///
/// ```
/// let args = isvd_i18n::args! { values = 5, max = 3 };
/// assert_eq!(args.len(), 2);
/// ```
#[macro_export]
macro_rules! args {
    () => { $crate::format::Args::new() };
    ($($name:ident = $value:expr),+ $(,)?) => {{
        let mut args = $crate::format::Args::new();
        $( args.set(stringify!($name), $value); )+
        args
    }};
}

/// How numbers are turned into text.
///
/// Integers are always rendered in full with no grouping. Floats use the
/// shortest round-trip form unless a fixed precision is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    /// Fixed number of fractional digits for floats.
    pub precision: Option<usize>,
    /// Character placed between integer and fractional digits.
    pub decimal_separator: char,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            precision: None,
            decimal_separator: '.',
        }
    }
}

impl NumberFormat {
    /// Fixed precision policy with a `.` separator.
    #[must_use]
    pub fn fixed(precision: usize) -> Self {
        Self::default().with_precision(Some(precision))
    }

    /// Set the fractional precision.
    #[must_use]
    pub fn with_precision(mut self, precision: Option<usize>) -> Self {
        self.precision = precision;
        self
    }

    /// Set the decimal separator.
    #[must_use]
    pub fn with_decimal_separator(mut self, separator: char) -> Self {
        self.decimal_separator = separator;
        self
    }

    fn float(&self, value: f64) -> String {
        let text = match self.precision {
            Some(precision) if value.is_finite() => format!("{value:.precision$}"),
            _ => value.to_string(),
        };
        if self.decimal_separator == '.' || !value.is_finite() {
            text
        } else {
            text.replacen('.', &self.decimal_separator.to_string(), 1)
        }
    }
}

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Literal text, braces already unescaped.
    Literal(Cow<'a, str>),
    /// A `{name}` placeholder.
    Placeholder(&'a str),
}

/// A parsed, well-formed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template<'a> {
    segments: Vec<Segment<'a>>,
}

impl<'a> Template<'a> {
    /// Parse a template string.
    ///
    /// Fails with [`I18nError::UnknownPlaceholderSyntax`] at the first
    /// malformed marker.
    pub fn parse(source: &'a str) -> Result<Self> {
        let bytes = source.as_bytes();
        let mut segments = Vec::new();
        let mut literal: Cow<'a, str> = Cow::Borrowed("");
        let mut run_start = 0;
        let mut i = 0;

        let syntax = |offset, problem| I18nError::UnknownPlaceholderSyntax { offset, problem };

        while i < bytes.len() {
            match bytes[i] {
                brace @ (b'{' | b'}') if bytes.get(i + 1) == Some(&brace) => {
                    push_run(&mut literal, &source[run_start..i]);
                    literal.to_mut().push(char::from(brace));
                    i += 2;
                    run_start = i;
                }
                b'}' => return Err(syntax(i, SyntaxProblem::StrayClose)),
                b'{' => {
                    let open = i;
                    let mut end = open + 1;
                    while end < bytes.len() && bytes[end] != b'}' {
                        if bytes[end] == b'{' {
                            return Err(syntax(end, SyntaxProblem::Nested));
                        }
                        end += 1;
                    }
                    if end >= bytes.len() {
                        return Err(syntax(open, SyntaxProblem::Unclosed));
                    }
                    let name = &source[open + 1..end];
                    if name.is_empty() {
                        return Err(syntax(open, SyntaxProblem::EmptyName));
                    }
                    if !is_valid_name(name) {
                        return Err(syntax(open, SyntaxProblem::InvalidName));
                    }

                    push_run(&mut literal, &source[run_start..open]);
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name));
                    i = end + 1;
                    run_start = i;
                }
                _ => i += 1,
            }
        }

        push_run(&mut literal, &source[run_start..]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    /// Parsed segments in order.
    #[must_use]
    pub fn segments(&self) -> &[Segment<'a>] {
        &self.segments
    }

    /// Placeholder names in order of first appearance.
    #[must_use]
    pub fn placeholders(&self) -> Vec<&'a str> {
        let mut seen = BTreeSet::new();
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Placeholder(name) if seen.insert(*name) => Some(*name),
                _ => None,
            })
            .collect()
    }

    /// Substitute `args`, rendering numbers with `numbers`.
    pub fn render(&self, args: &Args, numbers: &NumberFormat) -> Result<String> {
        let mut values = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            if let Segment::Placeholder(name) = segment {
                let value = args.get(name).ok_or_else(|| I18nError::MissingPlaceholder {
                    name: (*name).to_string(),
                })?;
                values.push(value.render(numbers));
            }
        }

        let mut out = String::new();
        let mut values = values.into_iter();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(_) => {
                    if let Some(value) = values.next() {
                        out.push_str(&value);
                    }
                }
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Template<'_> {
    /// Re-escaped source form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => f.write_str(&text.replace('{', "{{").replace('}', "}}"))?,
                Segment::Placeholder(name) => write!(f, "{{{name}}}")?,
            }
        }
        Ok(())
    }
}

/// Unescaped runs stay borrowed from the source until an escape forces a copy.
fn push_run<'a>(literal: &mut Cow<'a, str>, run: &'a str) {
    if literal.is_empty() {
        *literal = Cow::Borrowed(run);
    } else {
        literal.to_mut().push_str(run);
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Template formatter bound to a number policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Formatter {
    numbers: NumberFormat,
}

impl Formatter {
    /// Formatter with the given number policy.
    #[must_use]
    pub fn new(numbers: NumberFormat) -> Self {
        Self { numbers }
    }

    /// The number policy in use.
    #[must_use]
    pub fn number_format(&self) -> &NumberFormat {
        &self.numbers
    }

    /// Parse `template` and substitute `args`.
    ///
    /// # Example
    ///
    /// ```
    /// use isvd_i18n::format::{Args, Formatter, NumberFormat};
    ///
    /// let fmt = Formatter::new(NumberFormat::fixed(2));
    /// let args = Args::new().with("ratio", 0.4567);
    /// assert_eq!(
    ///     fmt.format("Compression ratio:\t{ratio}", &args).unwrap(),
    ///     "Compression ratio:\t0.46"
    /// );
    /// ```
    pub fn format(&self, template: &str, args: &Args) -> Result<String> {
        Template::parse(template)?.render(args, &self.numbers)
    }
}

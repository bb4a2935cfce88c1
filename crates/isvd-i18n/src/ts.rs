//! Qt Linguist `.ts` resource parser.
//!
//! Turns one translation document into an ordered list of
//! [`ResourceEntry`] records plus the warnings collected on the way.
//!
//! # Invariants
//!
//! 1. **Never rejects a document**: every problem becomes a
//!    [`ParseWarning`]; records completed before a fatal XML error are kept.
//!
//! 2. **One warning per malformed record**: a message that cannot become an
//!    entry produces exactly one warning and zero entries.
//!
//! 3. **Document order**: entries appear in the order their `<message>`
//!    elements appear. Duplicates are kept in place; the later one shadows
//!    the earlier one when indexed, and the shadowing is reported.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Missing source | `<source>` absent or blank | Record dropped, `MissingSource` |
//! | Missing translation | `<translation>` absent, empty, or self-closing | Record dropped, `MissingTranslation` |
//! | Nameless context | `<context>` without `<name>` | Each message dropped, `MissingContextName` |
//! | Obsolete record | `type="obsolete"` or `type="vanished"` | Record dropped, `Obsolete` |
//! | Plural record | `numerus="yes"` | Record dropped, `PluralForms` |
//! | Bad entity | `&nbsp;` or a bare `&` in a record's text | Record dropped, `BadEscape` |
//! | Broken XML | Syntax error mid-document | Scan stops, `Syntax`, earlier records kept |

use std::collections::HashMap;
use std::fmt;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::catalog::ResourceEntry;

/// Result of parsing one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedResource {
    /// Well-formed records in document order.
    pub entries: Vec<ResourceEntry>,
    /// Problems found while parsing, in document order.
    pub warnings: Vec<ParseWarning>,
    /// `version` attribute of the `TS` root, if any.
    pub version: Option<String>,
    /// `language` attribute of the `TS` root, if any.
    ///
    /// Informational only: callers register resources under an explicit
    /// [`LanguageId`](crate::LanguageId).
    pub declared_language: Option<String>,
}

/// A recoverable problem found in a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ParseWarning {
    /// What went wrong.
    pub kind: ParseWarningKind,
    /// Context name of the affected record, when known.
    pub context: Option<String>,
    /// Source key of the affected record, when known.
    pub key: Option<String>,
    /// 1-based position of the affected `<message>` in the document.
    pub message_index: Option<usize>,
}

/// Classification of a [`ParseWarning`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ParseWarningKind {
    /// The enclosing `<context>` has no usable `<name>`.
    MissingContextName,
    /// `<source>` is absent or blank.
    MissingSource,
    /// `<translation>` is absent or empty.
    MissingTranslation,
    /// An earlier record with the same context and key is shadowed.
    DuplicateKey {
        /// Message index of the shadowed record.
        shadowed: usize,
    },
    /// The record is marked obsolete or vanished.
    Obsolete,
    /// The record uses plural forms, which are not supported.
    PluralForms,
    /// Text of the record holds an undefined entity or a bare `&`.
    BadEscape(String),
    /// The root element is not `TS`.
    UnexpectedRoot(String),
    /// The document has no root element.
    MissingRoot,
    /// The bytes were not valid UTF-8 and were decoded lossily.
    InvalidUtf8,
    /// The XML is not well-formed; scanning stopped here.
    Syntax(String),
}

impl ParseWarning {
    fn document(kind: ParseWarningKind) -> Self {
        Self {
            kind,
            context: None,
            key: None,
            message_index: None,
        }
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ParseWarningKind::MissingContextName => f.write_str("context has no name")?,
            ParseWarningKind::MissingSource => f.write_str("message has no source")?,
            ParseWarningKind::MissingTranslation => f.write_str("message has no translation")?,
            ParseWarningKind::DuplicateKey { shadowed } => {
                write!(f, "duplicate key shadows message #{shadowed}")?;
            }
            ParseWarningKind::Obsolete => f.write_str("obsolete message skipped")?,
            ParseWarningKind::PluralForms => f.write_str("plural message skipped")?,
            ParseWarningKind::BadEscape(msg) => write!(f, "bad character reference: {msg}")?,
            ParseWarningKind::UnexpectedRoot(name) => {
                write!(f, "unexpected root element <{name}>, expected <TS>")?;
            }
            ParseWarningKind::MissingRoot => f.write_str("document has no root element")?,
            ParseWarningKind::InvalidUtf8 => f.write_str("invalid UTF-8 replaced")?,
            ParseWarningKind::Syntax(msg) => write!(f, "XML syntax error: {msg}")?,
        }
        if let Some(index) = self.message_index {
            write!(f, " (message #{index}")?;
            match (&self.context, &self.key) {
                (Some(context), Some(key)) => write!(f, ", {context}.{key})")?,
                (Some(context), None) => write!(f, ", context {context})")?,
                (None, Some(key)) => write!(f, ", key {key})")?,
                (None, None) => f.write_str(")")?,
            }
        }
        Ok(())
    }
}

/// Parse raw resource bytes.
///
/// Invalid UTF-8 is replaced and reported rather than rejected.
#[must_use]
pub fn parse(bytes: &[u8]) -> ParsedResource {
    match std::str::from_utf8(bytes) {
        Ok(text) => parse_str(text),
        Err(_) => {
            let text = String::from_utf8_lossy(bytes);
            let mut parsed = parse_str(&text);
            parsed
                .warnings
                .insert(0, ParseWarning::document(ParseWarningKind::InvalidUtf8));
            parsed
        }
    }
}

/// Parse a resource that is already decoded.
#[must_use]
pub fn parse_str(text: &str) -> ParsedResource {
    let mut parser = TsParser::default();
    let mut reader = Reader::from_str(text);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => parser.open(&e, false),
            Ok(Event::Empty(e)) => {
                parser.open(&e, true);
                parser.close();
            }
            Ok(Event::End(_)) => parser.close(),
            Ok(Event::Text(t)) => match t.unescape() {
                Ok(text) => parser.text(&text),
                Err(err) => parser.bad_text(err.to_string()),
            },
            Ok(Event::CData(c)) => parser.text(&String::from_utf8_lossy(&c)),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                parser.fail(format!("{err} at byte {}", reader.buffer_position()));
                break;
            }
        }
    }

    parser.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Root,
    Context,
    ContextName,
    Message,
    Source,
    Translation,
    Other,
}

#[derive(Debug, Default)]
struct PendingMessage {
    index: usize,
    source: Option<String>,
    translation: Option<String>,
    obsolete: bool,
    numerus: bool,
    bad_escape: Option<String>,
}

#[derive(Debug, Default)]
struct PendingContext {
    name: Option<String>,
    messages: Vec<PendingMessage>,
}

#[derive(Debug, Default)]
struct TsParser {
    out: ParsedResource,
    stack: Vec<Tag>,
    seen_root: bool,
    context: Option<PendingContext>,
    message: Option<PendingMessage>,
    capture: Option<String>,
    message_count: usize,
    last_seen: HashMap<(String, String), usize>,
}

impl TsParser {
    fn parent(&self) -> Option<Tag> {
        self.stack.last().copied()
    }

    fn open(&mut self, e: &BytesStart<'_>, empty: bool) {
        let name = e.name();
        let name = name.as_ref();
        let tag = if !self.seen_root {
            self.seen_root = true;
            if name != b"TS" {
                self.out.warnings.push(ParseWarning::document(
                    ParseWarningKind::UnexpectedRoot(String::from_utf8_lossy(name).into_owned()),
                ));
            }
            for (key, value) in attributes(e) {
                match key.as_str() {
                    "version" => self.out.version = Some(value),
                    "language" => self.out.declared_language = Some(value),
                    _ => {}
                }
            }
            Tag::Root
        } else {
            match (self.parent(), name) {
                (_, b"context") if self.context.is_none() => {
                    self.context = Some(PendingContext::default());
                    Tag::Context
                }
                (Some(Tag::Context), b"name") => Tag::ContextName,
                (Some(Tag::Context), b"message") => {
                    self.message_count += 1;
                    let mut message = PendingMessage {
                        index: self.message_count,
                        ..PendingMessage::default()
                    };
                    for (key, value) in attributes(e) {
                        if key == "numerus" && value == "yes" {
                            message.numerus = true;
                        }
                    }
                    self.message = Some(message);
                    Tag::Message
                }
                (Some(Tag::Message), b"source") => Tag::Source,
                (Some(Tag::Message), b"translation") => {
                    if let Some(message) = self.message.as_mut() {
                        for (key, value) in attributes(e) {
                            if key == "type" && (value == "obsolete" || value == "vanished") {
                                message.obsolete = true;
                            }
                        }
                    }
                    Tag::Translation
                }
                _ => Tag::Other,
            }
        };

        if matches!(tag, Tag::ContextName | Tag::Source | Tag::Translation) && !empty {
            self.capture = Some(String::new());
        }
        self.stack.push(tag);
    }

    fn text(&mut self, text: &str) {
        if self.parent() == Some(Tag::Other) {
            return;
        }
        if let Some(buf) = self.capture.as_mut() {
            buf.push_str(text);
        }
    }

    // The reader is still usable; only the enclosing record is lost.
    fn bad_text(&mut self, error: String) {
        if self.parent() == Some(Tag::Other) || self.capture.is_none() {
            return;
        }
        self.capture = None;
        if let Some(message) = self.message.as_mut() {
            message.bad_escape.get_or_insert(error);
        }
    }

    fn close(&mut self) {
        let Some(tag) = self.stack.pop() else {
            return;
        };
        let captured = if matches!(tag, Tag::ContextName | Tag::Source | Tag::Translation) {
            self.capture.take()
        } else {
            None
        };
        match tag {
            Tag::ContextName => {
                if let Some(context) = self.context.as_mut() {
                    context.name = captured
                        .map(|name| name.trim().to_string())
                        .filter(|name| !name.is_empty());
                }
            }
            Tag::Source => {
                if let Some(message) = self.message.as_mut() {
                    message.source = captured
                        .map(|key| key.trim().to_string())
                        .filter(|key| !key.is_empty());
                }
            }
            Tag::Translation => {
                if let Some(message) = self.message.as_mut() {
                    message.translation = captured.filter(|text| !text.is_empty());
                }
            }
            Tag::Message => {
                if let (Some(message), Some(context)) = (self.message.take(), self.context.as_mut())
                {
                    context.messages.push(message);
                }
            }
            Tag::Context => self.flush_context(),
            Tag::Root | Tag::Other => {}
        }
    }

    fn flush_context(&mut self) {
        let Some(context) = self.context.take() else {
            return;
        };
        for message in context.messages {
            self.emit(context.name.as_deref(), message);
        }
    }

    fn emit(&mut self, context: Option<&str>, message: PendingMessage) {
        let warn = |kind| ParseWarning {
            kind,
            context: context.map(str::to_string),
            key: message.source.clone(),
            message_index: Some(message.index),
        };

        let problem = if context.is_none() {
            Some(ParseWarningKind::MissingContextName)
        } else if let Some(error) = &message.bad_escape {
            Some(ParseWarningKind::BadEscape(error.clone()))
        } else if message.source.is_none() {
            Some(ParseWarningKind::MissingSource)
        } else if message.obsolete {
            Some(ParseWarningKind::Obsolete)
        } else if message.numerus {
            Some(ParseWarningKind::PluralForms)
        } else if message.translation.is_none() {
            Some(ParseWarningKind::MissingTranslation)
        } else {
            None
        };
        if let Some(kind) = problem {
            self.out.warnings.push(warn(kind));
            return;
        }

        let (Some(context), Some(key), Some(template)) =
            (context, message.source.clone(), message.translation)
        else {
            return;
        };
        let id = (context.to_string(), key.clone());
        if let Some(shadowed) = self.last_seen.insert(id, message.index) {
            self.out.warnings.push(ParseWarning {
                kind: ParseWarningKind::DuplicateKey { shadowed },
                context: Some(context.to_string()),
                key: Some(key.clone()),
                message_index: Some(message.index),
            });
        }
        self.out.entries.push(ResourceEntry::new(context, key, template));
    }

    fn fail(&mut self, message: String) {
        // Keep whatever the open context completed before the error.
        self.message = None;
        self.flush_context();
        self.out
            .warnings
            .push(ParseWarning::document(ParseWarningKind::Syntax(message)));
        self.seen_root = true;
    }

    fn finish(mut self) -> ParsedResource {
        self.flush_context();
        if !self.seen_root {
            self.out
                .warnings
                .push(ParseWarning::document(ParseWarningKind::MissingRoot));
        }
        self.out
    }
}

fn attributes(e: &BytesStart<'_>) -> Vec<(String, String)> {
    e.attributes()
        .flatten()
        .filter_map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().ok()?.into_owned();
            Some((key, value))
        })
        .collect()
}

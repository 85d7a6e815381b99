//! # PubTeX Inline-v0
//!
//! Authoring shortcut for publication text: one string carrying typed
//! segments.
//!
//! - `{{m:...}}` math segment
//! - `{{c:...}}` inline code segment
//! - everything else is text; `\{{` and `\}}` are literal `{{` and `}}`
//!
//! Blocks do not nest: the first `}}` after an open always closes it.
//!
//! Math and code content is carried verbatim, so it is only safe to emit once
//! it passes [`forbidden_sequence`].

use crate::primitives::PUBTEX_IR_KIND;
use crate::types::ViolationCode;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::LazyLock;

/// One typed segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum Segment {
    Text { s: String },
    Math { s: String },
    Code { s: String },
}

/// The canonical IR: `{"kind": "pub-tex-inline-v0", "nodes": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubTexIr {
    pub kind: String,
    pub nodes: Vec<Segment>,
}

impl PubTexIr {
    /// Read a canonical IR value. `None` unless `kind` matches and every node
    /// is a well-formed segment.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        if value.get("kind").and_then(Value::as_str) != Some(PUBTEX_IR_KIND) {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }
}

/// A recoverable parse problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubTexError {
    /// `PUBTEX.E.BAD_DELIM`, `PUBTEX.E.BAD_TAG` or `PUBTEX.E.UNKNOWN_TAG`.
    pub code: ViolationCode,
    pub message: String,
    /// Byte offset of the offending `{{`.
    pub pos: usize,
}

impl PubTexError {
    fn new(code: ViolationCode, message: impl Into<String>, pos: usize) -> Self {
        Self {
            code,
            message: message.into(),
            pos,
        }
    }
}

impl fmt::Display for PubTexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.code, self.pos)
    }
}

// =============================================================================
// PARSER
// =============================================================================

fn flush(nodes: &mut Vec<Segment>, buf: &mut String) {
    if buf.is_empty() {
        return;
    }
    let text = std::mem::take(buf);
    if let Some(Segment::Text { s }) = nodes.last_mut() {
        s.push_str(&text);
    } else {
        nodes.push(Segment::Text { s: text });
    }
}

/// Parse an authoring string into segments.
///
/// On a bad or unknown tag the `{{` is kept as literal text and scanning
/// resumes right after it. On an unterminated block scanning stops and the
/// segments produced so far are returned.
pub fn parse_tex_inline_v0(src: &str) -> (Vec<Segment>, Vec<PubTexError>) {
    let mut nodes = Vec::new();
    let mut errors = Vec::new();
    let mut buf = String::new();
    let mut i = 0;

    while let Some(ch) = src[i..].chars().next() {
        let rest = &src[i..];

        if rest.starts_with(r"\{{") {
            buf.push_str("{{");
            i += 3;
            continue;
        }
        if rest.starts_with(r"\}}") {
            buf.push_str("}}");
            i += 3;
            continue;
        }
        if !rest.starts_with("{{") {
            buf.push(ch);
            i += ch.len_utf8();
            continue;
        }

        let start = i;
        let mut header = rest[2..].chars();
        let (Some(tag), Some(sep)) = (header.next(), header.next()) else {
            errors.push(PubTexError::new(
                ViolationCode::PubTexBadDelim,
                "unterminated '{{'",
                start,
            ));
            break;
        };

        if sep != ':' {
            errors.push(PubTexError::new(
                ViolationCode::PubTexBadTag,
                "expected '{{m:...}}' or '{{c:...}}'",
                start,
            ));
            buf.push_str("{{");
            i = start + 2;
            continue;
        }
        if tag != 'm' && tag != 'c' {
            errors.push(PubTexError::new(
                ViolationCode::PubTexUnknownTag,
                format!("unknown tag '{}'", tag),
                start,
            ));
            buf.push_str("{{");
            i = start + 2;
            continue;
        }

        let body = start + 4;
        let Some(len) = src[body..].find("}}") else {
            errors.push(PubTexError::new(
                ViolationCode::PubTexBadDelim,
                "missing closing '}}'",
                start,
            ));
            break;
        };
        let s = src[body..body + len].to_string();
        flush(&mut nodes, &mut buf);
        nodes.push(if tag == 'm' {
            Segment::Math { s }
        } else {
            Segment::Code { s }
        });
        i = body + len + 2;
    }

    flush(&mut nodes, &mut buf);
    tracing::trace!(segments = nodes.len(), errors = errors.len(), "pub-tex parsed");
    (nodes, errors)
}

/// Wrap segments as the canonical IR.
#[must_use]
pub fn to_ir(nodes: Vec<Segment>) -> PubTexIr {
    PubTexIr {
        kind: PUBTEX_IR_KIND.to_string(),
        nodes,
    }
}

// =============================================================================
// CONTROL-SEQUENCE POLICY
// =============================================================================

static FORBIDDEN_MATH: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\\(input|include|write|openout|read|usepackage|catcode|def|edef|gdef)([^A-Za-z@]|$)")
        .ok()
});

static FORBIDDEN_CODE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\\[A-Za-z@]+").ok());

fn matches(re: &LazyLock<Option<Regex>>, s: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(s))
}

/// Why a segment may not be emitted as TeX, if it may not.
///
/// Math may not use file, definition or catcode primitives; code may not
/// contain any control word at all. Text is always escaped, so it never
/// fails.
#[must_use]
pub fn forbidden_sequence(segment: &Segment) -> Option<&'static str> {
    match segment {
        Segment::Math { s } if matches(&FORBIDDEN_MATH, s) => Some("math: forbidden control sequence"),
        Segment::Code { s } if matches(&FORBIDDEN_CODE, s) => Some("code: forbidden backslash sequence"),
        _ => None,
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! # InlineMarkup-K1
//!
//! A small, strict markup language for free-text frame fields. It is not
//! CommonMark: only the constructs below are recognized, everything else is
//! literal text.
//!
//! - inline: `**strong**`, `*emph*` / `_emph_`, `` `code` ``, `$math$`,
//!   `[label](url)`
//! - block (`md-block` only): fenced code blocks and blank-line separated
//!   paragraphs
//!
//! Parsing never fails. Problems come back as [`MarkupError`]s next to a
//! best-effort AST.

mod parser;
mod print;

pub use parser::parse;
pub use print::{inline_latex, inline_markdown, normalize_tex_unicode, tex_escape, to_latex, to_markdown};

pub(crate) use print::{finish_lines, latex_lines, markdown_lines};

use crate::primitives::MARKUP_IR_KIND;
use crate::types::ViolationCode;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// MODE
// =============================================================================

/// How a text field is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkupMode {
    /// No markup; one paragraph holding the raw string.
    Plain,
    /// Inline markup only; one paragraph.
    MdInline,
    /// Code fences and paragraphs, inline markup inside paragraphs.
    MdBlock,
}

impl MarkupMode {
    /// All modes, in declaration order.
    pub const ALL: [MarkupMode; 3] = [Self::Plain, Self::MdInline, Self::MdBlock];

    /// The `text.format` spelling of this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::MdInline => "md-inline",
            Self::MdBlock => "md-block",
        }
    }

    /// Mode for a `text.format` value, if it names one.
    #[must_use]
    pub fn from_format(format: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == format)
    }
}

impl fmt::Display for MarkupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// AST
// =============================================================================

/// Inline content. Two `Text` nodes are never adjacent in a parsed AST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum Inline {
    Text { s: String },
    Emph { c: Vec<Inline> },
    Strong { c: Vec<Inline> },
    Code { s: String },
    Math { s: String },
    Link { c: Vec<Inline>, url: String },
}

impl Inline {
    pub(crate) fn text(s: impl Into<String>) -> Self {
        Self::Text { s: s.into() }
    }
}

/// Block content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum MarkupBlock {
    Paragraph {
        c: Vec<Inline>,
    },
    CodeFence {
        lang: String,
        code: String,
    },
    /// A block type this version does not know; printed as a placeholder.
    #[serde(other)]
    Unknown,
}

/// A parsed text field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupDoc {
    /// Always `inline-markup-k1`.
    pub kind: String,
    /// The requested mode, verbatim (may be an unknown format).
    pub mode: String,
    pub blocks: Vec<MarkupBlock>,
}

impl MarkupDoc {
    pub(crate) fn new(mode: &str, blocks: Vec<MarkupBlock>) -> Self {
        Self {
            kind: MARKUP_IR_KIND.to_string(),
            mode: mode.to_string(),
            blocks,
        }
    }
}

/// A recoverable parse problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupError {
    /// One of the `TEXT.E.*` codes.
    pub code: ViolationCode,
    pub message: String,
    /// Byte offset into the newline-normalized input.
    pub pos: usize,
}

impl MarkupError {
    pub(crate) fn new(code: ViolationCode, message: impl Into<String>, pos: usize) -> Self {
        Self {
            code,
            message: message.into(),
            pos,
        }
    }
}

impl fmt::Display for MarkupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.code, self.pos, self.message)
    }
}

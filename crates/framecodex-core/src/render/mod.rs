//! # Renderers
//!
//! Pure printers from [`DocIr`](crate::docir::DocIr) to output text.
//!
//! Both printers resolve a block's body the same way:
//! 1. `text_format` in the passthrough set: the raw body, verbatim
//! 2. a `pub_tex_inline` payload
//! 3. a `body_markup` payload
//! 4. the raw body, escaped
//!
//! Rendering never fails. Blocks of unknown type and PubTeX payloads that
//! cannot be emitted safely become visible placeholders.

mod latex;
mod markdown;

pub use latex::render_latex;
pub use markdown::render_markdown;

use crate::docir::{MarkupPayload, PubTexPayload, TextParts};
use crate::primitives::DEFAULT_PASSTHROUGH_FORMATS;
use crate::pubtex::forbidden_sequence;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Shown in place of a PubTeX payload that has parse errors or forbidden
/// control sequences.
pub const PUBTEX_PLACEHOLDER: &str = "[invalid pub-tex]";

/// Printer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// `text_format` values emitted verbatim, with no escaping.
    ///
    /// Only safe for formats some earlier gate has already vetted.
    pub passthrough: BTreeSet<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            passthrough: DEFAULT_PASSTHROUGH_FORMATS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl RenderOptions {
    /// Options with an explicit passthrough set.
    #[must_use]
    pub fn with_passthrough<I, S>(formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            passthrough: formats.into_iter().map(Into::into).collect(),
        }
    }

    /// True if `text_format` is emitted verbatim.
    #[must_use]
    pub fn is_passthrough(&self, text_format: &str) -> bool {
        self.passthrough.contains(text_format)
    }
}

/// Escape Markdown emphasis, code, link and escape characters.
#[must_use]
pub fn md_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '\\' | '`' | '*' | '_' | '[' | ']') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Which representation of a body a printer emits.
pub(crate) enum Body<'a> {
    Raw(&'a str),
    PubTex(&'a PubTexPayload),
    InvalidPubTex,
    Markup(&'a MarkupPayload),
    Escaped(&'a str),
}

pub(crate) fn select_body<'a>(parts: &TextParts<'a>, options: &RenderOptions) -> Body<'a> {
    if options.is_passthrough(parts.text_format) {
        return Body::Raw(parts.body);
    }
    if let Some(payload) = parts.pub_tex_inline {
        let safe = payload.errors.is_empty()
            && payload.ir.nodes.iter().all(|s| forbidden_sequence(s).is_none());
        return if safe {
            Body::PubTex(payload)
        } else {
            Body::InvalidPubTex
        };
    }
    if let Some(payload) = parts.body_markup {
        return Body::Markup(payload);
    }
    Body::Escaped(parts.body)
}

/// A field of a verbatim JSON entry as text; `null` and absent are empty.
pub(crate) fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// A single output line followed by a blank line, or one blank line.
pub(crate) fn one_line(line: String) -> Vec<String> {
    if line.is_empty() {
        vec![String::new()]
    } else {
        vec![line, String::new()]
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pubtex::{Segment, to_ir};

    fn parts<'a>(format: &'a str, pub_tex: Option<&'a PubTexPayload>) -> TextParts<'a> {
        TextParts {
            text_format: format,
            body: "b",
            body_markup: None,
            pub_tex_inline: pub_tex,
        }
    }

    #[test]
    fn md_escape_covers_inline_specials() {
        assert_eq!(md_escape(r"a\b`c*d_e[f]"), r"a\\b\`c\*d\_e\[f\]");
        assert_eq!(md_escape("# plain"), "# plain");
    }

    #[test]
    fn default_passthrough_is_tex_formats() {
        let options = RenderOptions::default();
        assert!(options.is_passthrough("tex-inline"));
        assert!(options.is_passthrough("tex-block"));
        assert!(!options.is_passthrough("md-block"));
        assert!(!RenderOptions::with_passthrough(Vec::<String>::new()).is_passthrough("tex-inline"));
    }

    #[test]
    fn passthrough_beats_pub_tex() {
        let payload = PubTexPayload {
            ir: to_ir(vec![Segment::Math { s: "x".to_string() }]),
            errors: Vec::new(),
        };
        let options = RenderOptions::default();
        assert!(matches!(
            select_body(&parts("tex-inline", Some(&payload)), &options),
            Body::Raw("b")
        ));
        assert!(matches!(
            select_body(&parts("plain", Some(&payload)), &options),
            Body::PubTex(_)
        ));
        assert!(matches!(select_body(&parts("plain", None), &options), Body::Escaped("b")));
    }

    #[test]
    fn forbidden_segment_selects_placeholder() {
        let payload = PubTexPayload {
            ir: to_ir(vec![Segment::Math { s: r"\input{x}".to_string() }]),
            errors: Vec::new(),
        };
        assert!(matches!(
            select_body(&parts("plain", Some(&payload)), &RenderOptions::default()),
            Body::InvalidPubTex
        ));
    }
}

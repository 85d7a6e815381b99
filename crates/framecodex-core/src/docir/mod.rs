//! # DocIR
//!
//! A linear, presentation-free document representation lowered from one
//! validated frame. Printers in [`crate::render`] are pure functions over it.
//!
//! ## Shape
//!
//! - `front_matter`: identity and bibliographic fields of the root node
//! - `anchors`: node id → stable anchor, for every node in the frame
//! - `blocks`: headings and content blocks in reading order
//! - `sha256`: hash of the source bytes the frame was loaded from
//!
//! Content blocks carry their raw text plus at most one resolved payload:
//! `pub_tex_inline` when the node carries PubTeX, else `body_markup` when the
//! text format is an InlineMarkup-K1 mode.

mod builder;

pub use builder::{build, norm_text, slugify, stable_anchor};

use crate::markup::{MarkupDoc, MarkupError};
use crate::pubtex::{PubTexError, PubTexIr};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// =============================================================================
// DOCUMENT
// =============================================================================

/// A lowered document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocIr {
    pub docir_version: String,
    pub front_matter: FrontMatter,
    pub anchors: BTreeMap<String, String>,
    pub blocks: Vec<Block>,
    pub sha256: String,
}

/// Identity and bibliographic fields, all taken from the root node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
    pub graph_id: String,
    pub frame_version: String,
    pub title: String,
    /// Decoded from the JSON-encoded `doc.authors` attr.
    #[serde(default)]
    pub authors: Vec<Value>,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub updated: String,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub profile: String,
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// A parsed InlineMarkup-K1 body with the parser's errors kept alongside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupPayload {
    #[serde(flatten)]
    pub doc: MarkupDoc,
    #[serde(default)]
    pub errors: Vec<MarkupError>,
}

/// Resolved PubTeX segments with the parser's errors kept alongside.
///
/// A payload with errors is still carried; printers replace it with a
/// placeholder instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubTexPayload {
    #[serde(flatten)]
    pub ir: PubTexIr,
    #[serde(default)]
    pub errors: Vec<PubTexError>,
}

// =============================================================================
// BLOCKS
// =============================================================================

/// Label, status and body of a definition or clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledText {
    pub label: String,
    #[serde(default)]
    pub status: String,
    pub anchor: String,
    pub text_format: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_markup: Option<MarkupPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pub_tex_inline: Option<PubTexPayload>,
}

/// One DocIR block. The `type` tag is the wire discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading {
        level: u8,
        title: String,
        anchor: String,
    },
    Paragraph {
        anchor: String,
        text_format: String,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body_markup: Option<MarkupPayload>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub_tex_inline: Option<PubTexPayload>,
    },
    Definition(LabeledText),
    Clause(LabeledText),
    Property {
        label: String,
        #[serde(default)]
        status: String,
        anchor: String,
        /// `{sym, desc}` entries, carried verbatim.
        #[serde(default)]
        symbols: Vec<Value>,
    },
    ListItem {
        text: String,
    },
    Note {
        kind: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        anchor: Option<String>,
        text: String,
    },
    /// A block type this version does not know.
    #[serde(other)]
    Unknown,
}

/// The text-bearing part of a paragraph, definition or clause.
#[derive(Debug, Clone, Copy)]
pub struct TextParts<'a> {
    pub text_format: &'a str,
    pub body: &'a str,
    pub body_markup: Option<&'a MarkupPayload>,
    pub pub_tex_inline: Option<&'a PubTexPayload>,
}

impl Block {
    /// The wire name of this block's type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Heading { .. } => "heading",
            Self::Paragraph { .. } => "paragraph",
            Self::Definition(_) => "definition",
            Self::Clause(_) => "clause",
            Self::Property { .. } => "property",
            Self::ListItem { .. } => "list_item",
            Self::Note { .. } => "note",
            Self::Unknown => "unknown",
        }
    }

    /// Body text and payloads, for blocks that carry a body.
    #[must_use]
    pub fn text_parts(&self) -> Option<TextParts<'_>> {
        match self {
            Self::Paragraph {
                text_format,
                text,
                body_markup,
                pub_tex_inline,
                ..
            } => Some(TextParts {
                text_format,
                body: text,
                body_markup: body_markup.as_ref(),
                pub_tex_inline: pub_tex_inline.as_ref(),
            }),
            Self::Definition(t) | Self::Clause(t) => Some(TextParts {
                text_format: &t.text_format,
                body: &t.body,
                body_markup: t.body_markup.as_ref(),
                pub_tex_inline: t.pub_tex_inline.as_ref(),
            }),
            _ => None,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blocks_are_tagged_by_type() {
        let block = Block::Heading {
            level: 2,
            title: "T".to_string(),
            anchor: "t-1".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&block).expect("serialize"),
            json!({"type": "heading", "level": 2, "title": "T", "anchor": "t-1"})
        );
    }

    #[test]
    fn labeled_text_flattens_under_tag() {
        let block = Block::Clause(LabeledText {
            label: "C1".to_string(),
            status: "normative".to_string(),
            anchor: "c1-x".to_string(),
            text_format: "plain".to_string(),
            body: "b".to_string(),
            body_markup: None,
            pub_tex_inline: None,
        });
        let value = serde_json::to_value(&block).expect("serialize");
        assert_eq!(value["type"], json!("clause"));
        assert_eq!(value["label"], json!("C1"));
        assert!(value.get("body_markup").is_none());
    }

    #[test]
    fn unknown_block_type_is_kept_as_placeholder() {
        let block: Block = serde_json::from_value(json!({"type": "table", "rows": []}))
            .expect("parse");
        assert_eq!(block, Block::Unknown);
        assert!(block.text_parts().is_none());
    }

    #[test]
    fn markup_payload_flattens_doc() {
        let (doc, errors) = crate::markup::parse("`x", "md-inline");
        let payload = MarkupPayload { doc, errors };
        let value = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(value["kind"], json!("inline-markup-k1"));
        assert_eq!(value["errors"][0]["code"], json!("TEXT.E.UNBALANCED_DELIMS"));
        let back: MarkupPayload = serde_json::from_value(value).expect("parse");
        assert_eq!(back, payload);
    }
}

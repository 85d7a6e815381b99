//! Lowering of a validated frame into DocIR.
//!
//! The spine is the `contains` hierarchy when the frame has one; otherwise
//! nodes are grouped under one synthetic heading per kind. Siblings are
//! always ordered by `(kind_rank, order, id)`.

use super::{Block, DocIr, FrontMatter, LabeledText, MarkupPayload, PubTexPayload};
use crate::formats::{sha256_hex, sha256_text};
use crate::frame::{Frame, Node};
use crate::markup::{self, MarkupMode};
use crate::primitives::{
    DOCIR_VERSION, MAX_HEADING_LEVEL, PUBTEX_AUTHORING_FORMAT, SPEC_REF_KIND, kind_rank,
};
use crate::pubtex::{self, PubTexIr};
use crate::types::FrameError;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// TEXT AND ANCHORS
// =============================================================================

/// Normalize newlines to LF, strip trailing whitespace on every line, and
/// drop leading and trailing blank lines.
#[must_use]
pub fn norm_text(s: &str) -> String {
    let s = s.replace("\r\n", "\n").replace('\r', "\n");
    let joined = s.split('\n').map(str::trim_end).collect::<Vec<_>>().join("\n");
    joined.trim_matches('\n').to_string()
}

/// Lowercase ASCII slug: runs of anything but `[a-z0-9]` become one `-`.
/// Never empty; falls back to `x`.
#[must_use]
pub fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    for ch in s.trim().to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            slug.push(ch);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "x".to_string()
    } else {
        slug.to_string()
    }
}

/// `slugify(id)` plus the first 8 hex digits of `sha256(id)`.
#[must_use]
pub fn stable_anchor(id: &str) -> String {
    let digest = sha256_text(id);
    format!("{}-{}", slugify(id), &digest[..8])
}

// =============================================================================
// BUILDER
// =============================================================================

/// Lower a frame to DocIR. `source` is the raw bytes the frame was loaded
/// from; only its hash is kept.
///
/// Fails only when the frame has no root node.
pub fn build(frame: &Frame, source: &[u8]) -> Result<DocIr, FrameError> {
    let root = frame
        .root()
        .ok_or_else(|| FrameError::MissingRoot(frame.graph_id.clone()))?;

    let nodes = unique_nodes(frame);
    let anchors: BTreeMap<String, String> = nodes
        .keys()
        .map(|id| (id.to_string(), stable_anchor(id)))
        .collect();

    let front_matter = front_matter(frame, root);
    let children = frame.contains_children();
    let mut lowering = Lowering {
        nodes: &nodes,
        anchors: &anchors,
        blocks: Vec::new(),
    };

    lowering.blocks.push(Block::Heading {
        level: 1,
        title: front_matter.title.clone(),
        anchor: lowering.anchor(&root.id),
    });

    if frame.has_contains_edges() {
        lowering.walk_contains(&root.id, &children);
    } else {
        lowering.synthetic_groups(&root.id);
    }
    lowering.references();

    let blocks = lowering.blocks;
    tracing::debug!(graph_id = %frame.graph_id, blocks = blocks.len(), "docir built");

    Ok(DocIr {
        docir_version: DOCIR_VERSION.to_string(),
        front_matter,
        anchors,
        blocks,
        sha256: sha256_hex(source),
    })
}

/// First occurrence of every node id.
fn unique_nodes(frame: &Frame) -> BTreeMap<&str, &Node> {
    let mut nodes = BTreeMap::new();
    for node in &frame.nodes {
        nodes.entry(node.id.as_str()).or_insert(node);
    }
    nodes
}

/// Explicit orders first, ascending; absent last.
fn order_key(order: Option<i64>) -> (bool, i64) {
    (order.is_none(), order.unwrap_or(0))
}

fn doc_attr(root: &Node, key: &str) -> String {
    root.attr(key)
        .and_then(|a| a.as_str())
        .unwrap_or("")
        .to_string()
}

/// `doc.authors` is a JSON-encoded list; a literal list is accepted too.
fn authors(root: &Node) -> Vec<Value> {
    let decoded = match root.attr("doc.authors").map(|a| &a.value) {
        Some(Value::String(s)) => serde_json::from_str(s).ok(),
        Some(other) => Some(other.clone()),
        None => None,
    };
    match decoded {
        Some(Value::Array(list)) => list,
        _ => Vec::new(),
    }
}

fn front_matter(frame: &Frame, root: &Node) -> FrontMatter {
    FrontMatter {
        graph_id: root.id.clone(),
        frame_version: frame.version.clone(),
        title: root.display_name(&["title"]).to_string(),
        authors: authors(root),
        created: doc_attr(root, "doc.created"),
        updated: doc_attr(root, "doc.updated"),
        license: doc_attr(root, "doc.license"),
        profile: root.resolve_text("profile").unwrap_or("").to_string(),
    }
}

struct Lowering<'a> {
    nodes: &'a BTreeMap<&'a str, &'a Node>,
    anchors: &'a BTreeMap<String, String>,
    blocks: Vec<Block>,
}

impl<'a> Lowering<'a> {
    fn anchor(&self, id: &str) -> String {
        self.anchors
            .get(id)
            .cloned()
            .unwrap_or_else(|| stable_anchor(id))
    }

    /// Ids sorted by `(kind_rank, order, id)`. A missing `order` sorts after
    /// every explicit one; ids naming no node sort last.
    fn sorted(&self, ids: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        let mut keyed: Vec<(u32, Option<i64>, &str)> = ids
            .into_iter()
            .map(|id| match self.nodes.get(id) {
                Some(node) => (kind_rank(node.kind()), node.order(), id),
                None => (kind_rank(""), None, id),
            })
            .collect();
        keyed.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| order_key(a.1).cmp(&order_key(b.1)))
                .then_with(|| a.2.cmp(b.2))
        });
        keyed.into_iter().map(|(_, _, id)| id).collect()
    }

    /// Depth-first over `contains`, starting at the root's children at depth 1.
    ///
    /// Every node is emitted at most once, so a malformed hierarchy cannot
    /// loop or duplicate output.
    fn walk_contains(&mut self, root: &'a str, children: &'a BTreeMap<String, Vec<String>>) {
        let kids_of = |id: &str| {
            children
                .get(id)
                .map(|kids| kids.iter().map(String::as_str).collect::<Vec<_>>())
                .unwrap_or_default()
        };

        let mut seen: BTreeSet<&str> = BTreeSet::new();
        seen.insert(root);
        let mut stack: Vec<(&str, usize)> = self
            .sorted(kids_of(root))
            .into_iter()
            .rev()
            .map(|id| (id, 1))
            .collect();

        while let Some((id, depth)) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let Some(node) = self.nodes.get(id).copied() else {
                continue;
            };
            if node.kind() != SPEC_REF_KIND {
                let level = u8::try_from(depth + 1)
                    .unwrap_or(MAX_HEADING_LEVEL)
                    .min(MAX_HEADING_LEVEL);
                self.lower(node, level);
            }
            for kid in self.sorted(kids_of(id)).into_iter().rev() {
                stack.push((kid, depth + 1));
            }
        }
    }

    /// One level-2 heading per kind, ordered by `(kind_rank, kind)`.
    fn synthetic_groups(&mut self, root: &str) {
        let mut groups: BTreeMap<&str, Vec<&'a str>> = BTreeMap::new();
        for (&id, node) in self.nodes {
            if id == root || node.kind() == SPEC_REF_KIND {
                continue;
            }
            let kind = match node.kind() {
                "" => "other",
                k => k,
            };
            groups.entry(kind).or_default().push(id);
        }

        let mut kinds: Vec<&str> = groups.keys().copied().collect();
        kinds.sort_by_key(|k| (kind_rank(k), *k));

        for kind in kinds {
            self.blocks.push(Block::Heading {
                level: 2,
                title: if kind == "other" { "Other" } else { kind }.to_string(),
                anchor: stable_anchor(&format!("kind:{}", kind)),
            });
            let ids = groups.get(kind).cloned().unwrap_or_default();
            for id in self.sorted(ids) {
                if let Some(node) = self.nodes.get(id).copied() {
                    self.lower(node, 3);
                }
            }
        }
    }

    /// Trailing `References` section built from `spec_ref` nodes.
    fn references(&mut self) {
        let mut refs: Vec<(&str, &str, &str)> = self
            .nodes
            .values()
            .filter(|n| n.kind() == SPEC_REF_KIND)
            .map(|n| {
                (
                    n.display_name(&["label"]),
                    n.id.as_str(),
                    n.resolve_str("target_graph_id").unwrap_or(""),
                )
            })
            .collect();
        if refs.is_empty() {
            return;
        }
        refs.sort();

        self.blocks.push(Block::Heading {
            level: 2,
            title: "References".to_string(),
            anchor: stable_anchor("refs"),
        });
        for (label, _, target) in refs {
            self.blocks.push(Block::ListItem {
                text: format!("{} ({})", label, target),
            });
        }
    }

    /// Kind-driven lowering of one node. `heading_level` applies to
    /// `section` and `title` nodes.
    fn lower(&mut self, node: &Node, heading_level: u8) {
        let anchor = self.anchor(&node.id);
        let block = match node.kind() {
            "section" => Block::Heading {
                level: heading_level,
                title: node.display_name(&["title", "label"]).to_string(),
                anchor,
            },
            "title" => Block::Heading {
                level: heading_level,
                title: node.display_name(&["text", "title", "label"]).to_string(),
                anchor,
            },
            "paragraph" => {
                let text = resolve_text(node, "text", MarkupMode::MdBlock);
                Block::Paragraph {
                    anchor,
                    text_format: text.format,
                    text: text.body,
                    body_markup: text.markup,
                    pub_tex_inline: text.pub_tex,
                }
            }
            "reference" => {
                let label = node.display_name(&["label", "title"]);
                let body = match node.resolve_text("target") {
                    Some(target) => format!("{}: {}", label, target),
                    None => label.to_string(),
                };
                Block::Paragraph {
                    anchor,
                    text_format: MarkupMode::MdInline.as_str().to_string(),
                    body_markup: markup_payload(&body, MarkupMode::MdInline.as_str()),
                    text: body,
                    pub_tex_inline: None,
                }
            }
            "term" => Block::Definition(labeled(node, anchor, "summary", MarkupMode::Plain)),
            "clause" => Block::Clause(labeled(node, anchor, "text", MarkupMode::MdBlock)),
            "property" => Block::Property {
                label: node.display_name(&["label"]).to_string(),
                status: node.status().to_string(),
                anchor,
                symbols: node.symbols(),
            },
            kind => Block::Note {
                kind: "unhandled-node".to_string(),
                anchor: Some(anchor),
                text: format!("{} {}", kind, node.id),
            },
        };
        self.blocks.push(block);
    }
}

// =============================================================================
// TEXT RESOLUTION
// =============================================================================

struct ResolvedText {
    format: String,
    body: String,
    markup: Option<MarkupPayload>,
    pub_tex: Option<PubTexPayload>,
}

fn labeled(node: &Node, anchor: String, field: &str, default: MarkupMode) -> LabeledText {
    let text = resolve_text(node, field, default);
    LabeledText {
        label: node.display_name(&["label"]).to_string(),
        status: node.status().to_string(),
        anchor,
        text_format: text.format,
        body: text.body,
        body_markup: text.markup,
        pub_tex_inline: text.pub_tex,
    }
}

/// PubTeX first, then InlineMarkup-K1 when the format names a markup mode,
/// else the plain body alone.
fn resolve_text(node: &Node, field: &str, default: MarkupMode) -> ResolvedText {
    let body = norm_text(node.resolve_str(field).unwrap_or(""));
    let format = node
        .resolve_text("text.format")
        .unwrap_or(default.as_str())
        .to_string();

    let pub_tex = pub_tex_payload(node, field);
    let markup = if pub_tex.is_none() && !body.is_empty() {
        MarkupMode::from_format(&format).and_then(|_| markup_payload(&body, &format))
    } else {
        None
    };

    ResolvedText {
        format,
        body,
        markup,
        pub_tex,
    }
}

fn markup_payload(body: &str, format: &str) -> Option<MarkupPayload> {
    if body.is_empty() {
        return None;
    }
    let (doc, errors) = markup::parse(body, format);
    Some(MarkupPayload { doc, errors })
}

/// `pub.tex.<field>` as authoring text (with `pub.tex.<field>.format`
/// set to `tex-inline-v0`) or as canonical IR.
fn pub_tex_payload(node: &Node, field: &str) -> Option<PubTexPayload> {
    let key = format!("pub.tex.{}", field);
    let format = node
        .attr(&format!("{}.format", key))
        .and_then(|a| a.as_str());
    let value = &node.attr(&key)?.value;

    if format == Some(PUBTEX_AUTHORING_FORMAT) {
        let (segments, errors) = pubtex::parse_tex_inline_v0(value.as_str()?);
        return Some(PubTexPayload {
            ir: pubtex::to_ir(segments),
            errors,
        });
    }

    let ir = match value {
        Value::String(s) => serde_json::from_str::<Value>(s)
            .ok()
            .and_then(|v| PubTexIr::from_value(&v)),
        other => PubTexIr::from_value(other),
    }?;
    Some(PubTexPayload {
        ir,
        errors: Vec::new(),
    })
}

// =============================================================================
// TESTS
// =============================================================================

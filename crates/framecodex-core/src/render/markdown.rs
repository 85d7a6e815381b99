//! Markdown printer.

use super::{Body, PUBTEX_PLACEHOLDER, RenderOptions, md_escape, one_line, select_body, value_text};
use crate::docir::{Block, DocIr, LabeledText};
use crate::markup::{finish_lines, markdown_lines};
use crate::primitives::MAX_HEADING_LEVEL;
use crate::pubtex::Segment;

/// Render a document as Markdown. Headings carry an explicit
/// `<a id="..."></a>` anchor line.
#[must_use]
pub fn render_markdown(doc: &DocIr, options: &RenderOptions) -> String {
    let mut lines = Vec::new();
    for block in &doc.blocks {
        lines.extend(block_lines(block, options));
    }
    finish_lines(&lines)
}

fn head(label: &str, status: &str) -> String {
    let mut head = format!("**{}**", md_escape(label));
    if !status.is_empty() {
        head.push_str(&format!(" _({})_", md_escape(status)));
    }
    head
}

fn pub_tex_markdown(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text { s } => out.push_str(&md_escape(s)),
            Segment::Math { s } => out.push_str(&format!("${}$", s)),
            Segment::Code { s } => out.push_str(&code_span(s)),
        }
    }
    out
}

/// Inline code fenced by one more backtick than the longest run inside it.
/// Content starting or ending with a backtick is padded with one space.
fn code_span(s: &str) -> String {
    let longest = s
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest + 1);
    if s.starts_with('`') || s.ends_with('`') {
        format!("{} {} {}", fence, s, fence)
    } else {
        format!("{}{}{}", fence, s, fence)
    }
}

fn body_lines(block: &Block, options: &RenderOptions) -> Vec<String> {
    let Some(parts) = block.text_parts() else {
        return vec![String::new()];
    };
    match select_body(&parts, options) {
        Body::Raw(s) => one_line(s.trim_end().to_string()),
        Body::PubTex(payload) => one_line(pub_tex_markdown(&payload.ir.nodes)),
        Body::InvalidPubTex => one_line(md_escape(PUBTEX_PLACEHOLDER)),
        Body::Markup(payload) if !payload.doc.blocks.is_empty() => markdown_lines(&payload.doc),
        Body::Markup(_) => vec![String::new()],
        Body::Escaped(s) => one_line(md_escape(s.trim())),
    }
}

fn block_lines(block: &Block, options: &RenderOptions) -> Vec<String> {
    match block {
        Block::Heading {
            level,
            title,
            anchor,
        } => {
            let hashes = "#".repeat(usize::from((*level).clamp(1, MAX_HEADING_LEVEL)));
            let mut lines = vec![format!("{} {}", hashes, md_escape(title))];
            if !anchor.is_empty() {
                lines.push(format!("<a id=\"{}\"></a>", anchor));
            }
            lines.push(String::new());
            lines
        }
        Block::Paragraph { .. } => body_lines(block, options),
        Block::Definition(LabeledText { label, status, .. })
        | Block::Clause(LabeledText { label, status, .. }) => {
            let mut lines = vec![head(label, status), String::new()];
            lines.extend(body_lines(block, options));
            lines
        }
        Block::Property {
            label,
            status,
            symbols,
            ..
        } => {
            let mut lines = vec![head(label, status), String::new()];
            if !symbols.is_empty() {
                for symbol in symbols {
                    lines.push(format!(
                        "- `{}`: {}",
                        md_escape(&value_text(symbol.get("sym"))),
                        md_escape(&value_text(symbol.get("desc")))
                    ));
                }
                lines.push(String::new());
            }
            lines
        }
        Block::ListItem { text } => vec![format!("- {}", md_escape(text))],
        Block::Note { kind, text, .. } => {
            vec![format!("> **{}**: {}", md_escape(kind), md_escape(text)), String::new()]
        }
        Block::Unknown => vec!["> **unhandled block**: `unknown`".to_string(), String::new()],
    }
}

// =============================================================================
// TESTS
// =============================================================================

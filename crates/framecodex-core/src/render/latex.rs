//! LaTeX printer: a complete `article` document.

use super::{Body, PUBTEX_PLACEHOLDER, RenderOptions, one_line, select_body, value_text};
use crate::docir::{Block, DocIr, LabeledText};
use crate::markup::{finish_lines, latex_lines, normalize_tex_unicode, tex_escape};
use crate::pubtex::Segment;

const PACKAGES: [&str; 9] = [
    r"\usepackage[T1]{fontenc}",
    r"\usepackage[utf8]{inputenc}",
    r"\usepackage{lmodern}",
    r"\usepackage{hyperref}",
    r"\usepackage{geometry}",
    r"\usepackage{amsmath}",
    r"\usepackage{amssymb}",
    r"\usepackage{fancyvrb}",
    r"\geometry{margin=1in}",
];

/// Render a document as a standalone LaTeX article.
///
/// The first top-level heading repeating the document title is dropped,
/// since `\maketitle` already prints it. Runs of list items share one
/// `itemize` environment.
#[must_use]
pub fn render_latex(doc: &DocIr, options: &RenderOptions) -> String {
    let title = doc.front_matter.title.as_str();
    let mut lines = preamble(title);
    let mut in_itemize = false;
    let mut title_skipped = false;

    for block in &doc.blocks {
        if !title_skipped && repeats_title(block, title) {
            title_skipped = true;
            continue;
        }

        let is_item = matches!(block, Block::ListItem { .. });
        if is_item && !in_itemize {
            lines.push(r"\begin{itemize}".to_string());
            in_itemize = true;
        }
        if !is_item && in_itemize {
            lines.push(r"\end{itemize}".to_string());
            lines.push(String::new());
            in_itemize = false;
        }
        lines.extend(block_lines(block, options));
    }

    if in_itemize {
        lines.push(r"\end{itemize}".to_string());
        lines.push(String::new());
    }
    lines.push(r"\end{document}".to_string());
    finish_lines(&lines)
}

fn repeats_title(block: &Block, title: &str) -> bool {
    match block {
        Block::Heading { level, title: h, .. } => {
            *level <= 1 && !title.trim().is_empty() && h.trim() == title.trim()
        }
        _ => false,
    }
}

fn preamble(title: &str) -> Vec<String> {
    let title = if title.is_empty() {
        tex_escape("Document")
    } else {
        title_tex(title)
    };
    let mut lines = vec![r"\documentclass[11pt]{article}".to_string()];
    lines.extend(PACKAGES.iter().map(|p| p.to_string()));
    lines.push(String::new());
    lines.push(format!(r"\title{{{}}}", title));
    lines.push(r"\author{}".to_string());
    lines.push(r"\date{}".to_string());
    lines.push(String::new());
    lines.push(r"\begin{document}".to_string());
    lines.push(r"\maketitle".to_string());
    lines.push(String::new());
    lines
}

/// Title text: `$...$` spans stay math (Unicode-normalized), the rest is
/// escaped. An unmatched `$` is literal.
fn title_tex(title: &str) -> String {
    let mut out = String::new();
    let mut rest = title;
    while let Some(open) = rest.find('$') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('$') else {
            break;
        };
        out.push_str(&tex_escape(&rest[..open]));
        out.push('$');
        out.push_str(&normalize_tex_unicode(&after[..close]));
        out.push('$');
        rest = &after[close + 1..];
    }
    out.push_str(&tex_escape(rest));
    out
}

fn head(label: &str, status: &str) -> String {
    let mut head = format!(r"\textbf{{{}}}", tex_escape(label));
    if !status.is_empty() {
        head.push_str(&format!(r" \emph{{({})}}", tex_escape(status)));
    }
    head
}

fn pub_tex_latex(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text { s } => out.push_str(&tex_escape(s)),
            Segment::Math { s } => out.push_str(&format!(r"\({}\)", s)),
            Segment::Code { s } => out.push_str(&format!(r"\texttt{{{}}}", tex_escape(s))),
        }
    }
    out
}

fn body_lines(block: &Block, options: &RenderOptions) -> Vec<String> {
    let Some(parts) = block.text_parts() else {
        return vec![String::new()];
    };
    match select_body(&parts, options) {
        Body::Raw(s) => one_line(s.trim_end().to_string()),
        Body::PubTex(payload) => one_line(pub_tex_latex(&payload.ir.nodes)),
        Body::InvalidPubTex => one_line(tex_escape(PUBTEX_PLACEHOLDER)),
        Body::Markup(payload) if !payload.doc.blocks.is_empty() => latex_lines(&payload.doc),
        Body::Markup(_) => vec![String::new()],
        Body::Escaped(s) => one_line(tex_escape(s.trim())),
    }
}

fn heading_command(level: u8) -> &'static str {
    match level {
        0 | 1 => "section*",
        2 => "subsection*",
        3 => "subsubsection*",
        _ => "paragraph*",
    }
}

fn block_lines(block: &Block, options: &RenderOptions) -> Vec<String> {
    match block {
        Block::Heading { level, title, .. } => vec![
            format!(r"\{}{{{}}}", heading_command(*level), tex_escape(title)),
            String::new(),
        ],
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
                lines.push(r"\begin{itemize}".to_string());
                for symbol in symbols {
                    let sym = value_text(symbol.get("sym"));
                    let desc = tex_escape(&value_text(symbol.get("desc")));
                    if sym.is_empty() {
                        lines.push(format!(r"  \item {}", desc));
                    } else {
                        lines.push(format!(r"  \item \({}\): {}", normalize_tex_unicode(&sym), desc));
                    }
                }
                lines.push(r"\end{itemize}".to_string());
                lines.push(String::new());
            }
            lines
        }
        Block::ListItem { text } => vec![format!(r"\item {}", tex_escape(text))],
        Block::Note { kind, text, .. } => vec![
            format!(
                r"\begin{{quote}}\textbf{{{}}}: {}\end{{quote}}",
                tex_escape(kind),
                tex_escape(text)
            ),
            String::new(),
        ],
        Block::Unknown => vec![
            r"\begin{quote}\textbf{unhandled block}: unknown\end{quote}".to_string(),
            String::new(),
        ],
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! Markdown and LaTeX printers for InlineMarkup-K1 ASTs, plus the LaTeX
//! escaping shared with the document renderer.

use super::{Inline, MarkupBlock, MarkupDoc};
use regex::{NoExpand, Regex};
use std::sync::LazyLock;

// =============================================================================
// LATEX ESCAPING
// =============================================================================

/// Escape text for LaTeX text mode. Never apply this to math content.
#[must_use]
pub fn tex_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str(r"\textbackslash{}"),
            '{' => out.push_str(r"\{"),
            '}' => out.push_str(r"\}"),
            '$' => out.push_str(r"\$"),
            '&' => out.push_str(r"\&"),
            '#' => out.push_str(r"\#"),
            '%' => out.push_str(r"\%"),
            '_' => out.push_str(r"\_"),
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            _ => out.push(ch),
        }
    }
    out
}

static R_GE_ZERO: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"R_\{\s*≥\s*0\s*\}").ok());

fn unicode_macro(ch: char) -> Option<&'static str> {
    Some(match ch {
        'Σ' => r"\Sigma",
        'Π' => r"\Pi",
        'Θ' => r"\Theta",
        'Γ' => r"\Gamma",
        'Δ' => r"\Delta",
        'Λ' => r"\Lambda",
        'Ω' => r"\Omega",
        'β' => r"\beta",
        'χ' => r"\chi",
        'π' => r"\pi",
        'θ' => r"\theta",
        'γ' => r"\gamma",
        'δ' => r"\delta",
        'λ' => r"\lambda",
        'ω' => r"\omega",
        '→' => r"\to",
        '↦' => r"\mapsto",
        '×' => r"\times",
        '∘' => r"\circ",
        '≤' => r"\le",
        '≥' => r"\ge",
        '≼' | '⪯' => r"\preceq",
        '∈' => r"\in",
        _ => return None,
    })
}

/// Rewrite common Unicode math glyphs as TeX macros.
///
/// Adds no math delimiters; only meaningful inside math mode.
#[must_use]
pub fn normalize_tex_unicode(s: &str) -> String {
    let s = match R_GE_ZERO.as_ref() {
        Some(re) => re.replace_all(s, NoExpand(r"\mathbb{R}_{\ge 0}")).into_owned(),
        None => s.to_string(),
    };
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match unicode_macro(ch) {
            Some(mac) => out.push_str(mac),
            None => out.push(ch),
        }
    }
    out
}

// =============================================================================
// INLINE
// =============================================================================

/// Inline nodes as Markdown. The inverse of the inline parser for any AST
/// the parser produced from delimiter-balanced input.
#[must_use]
pub fn inline_markdown(nodes: &[Inline]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Inline::Text { s } => out.push_str(s),
            Inline::Emph { c } => {
                out.push('*');
                out.push_str(&inline_markdown(c));
                out.push('*');
            }
            Inline::Strong { c } => {
                out.push_str("**");
                out.push_str(&inline_markdown(c));
                out.push_str("**");
            }
            Inline::Code { s } => {
                out.push('`');
                out.push_str(s);
                out.push('`');
            }
            Inline::Math { s } => {
                out.push('$');
                out.push_str(s);
                out.push('$');
            }
            Inline::Link { c, url } => {
                out.push('[');
                out.push_str(&inline_markdown(c));
                out.push_str("](");
                out.push_str(url);
                out.push(')');
            }
        }
    }
    out
}

/// Inline nodes as LaTeX. Text is escaped, math is only Unicode-normalized.
#[must_use]
pub fn inline_latex(nodes: &[Inline]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Inline::Text { s } => out.push_str(&tex_escape(s)),
            Inline::Emph { c } => out.push_str(&format!(r"\emph{{{}}}", inline_latex(c))),
            Inline::Strong { c } => out.push_str(&format!(r"\textbf{{{}}}", inline_latex(c))),
            Inline::Code { s } => out.push_str(&format!(r"\texttt{{{}}}", tex_escape(s))),
            Inline::Math { s } => out.push_str(&format!("${}$", normalize_tex_unicode(s))),
            Inline::Link { c, url } => out.push_str(&format!(
                r"\href{{{}}}{{{}}}",
                tex_escape(url),
                inline_latex(c)
            )),
        }
    }
    out
}

// =============================================================================
// BLOCKS
// =============================================================================

/// Output lines for every block, each block followed by one blank line.
pub(crate) fn markdown_lines(doc: &MarkupDoc) -> Vec<String> {
    let mut lines = Vec::new();
    for block in &doc.blocks {
        match block {
            MarkupBlock::CodeFence { lang, code } => {
                lines.push(format!("```{}", lang.trim()).trim_end().to_string());
                lines.extend(code.split('\n').map(str::to_string));
                lines.push("```".to_string());
            }
            MarkupBlock::Paragraph { c } => lines.push(inline_markdown(c)),
            MarkupBlock::Unknown => lines.push("[unhandled:block]".to_string()),
        }
        lines.push(String::new());
    }
    lines
}

/// Output lines for every block, each block followed by one blank line.
pub(crate) fn latex_lines(doc: &MarkupDoc) -> Vec<String> {
    let mut lines = Vec::new();
    for block in &doc.blocks {
        match block {
            MarkupBlock::CodeFence { code, .. } => {
                lines.push(r"\begin{verbatim}".to_string());
                lines.extend(code.split('\n').map(str::to_string));
                lines.push(r"\end{verbatim}".to_string());
            }
            MarkupBlock::Paragraph { c } => lines.push(inline_latex(c)),
            MarkupBlock::Unknown => lines.push(tex_escape("[unhandled:block]")),
        }
        lines.push(String::new());
    }
    lines
}

/// Join lines with trailing whitespace removed, ending in exactly one newline.
pub(crate) fn finish_lines(lines: &[String]) -> String {
    let joined = lines
        .iter()
        .map(|l| l.trim_end())
        .collect::<Vec<_>>()
        .join("\n");
    format!("{}\n", joined.trim_end())
}

/// Print a markup document as Markdown.
#[must_use]
pub fn to_markdown(doc: &MarkupDoc) -> String {
    finish_lines(&markdown_lines(doc))
}

/// Print a markup document as a LaTeX body fragment (no preamble).
#[must_use]
pub fn to_latex(doc: &MarkupDoc) -> String {
    finish_lines(&latex_lines(doc))
}

// =============================================================================
// TESTS
// =============================================================================

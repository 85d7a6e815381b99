//! Single-pass parser for InlineMarkup-K1.
//!
//! All positions are byte offsets. Every delimiter the parser looks at is
//! ASCII, so every slice boundary it takes is a char boundary.

use super::{Inline, MarkupBlock, MarkupDoc, MarkupError, MarkupMode};
use crate::types::ViolationCode;
use regex::Regex;
use std::sync::LazyLock;

const FENCE: &[u8] = b"```";

static HTML_TAG_LIKE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)<\s*/?\s*(a|p|div|span|br|hr|img|code|pre|em|strong|ul|ol|li|table|thead|tbody|tr|td|th|h[1-6])\b[^>]*>",
    )
    .ok()
});

/// Parse `text` in `mode` (`plain`, `md-inline` or `md-block`).
///
/// CRLF and lone CR are normalized to LF first. An unknown mode yields
/// `TEXT.E.BAD_TEXT_FORMAT` and a plain paragraph.
pub fn parse(text: &str, mode: &str) -> (MarkupDoc, Vec<MarkupError>) {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut errors = Vec::new();

    if let Some(m) = HTML_TAG_LIKE.as_ref().and_then(|re| re.find(&text)) {
        errors.push(MarkupError::new(
            ViolationCode::TextHtmlDisallowed,
            "Raw HTML tags are not allowed in InlineMarkup-K1",
            m.start(),
        ));
    }

    let blocks = match MarkupMode::from_format(mode) {
        Some(MarkupMode::Plain) => vec![plain_paragraph(text)],
        Some(MarkupMode::MdInline) => vec![MarkupBlock::Paragraph {
            c: parse_inline(&text, 0, &mut errors),
        }],
        Some(MarkupMode::MdBlock) => parse_blocks(&text, &mut errors),
        None => {
            errors.push(MarkupError::new(
                ViolationCode::TextBadTextFormat,
                format!("Unknown text.format: {}", mode),
                0,
            ));
            vec![plain_paragraph(text)]
        }
    };

    tracing::trace!(mode, blocks = blocks.len(), errors = errors.len(), "markup parsed");
    (MarkupDoc::new(mode, blocks), errors)
}

fn plain_paragraph(text: String) -> MarkupBlock {
    MarkupBlock::Paragraph {
        c: vec![Inline::Text { s: text }],
    }
}

// =============================================================================
// BLOCKS
// =============================================================================

fn parse_blocks(text: &str, errors: &mut Vec<MarkupError>) -> Vec<MarkupBlock> {
    let bytes = text.as_bytes();
    let n = bytes.len();
    let line_start = |i: usize| i == 0 || bytes.get(i - 1) == Some(&b'\n');
    let fence_at = |i: usize| line_start(i) && bytes.get(i..).is_some_and(|b| b.starts_with(FENCE));
    let line_end = |from: usize| {
        (from..n)
            .find(|&k| bytes.get(k) == Some(&b'\n'))
            .unwrap_or(n)
    };

    let mut blocks = Vec::new();
    let mut i = 0;

    while i < n {
        while bytes.get(i) == Some(&b'\n') {
            i += 1;
        }
        if i >= n {
            break;
        }

        if fence_at(i) {
            let open = i;
            let header_end = line_end(open + FENCE.len());
            let lang = text[open + FENCE.len()..header_end].trim().to_string();
            let code_start = (header_end + 1).min(n);

            let Some(close) = (code_start..n).find(|&k| fence_at(k)) else {
                errors.push(MarkupError::new(
                    ViolationCode::TextBadCodefence,
                    "Unterminated code fence",
                    open,
                ));
                blocks.push(MarkupBlock::Paragraph {
                    c: parse_inline(&text[open..], open, errors),
                });
                break;
            };

            let code = &text[code_start..close];
            let code = code.strip_suffix('\n').unwrap_or(code);
            blocks.push(MarkupBlock::CodeFence {
                lang,
                code: code.to_string(),
            });
            i = (line_end(close + FENCE.len()) + 1).min(n);
            continue;
        }

        let start = i;
        while i < n {
            if bytes.get(i) == Some(&b'\n') {
                if bytes.get(i + 1) == Some(&b'\n') {
                    break;
                }
                i += 1;
                continue;
            }
            if fence_at(i) {
                break;
            }
            i += 1;
        }

        let (folded, offsets) = fold_lines(&text[start..i]);
        let mut local = Vec::new();
        let c = parse_inline(&folded, 0, &mut local);
        errors.extend(local.into_iter().map(|mut error| {
            error.pos = start + offsets.get(error.pos).copied().unwrap_or(i - start);
            error
        }));
        blocks.push(MarkupBlock::Paragraph { c });
    }

    blocks
}

/// Join a paragraph's lines with single spaces, each line trimmed.
///
/// Also returns, for every byte of the folded text, its offset in `raw`
/// (plus one trailing entry for the end), so errors found in the folded
/// text can point back into the input.
fn fold_lines(raw: &str) -> (String, Vec<usize>) {
    let mut joined = String::with_capacity(raw.len());
    let mut offsets = Vec::with_capacity(raw.len() + 1);
    let mut line_start = 0;

    for (k, line) in raw.split('\n').enumerate() {
        if k > 0 {
            joined.push(' ');
            offsets.push(line_start - 1);
        }
        let lead = line.len() - line.trim_start().len();
        let body = line.trim();
        joined.push_str(body);
        offsets.extend((0..body.len()).map(|b| line_start + lead + b));
        line_start += line.len() + 1;
    }

    let lead = joined.len() - joined.trim_start().len();
    let kept = joined.trim().len();
    let mut offsets: Vec<usize> = offsets.into_iter().skip(lead).take(kept).collect();
    offsets.push(raw.len());
    (joined[lead..lead + kept].to_string(), offsets)
}

// =============================================================================
// INLINE
// =============================================================================

fn push_text(out: &mut Vec<Inline>, s: &str) {
    if s.is_empty() {
        return;
    }
    if let Some(Inline::Text { s: prev }) = out.last_mut() {
        prev.push_str(s);
    } else {
        out.push(Inline::text(s));
    }
}

/// Parse one paragraph of inline content. `base` is the byte offset of `s`
/// in the enclosing input, used for error positions.
fn parse_inline(s: &str, base: usize, errors: &mut Vec<MarkupError>) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut i = 0;

    while let Some(ch) = s[i..].chars().next() {
        let rest = &s[i..];
        let pos = base + i;

        match ch {
            '`' | '$' => {
                let Some(j) = rest[1..].find(ch) else {
                    let what = if ch == '`' { "code" } else { "math" };
                    errors.push(MarkupError::new(
                        ViolationCode::TextUnbalancedDelims,
                        format!("Unterminated inline {}", what),
                        pos,
                    ));
                    push_text(&mut out, rest);
                    break;
                };
                let inner = rest[1..=j].to_string();
                out.push(if ch == '`' {
                    Inline::Code { s: inner }
                } else {
                    Inline::Math { s: inner }
                });
                i += j + 2;
            }
            '*' if rest.starts_with("**") => {
                let Some(j) = rest[2..].find("**") else {
                    errors.push(MarkupError::new(
                        ViolationCode::TextUnbalancedDelims,
                        "Unterminated strong (**)",
                        pos,
                    ));
                    push_text(&mut out, rest);
                    break;
                };
                let c = parse_inline(&rest[2..2 + j], pos + 2, errors);
                out.push(Inline::Strong { c });
                i += j + 4;
            }
            '*' | '_' => match rest[1..].find(ch) {
                Some(j) => {
                    let c = parse_inline(&rest[1..=j], pos + 1, errors);
                    out.push(Inline::Emph { c });
                    i += j + 2;
                }
                None => {
                    push_text(&mut out, &rest[..1]);
                    i += 1;
                }
            },
            '[' => match parse_link(rest, pos, errors) {
                Some((link, consumed)) => {
                    out.push(link);
                    i += consumed;
                }
                None => {
                    push_text(&mut out, "[");
                    i += 1;
                }
            },
            _ => {
                push_text(&mut out, &rest[..ch.len_utf8()]);
                i += ch.len_utf8();
            }
        }
    }

    out
}

/// `[label](url)` at the start of `rest`. Returns the link and the number of
/// bytes it spans, or `None` when `[` is literal.
fn parse_link(
    rest: &str,
    pos: usize,
    errors: &mut Vec<MarkupError>,
) -> Option<(Inline, usize)> {
    let close = rest[1..].find(']')? + 1;
    if rest.as_bytes().get(close + 1) != Some(&b'(') {
        return None;
    }
    let Some(end) = rest[close + 2..].find(')').map(|j| close + 2 + j) else {
        errors.push(MarkupError::new(
            ViolationCode::TextLinkSyntax,
            "Unterminated link url",
            pos,
        ));
        return None;
    };
    let c = parse_inline(&rest[1..close], pos + 1, errors);
    let url = rest[close + 2..end].to_string();
    Some((Inline::Link { c, url }, end + 1))
}

// =============================================================================
// TESTS
// =============================================================================

use crate::frame::{FrameDocument, Node};
use crate::markup::{self, MarkupMode};
use crate::types::{Diagnostics, Violation, ViolationCode};
use std::collections::BTreeSet;

/// Free-text fields parsed in the node's `text.format`.
const MARKUP_FIELDS: [&str; 3] = ["text", "summary", "desc"];

/// Check every node that declares a `text.format`.
///
/// Nodes without one are plain text and are not parsed; formats in
/// `passthrough` are emitted verbatim by the renderers and are skipped here
/// too. Frames that are not mappings are left to GF0.
pub fn check_markup(docs: &[FrameDocument], passthrough: &BTreeSet<String>) -> Diagnostics {
    let mut violations = Vec::new();
    for doc in docs {
        let Ok(frame) = doc.frame() else {
            continue;
        };
        for node in &frame.nodes {
            violations.extend(check_node(node, &doc.path, passthrough));
        }
    }
    tracing::debug!(frames = docs.len(), violations = violations.len(), "markup checked");
    (violations, Vec::new())
}

fn check_node(node: &Node, path: &str, passthrough: &BTreeSet<String>) -> Vec<Violation> {
    let Some(format) = node.resolve_text("text.format") else {
        return Vec::new();
    };
    if passthrough.contains(format) {
        return Vec::new();
    }
    if MarkupMode::from_format(format).is_none() {
        return vec![
            Violation::new(
                ViolationCode::TextBadTextFormat,
                path,
                format!("unknown text.format: {}", format),
            )
            .with_node(&node.id),
        ];
    }

    let mut violations = Vec::new();
    for field in MARKUP_FIELDS {
        let Some(value) = node.resolve_text(field) else {
            continue;
        };
        let (_, errors) = markup::parse(value, format);
        for error in errors {
            violations.push(
                Violation::new(
                    error.code,
                    path,
                    format!("{}: {} at {}", field, error.code, error.pos),
                )
                .with_node(&node.id),
            );
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::DEFAULT_PASSTHROUGH_FORMATS;
    use serde_json::{Value, json};

    fn doc(nodes: Value) -> FrameDocument {
        let value = json!({"graph_id": "g", "version": "1", "attrs": [], "nodes": nodes,
                           "edges": [], "meta": []});
        FrameDocument {
            path: "f.yml".to_string(),
            bytes: Vec::new(),
            value,
        }
    }

    fn check(docs: &[FrameDocument]) -> Diagnostics {
        let defaults = DEFAULT_PASSTHROUGH_FORMATS.iter().map(|s| s.to_string()).collect();
        check_markup(docs, &defaults)
    }

    fn fmt(format: &str) -> Value {
        json!([{"key": "text.format", "value": format}])
    }

    #[test]
    fn nodes_without_format_are_not_parsed() {
        let (v, w) = check(&[doc(json!([{"id": "a", "text": "`open"}]))]);
        assert!(v.is_empty());
        assert!(w.is_empty());
    }

    #[test]
    fn passthrough_is_skipped() {
        let d = doc(json!([{"id": "a", "text": "<div>", "attrs": fmt("tex-block")}]));
        assert!(check(&[d]).0.is_empty());
    }

    #[test]
    fn configured_passthrough_replaces_the_defaults() {
        let custom = doc(json!([{"id": "a", "text": "<div>", "attrs": fmt("html-raw")}]));
        let only_custom: BTreeSet<String> = ["html-raw".to_string()].into_iter().collect();
        assert!(check_markup(&[custom.clone()], &only_custom).0.is_empty());
        assert_eq!(check(&[custom]).0[0].code, ViolationCode::TextBadTextFormat);

        let tex = doc(json!([{"id": "b", "text": "x", "attrs": fmt("tex-block")}]));
        assert_eq!(
            check_markup(&[tex], &only_custom).0[0].message,
            "unknown text.format: tex-block"
        );
    }

    #[test]
    fn unknown_format_is_one_violation() {
        let d = doc(json!([{"id": "a", "text": "`x", "attrs": fmt("rst")}]));
        let (v, _) = check(&[d]);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].code, ViolationCode::TextBadTextFormat);
        assert_eq!(v[0].message, "unknown text.format: rst");
        assert_eq!(v[0].node_id.as_deref(), Some("a"));
    }

    #[test]
    fn parser_errors_name_field_and_position() {
        let d = doc(json!([{"id": "a", "summary": "ok `x", "desc": "[l](u",
                            "attrs": fmt("md-inline")}]));
        let (v, _) = check(&[d]);
        let got: Vec<_> = v.iter().map(|x| (x.code, x.message.clone())).collect();
        assert_eq!(
            got,
            vec![
                (
                    ViolationCode::TextUnbalancedDelims,
                    "summary: TEXT.E.UNBALANCED_DELIMS at 3".to_string()
                ),
                (ViolationCode::TextLinkSyntax, "desc: TEXT.E.LINK_SYNTAX at 0".to_string()),
            ]
        );
    }

    #[test]
    fn html_is_reported_even_in_plain() {
        let d = doc(json!([{"id": "a", "text": "x <br/> y", "attrs": fmt("plain")}]));
        let (v, _) = check(&[d]);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].code, ViolationCode::TextHtmlDisallowed);
        assert_eq!(v[0].message, "text: TEXT.E.HTML_DISALLOWED at 2");
    }
}

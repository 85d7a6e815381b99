use crate::frame::{FrameDocument, Node};
use crate::primitives::{PUBTEX_AUTHORING_FORMAT, PUBTEX_IR_KIND};
use crate::pubtex::{Segment, forbidden_sequence, parse_tex_inline_v0};
use crate::types::{Diagnostics, Violation, ViolationCode};
use serde_json::Value;

/// Node fields that may carry a `pub.tex.<field>` attribute.
const PUBTEX_FIELDS: [&str; 3] = ["summary", "text", "body"];

/// Check PubTeX authoring strings and canonical IR attributes on every node.
pub fn check_pub_tex(docs: &[FrameDocument]) -> Diagnostics {
    let mut violations = Vec::new();
    for doc in docs {
        let Ok(frame) = doc.frame() else {
            continue;
        };
        for node in &frame.nodes {
            let mut node_check = NodeCheck {
                node,
                path: &doc.path,
                violations: &mut violations,
            };
            for field in PUBTEX_FIELDS {
                node_check.authoring(field);
            }
            for field in PUBTEX_FIELDS {
                node_check.canonical(field);
            }
        }
    }
    tracing::debug!(frames = docs.len(), violations = violations.len(), "pub-tex checked");
    (violations, Vec::new())
}

struct NodeCheck<'a> {
    node: &'a Node,
    path: &'a str,
    violations: &'a mut Vec<Violation>,
}

impl NodeCheck<'_> {
    fn push(&mut self, code: ViolationCode, message: String) {
        self.violations
            .push(Violation::new(code, self.path, message).with_node(&self.node.id));
    }

    fn policy(&mut self, key: &str, segments: &[Segment]) {
        for segment in segments {
            if let Some(reason) = forbidden_sequence(segment) {
                self.push(
                    ViolationCode::PubTexForbiddenControlSeq,
                    format!("{} {}", key, reason),
                );
            }
        }
    }

    /// `pub.tex.<field>.format = tex-inline-v0` with its authoring string.
    fn authoring(&mut self, field: &str) {
        let key = format!("pub.tex.{}", field);
        let format = self
            .node
            .attr(&format!("{}.format", key))
            .and_then(|a| a.as_str());
        if format != Some(PUBTEX_AUTHORING_FORMAT) {
            return;
        }

        let Some(src) = self
            .node
            .attr(&key)
            .and_then(|a| a.as_str())
            .filter(|s| !s.is_empty())
        else {
            self.push(
                ViolationCode::PubTexParseError,
                format!("missing {} with format={}", key, PUBTEX_AUTHORING_FORMAT),
            );
            return;
        };

        let (segments, errors) = parse_tex_inline_v0(src);
        for error in errors {
            self.push(
                ViolationCode::PubTexParseError,
                format!("{}: {} at {}", key, error.code, error.pos),
            );
        }
        self.policy(&key, &segments);
    }

    /// `pub.tex.<field>` holding canonical IR, as a mapping or as JSON text.
    fn canonical(&mut self, field: &str) {
        let key = format!("pub.tex.{}", field);
        let Some(attr) = self.node.attr(&key) else {
            return;
        };

        let ir = match &attr.value {
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(v) => v,
                Err(e) => {
                    if attr.vtype.as_deref() == Some("json") {
                        self.push(
                            ViolationCode::PubTexJsonMalformed,
                            format!("{}: malformed JSON: {}", key, e),
                        );
                    }
                    return;
                }
            },
            other => other.clone(),
        };
        if ir.get("kind").and_then(Value::as_str) != Some(PUBTEX_IR_KIND) {
            return;
        }

        // Malformed entries are skipped; only well-formed segments can be
        // emitted, so only they are policed.
        let segments: Vec<Segment> = ir
            .get("nodes")
            .and_then(Value::as_array)
            .map(|nodes| {
                nodes
                    .iter()
                    .filter_map(|n| serde_json::from_value(n.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();
        self.policy(&format!("{} (JSON IR)", key), &segments);
    }
}

use crate::frame::FrameDocument;
use crate::types::{Diagnostics, Violation, ViolationCode};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static FRAME_URL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9+.-]*://").ok());

/// True for `scheme://...` references.
#[must_use]
pub fn is_frame_url(value: &str) -> bool {
    FRAME_URL.as_ref().is_some_and(|re| re.is_match(value))
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn list<'a>(frame: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> + 'a {
    frame
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

/// Resolve FrameURL references against the `graph_id`s of the batch.
///
/// Node-level `target_graph_id` values that name no frame in the batch are
/// external references and pass.
pub fn check_references(docs: &[FrameDocument]) -> Diagnostics {
    let present: BTreeSet<&str> = docs
        .iter()
        .filter_map(|d| non_empty_str(d.value.get("graph_id")))
        .collect();
    let unresolved = |r: &str| is_frame_url(r) && !present.contains(r);

    let mut violations = Vec::new();
    for doc in docs {
        if !doc.value.is_object() {
            continue;
        }
        let path = doc.path.as_str();
        let frame = &doc.value;

        let Some(gid) = non_empty_str(frame.get("graph_id")) else {
            violations.push(Violation::new(
                ViolationCode::RefMissingGraphId,
                path,
                "missing graph_id",
            ));
            continue;
        };

        let has_root = list(frame, "nodes").any(|n| n.get("id").and_then(Value::as_str) == Some(gid));
        if !has_root {
            violations.push(Violation::new(
                ViolationCode::RefRootNodeMissing,
                path,
                format!("root node with id={} not found", gid),
            ));
        }

        for prop in list(frame, "properties") {
            if prop.get("key").and_then(Value::as_str) != Some("depends_on") {
                continue;
            }
            if let Some(dep) = non_empty_str(prop.get("value")).filter(|v| unresolved(*v)) {
                violations.push(Violation::new(
                    ViolationCode::RefUnresolvedDependsOn,
                    path,
                    format!("unresolved depends_on: {}", dep),
                ));
            }
        }

        if let Some(target) = non_empty_str(frame.get("target_graph_id")).filter(|v| unresolved(*v)) {
            violations.push(Violation::new(
                ViolationCode::RefUnresolvedTargetGraphId,
                path,
                format!("unresolved target_graph_id: {}", target),
            ));
        }

        for edge in list(frame, "edges") {
            let Some(from) = non_empty_str(edge.get("from")) else {
                continue;
            };
            if !is_frame_url(from) || from == gid {
                continue;
            }
            let edge_id = non_empty_str(edge.get("id"));
            if !present.contains(from) {
                violations.push(
                    Violation::new(
                        ViolationCode::RefUnresolvedEdgeFrom,
                        path,
                        format!("unresolved edge.from: {}", from),
                    )
                    .with_edge(edge_id),
                );
            }
            violations.push(
                Violation::new(
                    ViolationCode::RefEdgeFromNotGraphId,
                    path,
                    format!("edge.from={} != graph_id={}", from, gid),
                )
                .with_edge(edge_id),
            );
        }
    }

    tracing::debug!(frames = docs.len(), violations = violations.len(), "references checked");
    (violations, Vec::new())
}

//! SpecFrame-K1: node-kind, attribute, edge-type and `contains`-hierarchy
//! rules for specification documents.

use super::ProfileValidator;
use crate::frame::Frame;
use crate::primitives::{
    ALLOWED_EDGE_TYPES, ALLOWED_NODE_KINDS, ALLOWED_STATUS, CONTAINS, ROOT_KIND, SPECFRAME_K1,
    SPEC_REF_KIND, required_attrs,
};
use crate::types::{Violation, ViolationCode};
use std::collections::{BTreeMap, BTreeSet};

/// The SpecFrame-K1 profile validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecFrameK1;

impl ProfileValidator for SpecFrameK1 {
    fn profile(&self) -> &'static str {
        SPECFRAME_K1
    }

    fn validate(&self, frame: &Frame, path: &str) -> Vec<Violation> {
        let Some(root) = frame.root() else {
            return vec![Violation::new(
                ViolationCode::SpecBadRoot,
                path,
                "missing root node with id == graph_id",
            )];
        };
        if root.kind() != ROOT_KIND {
            return vec![
                Violation::new(ViolationCode::SpecBadRoot, path, "root kind must be 'spec'")
                    .with_node(&root.id),
            ];
        }

        let mut violations = check_nodes(frame, path);
        violations.extend(check_edges(frame, path));

        if let Some(at) = find_contains_cycle(&root.id, &frame.contains_children()) {
            violations.push(
                Violation::new(ViolationCode::SpecContainsCycle, path, "contains cycle detected")
                    .with_node(at),
            );
        }

        tracing::debug!(path, violations = violations.len(), "specframe-k1 checked");
        violations
    }
}

fn check_nodes(frame: &Frame, path: &str) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut seen = BTreeSet::new();

    for node in &frame.nodes {
        if !seen.insert(node.id.as_str()) {
            continue;
        }
        let kind = node.resolve_str("kind");
        let Some(kind) = kind.filter(|k| ALLOWED_NODE_KINDS.contains(k)) else {
            violations.push(
                Violation::new(
                    ViolationCode::SpecBadKind,
                    path,
                    format!("unknown kind: {}", kind.unwrap_or("<none>")),
                )
                .with_node(&node.id),
            );
            continue;
        };

        for attr in required_attrs(kind) {
            if node.resolve_text(attr).is_none() {
                violations.push(
                    Violation::new(
                        ViolationCode::SpecMissingRequiredAttr,
                        path,
                        format!("missing required attr {} for kind {}", attr, kind),
                    )
                    .with_node(&node.id),
                );
            }
        }

        if kind != SPEC_REF_KIND {
            let status = node.resolve_text("status");
            if !status.is_some_and(|s| ALLOWED_STATUS.contains(&s)) {
                violations.push(
                    Violation::new(
                        ViolationCode::SpecBadStatus,
                        path,
                        format!("bad or missing status: {}", status.unwrap_or("<none>")),
                    )
                    .with_node(&node.id),
                );
            }
        }
    }
    violations
}

fn check_edges(frame: &Frame, path: &str) -> Vec<Violation> {
    let mut violations = Vec::new();
    // First assigned parent is kept.
    let mut parent_of: BTreeMap<&str, &str> = BTreeMap::new();
    let mut reported: BTreeSet<&str> = BTreeSet::new();

    for edge in &frame.edges {
        let edge_type = edge.edge_type.as_deref();
        if !edge_type.is_some_and(|t| ALLOWED_EDGE_TYPES.contains(&t)) {
            violations.push(
                Violation::new(
                    ViolationCode::SpecBadEdgeType,
                    path,
                    format!("unknown edge type: {}", edge_type.unwrap_or("<none>")),
                )
                .with_edge(edge.id.as_deref()),
            );
            continue;
        }
        if edge_type != Some(CONTAINS) {
            continue;
        }
        let (Some(from), Some(to)) = (edge.from.as_deref(), edge.to.as_deref()) else {
            continue;
        };
        match parent_of.get(to) {
            Some(&first) if first != from && reported.insert(to) => violations.push(
                Violation::new(
                    ViolationCode::SpecContainsMultiParent,
                    path,
                    format!("node has multiple parents via contains: {} and {}", first, from),
                )
                .with_node(to)
                .with_edge(edge.id.as_deref()),
            ),
            Some(_) => {}
            None => {
                parent_of.insert(to, from);
            }
        }
    }
    violations
}

/// Depth-first walk from `root`; returns the first node reached while it is
/// still on the walk stack. Nodes unreachable from `root` are never visited.
fn find_contains_cycle(root: &str, children: &BTreeMap<String, Vec<String>>) -> Option<String> {
    let mut visiting: BTreeSet<&str> = BTreeSet::new();
    let mut visited: BTreeSet<&str> = BTreeSet::new();
    let mut stack: Vec<(&str, usize)> = vec![(root, 0)];
    visiting.insert(root);

    while let Some(&(node, next)) = stack.last() {
        let kid = children.get(node).and_then(|kids| kids.get(next));
        match kid {
            Some(kid) => {
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                let kid = kid.as_str();
                if visiting.contains(kid) {
                    return Some(kid.to_string());
                }
                if visited.insert(kid) {
                    visiting.insert(kid);
                    stack.push((kid, 0));
                }
            }
            None => {
                visiting.remove(node);
                visited.insert(node);
                stack.pop();
            }
        }
    }
    None
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn spec_root() -> Value {
        json!({"id": "spec://t", "kind": "spec", "title": "T", "status": "normative",
               "summary": "S", "profile": "specframe-k1"})
    }

    fn frame(nodes: Value, edges: Value) -> Frame {
        let mut all = vec![spec_root()];
        all.extend(nodes.as_array().cloned().unwrap_or_default());
        Frame::from_value(&json!({
            "graph_id": "spec://t", "version": "1", "attrs": [],
            "nodes": all, "edges": edges, "meta": []
        }))
        .expect("frame")
    }

    fn section(id: &str) -> Value {
        json!({"id": id, "kind": "section", "title": id, "status": "informative"})
    }

    fn codes(v: &[Violation]) -> Vec<ViolationCode> {
        v.iter().map(|x| x.code).collect()
    }

    #[test]
    fn clean_frame_has_no_violations() {
        let f = frame(
            json!([section("a"), section("b")]),
            json!([
                {"from": "spec://t", "to": "a", "type": "contains"},
                {"from": "a", "to": "b", "type": "contains"}
            ]),
        );
        assert!(SpecFrameK1.validate(&f, "p").is_empty());
    }

    #[test]
    fn root_kind_resolved_through_attrs() {
        let f = Frame::from_value(&json!({
            "graph_id": "r",
            "nodes": [{"id": "r", "attrs": [{"key": "kind", "value": "section"}]}],
            "edges": []
        }))
        .expect("frame");
        let v = SpecFrameK1.validate(&f, "p");
        assert_eq!(codes(&v), vec![ViolationCode::SpecBadRoot]);
        assert_eq!(v[0].node_id.as_deref(), Some("r"));
    }

    #[test]
    fn missing_root_is_single_violation() {
        let f = Frame::from_value(&json!({"graph_id": "nope", "nodes": [section("a")]}))
            .expect("frame");
        assert_eq!(codes(&SpecFrameK1.validate(&f, "p")), vec![ViolationCode::SpecBadRoot]);
    }

    #[test]
    fn unknown_kind_skips_further_node_checks() {
        let f = frame(json!([{"id": "x", "kind": "widget"}]), json!([]));
        let v = SpecFrameK1.validate(&f, "p");
        assert_eq!(codes(&v), vec![ViolationCode::SpecBadKind]);
        assert_eq!(v[0].message, "unknown kind: widget");
    }

    #[test]
    fn required_attrs_then_status() {
        let f = frame(json!([{"id": "t1", "kind": "term"}]), json!([]));
        let v = SpecFrameK1.validate(&f, "p");
        assert_eq!(
            codes(&v),
            vec![
                ViolationCode::SpecMissingRequiredAttr,
                ViolationCode::SpecMissingRequiredAttr,
                ViolationCode::SpecBadStatus
            ]
        );
        assert_eq!(v[0].message, "missing required attr label for kind term");
        assert_eq!(v[1].message, "missing required attr status for kind term");
    }

    #[test]
    fn spec_ref_needs_no_status() {
        let f = frame(
            json!([{"id": "r1", "kind": "spec_ref", "target_graph_id": "spec://other"}]),
            json!([]),
        );
        assert!(SpecFrameK1.validate(&f, "p").is_empty());
    }

    #[test]
    fn bad_edge_type_is_reported_and_skipped() {
        let f = frame(
            json!([section("a")]),
            json!([{"id": "e9", "from": "spec://t", "to": "a", "type": "owns"}]),
        );
        let v = SpecFrameK1.validate(&f, "p");
        assert_eq!(codes(&v), vec![ViolationCode::SpecBadEdgeType]);
        assert_eq!(v[0].edge_id.as_deref(), Some("e9"));
    }

    #[test]
    fn two_cycle_yields_exactly_one_violation() {
        let f = frame(
            json!([section("a"), section("b")]),
            json!([
                {"from": "spec://t", "to": "a", "type": "contains"},
                {"from": "a", "to": "b", "type": "contains"},
                {"from": "b", "to": "a", "type": "contains"}
            ]),
        );
        let v = SpecFrameK1.validate(&f, "p");
        let cycles: Vec<_> = v
            .iter()
            .filter(|x| x.code == ViolationCode::SpecContainsCycle)
            .collect();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].node_id.as_deref(), Some("a"));
    }

    #[test]
    fn unreachable_cycle_is_not_reported() {
        let f = frame(
            json!([section("a"), section("b")]),
            json!([
                {"from": "a", "to": "b", "type": "contains"},
                {"from": "b", "to": "a", "type": "contains"}
            ]),
        );
        let v = SpecFrameK1.validate(&f, "p");
        assert!(!v.iter().any(|x| x.code == ViolationCode::SpecContainsCycle));
    }

    #[test]
    fn extra_parents_yield_one_multi_parent() {
        let f = frame(
            json!([section("a"), section("b"), section("c")]),
            json!([
                {"from": "spec://t", "to": "a", "type": "contains"},
                {"from": "spec://t", "to": "b", "type": "contains"},
                {"from": "a", "to": "c", "type": "contains"},
                {"from": "a", "to": "c", "type": "contains"},
                {"from": "b", "to": "c", "type": "contains"},
                {"from": "spec://t", "to": "c", "type": "contains"}
            ]),
        );
        let v = SpecFrameK1.validate(&f, "p");
        assert_eq!(codes(&v), vec![ViolationCode::SpecContainsMultiParent]);
        assert_eq!(v[0].node_id.as_deref(), Some("c"));
        assert_eq!(v[0].message, "node has multiple parents via contains: a and b");
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let mut children = BTreeMap::new();
        children.insert("r".to_string(), vec!["a".to_string(), "b".to_string()]);
        children.insert("a".to_string(), vec!["c".to_string()]);
        children.insert("b".to_string(), vec!["c".to_string()]);
        assert_eq!(find_contains_cycle("r", &children), None);
    }

    #[test]
    fn self_loop_on_root_is_a_cycle() {
        let mut children = BTreeMap::new();
        children.insert("r".to_string(), vec!["r".to_string()]);
        assert_eq!(find_contains_cycle("r", &children), Some("r".to_string()));
    }
}

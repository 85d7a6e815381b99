//! # GF0 Structural Validator
//!
//! Checks the generic graph-frame shape every frame must satisfy, before any
//! profile semantics apply.
//!
//! Violation order is part of the contract:
//! 1. missing top-level fields (in `GF0_REQUIRED_FIELDS` order)
//! 2. `graph_id`, then `version`, as non-empty strings
//! 3. list-typed collections (in `GF0_LIST_FIELDS` order)
//! 4. node ids, in input order
//! 5. edge types and endpoints, in input order
//! 6. nested `meta[]` frames, recursively, in input order
//!
//! Only two conditions cut a level short: an exceeded meta-depth budget and a
//! value that is not a mapping.

use crate::primitives::{DEFAULT_MAX_META_DEPTH, GF0_LIST_FIELDS, GF0_REQUIRED_FIELDS};
use crate::types::{Violation, ViolationCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Resource limits for structural validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Deepest allowed nesting of `meta[]` frames (the top frame is depth 0).
    pub max_meta_depth: usize,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_meta_depth: DEFAULT_MAX_META_DEPTH,
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Edge ids are stringified when they are scalars; empty ids are dropped.
fn edge_id(edge: &serde_json::Map<String, Value>) -> Option<String> {
    match edge.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
    .filter(|s| !s.is_empty())
}

/// Validate a top-level frame.
pub fn validate_gf0(frame: &Value, path: &str, budget: &Budget) -> Vec<Violation> {
    validate_gf0_at_depth(frame, path, budget, 0)
}

/// Validate a frame nested `depth` levels below the top frame.
pub fn validate_gf0_at_depth(
    frame: &Value,
    path: &str,
    budget: &Budget,
    depth: usize,
) -> Vec<Violation> {
    if depth > budget.max_meta_depth {
        return vec![Violation::new(
            ViolationCode::Gf0MetaDepthExceeded,
            path,
            format!("meta depth exceeded: {} > {}", depth, budget.max_meta_depth),
        )];
    }

    let Some(obj) = frame.as_object() else {
        return vec![Violation::new(
            ViolationCode::Gf0BadFrame,
            path,
            "frame is not a mapping",
        )];
    };

    let mut violations = Vec::new();

    for field in GF0_REQUIRED_FIELDS {
        if !obj.contains_key(field) {
            violations.push(Violation::new(
                ViolationCode::Gf0MissingField,
                path,
                format!("missing field: {}", field),
            ));
        }
    }

    if non_empty_str(obj.get("graph_id")).is_none() {
        violations.push(Violation::new(
            ViolationCode::Gf0MissingGraphId,
            path,
            "graph_id must be non-empty string",
        ));
    }
    if non_empty_str(obj.get("version")).is_none() {
        violations.push(Violation::new(
            ViolationCode::Gf0MissingVersion,
            path,
            "version must be non-empty string",
        ));
    }

    for field in GF0_LIST_FIELDS {
        if obj.get(field).is_some_and(|v| !v.is_array()) {
            violations.push(Violation::new(
                ViolationCode::Gf0BadFieldType,
                path,
                format!("{} must be a list", field),
            ));
        }
    }

    let list = |key: &str| {
        obj.get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    };

    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for node in list("nodes").iter().filter_map(Value::as_object) {
        let Some(id) = non_empty_str(node.get("id")) else {
            violations.push(Violation::new(
                ViolationCode::Gf0BadFieldType,
                path,
                "node.id must be non-empty string",
            ));
            continue;
        };
        if !seen.insert(id) {
            violations.push(
                Violation::new(ViolationCode::Gf0DupNodeId, path, "duplicate node id")
                    .with_node(id),
            );
        }
    }

    for edge in list("edges").iter().filter_map(Value::as_object) {
        if non_empty_str(edge.get("type")).is_none() {
            violations.push(Violation::new(
                ViolationCode::Gf0BadFieldType,
                path,
                "edge.type must be non-empty string",
            ));
        }
        let id = edge_id(edge);
        for end in ["from", "to"] {
            if let Some(target) = non_empty_str(edge.get(end)) {
                if !seen.contains(target) {
                    violations.push(
                        Violation::new(
                            ViolationCode::Gf0EdgeMissingEndpoint,
                            path,
                            format!("edge.{} missing node: {}", end, target),
                        )
                        .with_edge(id.as_deref()),
                    );
                }
            }
        }
    }

    for nested in list("meta") {
        violations.extend(validate_gf0_at_depth(nested, path, budget, depth + 1));
    }

    tracing::trace!(path, depth, violations = violations.len(), "gf0 level checked");
    violations
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn codes(v: &[Violation]) -> Vec<ViolationCode> {
        v.iter().map(|x| x.code).collect()
    }

    fn minimal() -> Value {
        json!({
            "graph_id": "g", "version": "1", "attrs": [],
            "nodes": [{"id": "g", "kind": "spec"}],
            "edges": [], "meta": []
        })
    }

    #[test]
    fn minimal_frame_is_clean() {
        assert!(validate_gf0(&minimal(), "f", &Budget::default()).is_empty());
    }

    #[test]
    fn non_mapping_stops_immediately() {
        let v = validate_gf0(&json!("nope"), "f", &Budget::default());
        assert_eq!(codes(&v), vec![ViolationCode::Gf0BadFrame]);
    }

    #[test]
    fn missing_fields_reported_in_fixed_order() {
        let v = validate_gf0(&json!({"nodes": []}), "f", &Budget::default());
        assert_eq!(
            codes(&v),
            vec![
                ViolationCode::Gf0MissingField,
                ViolationCode::Gf0MissingField,
                ViolationCode::Gf0MissingField,
                ViolationCode::Gf0MissingField,
                ViolationCode::Gf0MissingField,
                ViolationCode::Gf0MissingGraphId,
                ViolationCode::Gf0MissingVersion,
            ]
        );
        assert_eq!(v[0].message, "missing field: graph_id");
        assert_eq!(v[4].message, "missing field: meta");
    }

    #[test]
    fn bad_list_fields_flagged_once_each() {
        let mut f = minimal();
        f["nodes"] = json!({});
        f["meta"] = json!("x");
        let v = validate_gf0(&f, "f", &Budget::default());
        assert_eq!(codes(&v), vec![ViolationCode::Gf0BadFieldType; 2]);
        assert_eq!(v[0].message, "nodes must be a list");
        assert_eq!(v[1].message, "meta must be a list");
    }

    #[test]
    fn duplicate_ids_flag_later_occurrences() {
        let mut f = minimal();
        f["nodes"] = json!([{"id": "a"}, {"id": "a"}, {"id": ""}, {"id": "a"}]);
        let v = validate_gf0(&f, "f", &Budget::default());
        assert_eq!(
            codes(&v),
            vec![
                ViolationCode::Gf0DupNodeId,
                ViolationCode::Gf0BadFieldType,
                ViolationCode::Gf0DupNodeId
            ]
        );
        assert_eq!(v[0].node_id.as_deref(), Some("a"));
    }

    #[test]
    fn both_endpoints_checked_independently() {
        let mut f = minimal();
        f["edges"] = json!([{"id": 7, "from": "x", "to": "y", "type": "contains"}]);
        let v = validate_gf0(&f, "f", &Budget::default());
        assert_eq!(codes(&v), vec![ViolationCode::Gf0EdgeMissingEndpoint; 2]);
        assert_eq!(v[0].message, "edge.from missing node: x");
        assert_eq!(v[1].message, "edge.to missing node: y");
        assert_eq!(v[0].edge_id.as_deref(), Some("7"));
    }

    #[test]
    fn edge_type_checked_before_endpoints() {
        let mut f = minimal();
        f["edges"] = json!([{"from": "g", "to": "zz"}]);
        let v = validate_gf0(&f, "f", &Budget::default());
        assert_eq!(
            codes(&v),
            vec![ViolationCode::Gf0BadFieldType, ViolationCode::Gf0EdgeMissingEndpoint]
        );
    }

    #[test]
    fn meta_recursion_is_bounded() {
        let budget = Budget { max_meta_depth: 1 };
        let mut inner = minimal();
        inner["meta"] = json!([minimal()]);
        let mut outer = minimal();
        outer["meta"] = json!([inner]);
        let v = validate_gf0(&outer, "f", &budget);
        assert_eq!(codes(&v), vec![ViolationCode::Gf0MetaDepthExceeded]);
        assert_eq!(v[0].message, "meta depth exceeded: 2 > 1");
    }

    #[test]
    fn nested_violations_follow_parent_violations() {
        let mut f = minimal();
        f["edges"] = json!([{"from": "g", "to": "missing", "type": "contains"}]);
        f["meta"] = json!([42]);
        let v = validate_gf0(&f, "f", &Budget::default());
        assert_eq!(
            codes(&v),
            vec![ViolationCode::Gf0EdgeMissingEndpoint, ViolationCode::Gf0BadFrame]
        );
    }
}

//! # Pipeline Tier Tests (T0-T5)
//!
//! End-to-end behaviour of the frame pipeline through the public API.
//!
//! ## Tiers
//! - T0: GF0 Structure
//! - T1: SpecFrame-K1 Semantics
//! - T2: InlineMarkup-K1
//! - T3: PubTeX Inline-v0
//! - T4: DocIR Lowering
//! - T5: Rendering

#![allow(clippy::unwrap_used, clippy::panic)]

use framecodex_core::docir::stable_anchor;
use framecodex_core::{
    Block, Budget, FrameDocument, FrameError, KernelCtx, RenderOptions, ViolationCode, build,
    render_latex, render_markdown, run_kernel, validate_gf0,
};
use serde_json::{Value, json};

const DEMO: &str = r#"
graph_id: spec://demo
version: "1"
attrs: []
nodes:
  - id: spec://demo
    kind: spec
    attrs:
      - {key: title, value: Demo Spec}
      - {key: status, value: normative}
      - {key: summary, value: A demo.}
      - {key: profile, value: specframe-k1}
      - {key: doc.authors, value: '["Ada", "Grace"]'}
      - {key: doc.license, value: CC-BY-4.0}
  - id: t1
    kind: term
    attrs:
      - {key: label, value: Frame}
      - {key: status, value: informative}
      - {key: summary, value: A graph of nodes.}
  - id: s1
    kind: section
    attrs:
      - {key: title, value: Intro}
      - {key: status, value: normative}
  - id: c1
    kind: clause
    attrs:
      - {key: label, value: C1}
      - {key: status, value: normative}
      - {key: text, value: Must **hold**.}
edges:
  - {id: e1, type: contains, from: "spec://demo", to: s1}
  - {id: e2, type: contains, from: s1, to: c1}
  - {id: e3, type: contains, from: "spec://demo", to: t1}
meta: []
"#;

fn load(path: &str, yaml: &str) -> FrameDocument {
    FrameDocument::from_bytes(path, yaml.as_bytes().to_vec()).expect("frame parses")
}

fn codes(v: &[framecodex_core::Violation]) -> Vec<ViolationCode> {
    v.iter().map(|x| x.code).collect()
}

fn spec_frame(nodes: Value, edges: Value) -> FrameDocument {
    let mut all = vec![json!({
        "id": "spec://t", "kind": "spec", "title": "T", "status": "normative",
        "summary": "S", "profile": "specframe-k1"
    })];
    all.extend(nodes.as_array().cloned().unwrap_or_default());
    let value = json!({
        "graph_id": "spec://t", "version": "1", "attrs": [],
        "nodes": all, "edges": edges, "meta": []
    });
    let bytes = serde_json::to_vec(&value).expect("serialize");
    FrameDocument::from_bytes("t.json", bytes).expect("json is yaml")
}

// =============================================================================
// TIER T0: GF0 STRUCTURE
// =============================================================================

mod t0_gf0_structure {
    use super::*;

    /// T0.1: Violations follow the fixed check order.
    #[test]
    fn violations_in_contract_order() {
        let frame = json!({"graph_id": "", "nodes": {}});
        let v = validate_gf0(&frame, "f.yml", &Budget::default());
        assert_eq!(
            codes(&v),
            vec![
                ViolationCode::Gf0MissingField,
                ViolationCode::Gf0MissingField,
                ViolationCode::Gf0MissingField,
                ViolationCode::Gf0MissingField,
                ViolationCode::Gf0MissingGraphId,
                ViolationCode::Gf0MissingVersion,
                ViolationCode::Gf0BadFieldType,
            ]
        );
        assert_eq!(v[0].message, "missing field: version");
        assert_eq!(v[6].message, "nodes must be a list");
    }

    /// T0.2: Duplicate ids and dangling endpoints are reported in input order.
    #[test]
    fn duplicates_then_endpoints() {
        let frame = json!({
            "graph_id": "g", "version": "1", "attrs": [], "meta": [],
            "nodes": [{"id": "a"}, {"id": "a"}],
            "edges": [{"id": 7, "type": "contains", "from": "a", "to": "zz"}]
        });
        let v = validate_gf0(&frame, "f.yml", &Budget::default());
        assert_eq!(
            codes(&v),
            vec![ViolationCode::Gf0DupNodeId, ViolationCode::Gf0EdgeMissingEndpoint]
        );
        assert_eq!(v[0].node_id.as_deref(), Some("a"));
        assert_eq!(v[1].edge_id.as_deref(), Some("7"));
        assert_eq!(v[1].message, "edge.to missing node: zz");
    }

    /// T0.3: Nested meta frames past the budget stop with one violation.
    #[test]
    fn meta_depth_budget() {
        let leaf = json!({"graph_id": "g", "version": "1", "attrs": [], "nodes": [],
                          "edges": [], "meta": []});
        let mid = json!({"graph_id": "g", "version": "1", "attrs": [], "nodes": [],
                         "edges": [], "meta": [leaf]});
        let top = json!({"graph_id": "g", "version": "1", "attrs": [], "nodes": [],
                         "edges": [], "meta": [mid]});

        assert!(validate_gf0(&top, "f", &Budget::default()).is_empty());
        let v = validate_gf0(&top, "f", &Budget { max_meta_depth: 1 });
        assert_eq!(codes(&v), vec![ViolationCode::Gf0MetaDepthExceeded]);
    }

    /// T0.4: Non-mapping input is a single violation, not an error.
    #[test]
    fn non_mapping_frame() {
        let doc = load("list.yml", "- a\n- b\n");
        let report = run_kernel(&KernelCtx::default(), "validate_gf0", &[doc]).expect("runs");
        assert!(!report.ok);
        assert_eq!(codes(&report.violations), vec![ViolationCode::Gf0BadFrame]);
    }

    /// T0.5: Malformed YAML is a load error.
    #[test]
    fn malformed_yaml_is_fatal() {
        let result = FrameDocument::from_bytes("bad.yml", b"a: [1, 2\n".to_vec());
        assert!(matches!(result, Err(FrameError::ParseError { .. })));
    }
}

// =============================================================================
// TIER T1: SPECFRAME-K1 SEMANTICS
// =============================================================================

mod t1_specframe {
    use super::*;

    /// T1.1: The demo frame is clean end to end.
    #[test]
    fn demo_frame_is_valid() {
        let report = run_kernel(&KernelCtx::default(), "validate_frame", &[load("demo.yml", DEMO)])
            .expect("runs");
        assert!(report.ok, "{:?}", report.violations);
        assert_eq!(report.receipts["profile"], "specframe-k1");
    }

    /// T1.2: Kind, attribute and status problems are per node.
    #[test]
    fn node_rules() {
        let doc = spec_frame(
            json!([
                {"id": "x", "kind": "widget"},
                {"id": "c", "kind": "clause", "label": "C", "status": "draft"}
            ]),
            json!([]),
        );
        let report = run_kernel(&KernelCtx::default(), "validate_frame", &[doc]).expect("runs");
        assert_eq!(
            codes(&report.violations),
            vec![ViolationCode::SpecBadKind, ViolationCode::SpecBadStatus]
        );
        assert_eq!(report.violations[0].message, "unknown kind: widget");
    }

    /// T1.3: A second parent and a cycle are both found.
    #[test]
    fn hierarchy_rules() {
        let section = |id: &str| json!({"id": id, "kind": "section", "title": id, "status": "normative"});
        let doc = spec_frame(
            json!([section("a"), section("b")]),
            json!([
                {"id": "e1", "type": "contains", "from": "spec://t", "to": "a"},
                {"id": "e2", "type": "contains", "from": "a", "to": "b"},
                {"id": "e3", "type": "contains", "from": "b", "to": "a"}
            ]),
        );
        let report = run_kernel(&KernelCtx::default(), "validate_frame", &[doc]).expect("runs");
        assert_eq!(
            codes(&report.violations),
            vec![ViolationCode::SpecContainsMultiParent, ViolationCode::SpecContainsCycle]
        );
        assert_eq!(report.violations[0].edge_id.as_deref(), Some("e3"));
    }

    /// T1.4: Unknown edge types are rejected.
    #[test]
    fn edge_types() {
        let doc = spec_frame(
            json!([]),
            json!([{"id": "e", "type": "likes", "from": "spec://t", "to": "spec://t"}]),
        );
        let report = run_kernel(&KernelCtx::default(), "validate_frame", &[doc]).expect("runs");
        assert_eq!(codes(&report.violations), vec![ViolationCode::SpecBadEdgeType]);
    }
}

// =============================================================================
// TIER T2: INLINEMARKUP-K1
// =============================================================================

mod t2_markup {
    use super::*;
    use framecodex_core::markup::{parse, to_latex, to_markdown};

    /// T2.1: Block markup reprints unchanged.
    #[test]
    fn md_block_reprints() {
        let src = "Intro *soft* and **hard** `x` $a$ [go](https://e.org).\n\n```rust\nfn f() {}\n```";
        let (doc, errors) = parse(src, "md-block");
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(to_markdown(&doc), format!("{}\n", src));
    }

    /// T2.2: LaTeX printing escapes text and keeps math.
    #[test]
    fn latex_printing() {
        let (doc, _) = parse("50% of $x→y$", "md-inline");
        assert_eq!(to_latex(&doc), "50\\% of $x\\toy$\n");
    }

    /// T2.3: Frame text check reports parser errors per field.
    #[test]
    fn frame_markup_kernel() {
        let doc = spec_frame(
            json!([{"id": "c", "kind": "clause", "label": "C", "status": "normative",
                    "text.format": "md-inline", "text": "see <br> this"}]),
            json!([]),
        );
        let report = run_kernel(&KernelCtx::default(), "validate_markup", &[doc]).expect("runs");
        assert_eq!(codes(&report.violations), vec![ViolationCode::TextHtmlDisallowed]);
        assert_eq!(report.violations[0].message, "text: TEXT.E.HTML_DISALLOWED at 4");
        assert_eq!(report.violations[0].node_id.as_deref(), Some("c"));
    }
}

// =============================================================================
// TIER T3: PUBTEX INLINE-V0
// =============================================================================

mod t3_pubtex {
    use super::*;
    use framecodex_core::{Segment, parse_tex_inline_v0};

    /// T3.1: Tagged blocks become typed segments.
    #[test]
    fn segments() {
        let (nodes, errors) = parse_tex_inline_v0("let {{m:x_1}} in {{c:main()}}");
        assert!(errors.is_empty());
        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[1], Segment::Math { s: "x_1".to_string() });
        assert_eq!(nodes[3], Segment::Code { s: "main()".to_string() });
    }

    /// T3.2: The PubTeX kernel polices authoring strings.
    #[test]
    fn kernel_policy() {
        let doc = spec_frame(
            json!([{"id": "c", "kind": "clause", "label": "C", "status": "normative",
                    "attrs": [
                        {"key": "pub.tex.text.format", "value": "tex-inline-v0"},
                        {"key": "pub.tex.text", "value": "{{m:\\write18}}"}
                    ]}]),
            json!([]),
        );
        let report = run_kernel(&KernelCtx::default(), "validate_pub_tex", &[doc]).expect("runs");
        assert_eq!(codes(&report.violations), vec![ViolationCode::PubTexForbiddenControlSeq]);
    }
}

// =============================================================================
// TIER T4: DOCIR LOWERING
// =============================================================================

mod t4_docir {
    use super::*;

    /// T4.1: The contains walk orders siblings by kind rank.
    #[test]
    fn contains_walk() {
        let doc = load("demo.yml", DEMO);
        let ir = build(&doc.frame().expect("mapping"), &doc.bytes).expect("builds");

        let shape: Vec<(&str, String)> = ir
            .blocks
            .iter()
            .map(|b| match b {
                Block::Heading { level, title, .. } => (b.type_name(), format!("{} {}", level, title)),
                Block::Clause(t) | Block::Definition(t) => (b.type_name(), t.label.clone()),
                other => (other.type_name(), String::new()),
            })
            .collect();
        assert_eq!(
            shape,
            vec![
                ("heading", "1 Demo Spec".to_string()),
                ("heading", "2 Intro".to_string()),
                ("clause", "C1".to_string()),
                ("definition", "Frame".to_string()),
            ]
        );
        assert_eq!(ir.sha256, doc.sha256());
        assert_eq!(ir.front_matter.authors, vec![json!("Ada"), json!("Grace")]);
        assert_eq!(ir.front_matter.license, "CC-BY-4.0");
        assert_eq!(ir.front_matter.profile, "specframe-k1");
    }

    /// T4.2: Anchors depend only on node ids.
    #[test]
    fn anchors_are_id_derived() {
        let doc = load("demo.yml", DEMO);
        let ir = build(&doc.frame().expect("mapping"), &doc.bytes).expect("builds");
        assert_eq!(ir.anchors.len(), 4);
        assert_eq!(ir.anchors["spec://demo"], stable_anchor("spec://demo"));
        assert!(ir.anchors["spec://demo"].starts_with("spec-demo-"));
    }

    /// T4.3: Without contains edges nodes are grouped per kind, refs last.
    #[test]
    fn synthetic_groups_and_references() {
        let doc = spec_frame(
            json!([
                {"id": "p", "kind": "property", "label": "P", "status": "normative"},
                {"id": "t", "kind": "term", "label": "T", "status": "normative", "summary": "s"},
                {"id": "r", "kind": "spec_ref", "label": "Other", "target_graph_id": "spec://o"}
            ]),
            json!([]),
        );
        let ir = build(&doc.frame().expect("mapping"), &doc.bytes).expect("builds");
        let headings: Vec<String> = ir
            .blocks
            .iter()
            .filter_map(|b| match b {
                Block::Heading { title, .. } => Some(title.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(headings, vec!["T", "term", "property", "References"]);
        assert!(matches!(
            ir.blocks.last(),
            Some(Block::ListItem { text }) if text == "Other (spec://o)"
        ));
    }

    /// T4.4: A frame without a root cannot be lowered.
    #[test]
    fn missing_root() {
        let doc = load("x.yml", "graph_id: g\nversion: '1'\nnodes: [{id: a}]\n");
        let result = build(&doc.frame().expect("mapping"), &doc.bytes);
        assert!(matches!(result, Err(FrameError::MissingRoot(g)) if g == "g"));
    }
}

// =============================================================================
// TIER T5: RENDERING
// =============================================================================

mod t5_rendering {
    use super::*;
    use pretty_assertions::assert_eq;

    fn demo_ir() -> framecodex_core::DocIr {
        let doc = load("demo.yml", DEMO);
        build(&doc.frame().expect("mapping"), &doc.bytes).expect("builds")
    }

    /// T5.1: Markdown output is exact.
    #[test]
    fn markdown_document() {
        let expected = format!(
            "# Demo Spec\n<a id=\"{}\"></a>\n\n## Intro\n<a id=\"{}\"></a>\n\n\
             **C1** _(normative)_\n\nMust **hold**.\n\n\
             **Frame** _(informative)_\n\nA graph of nodes.\n",
            stable_anchor("spec://demo"),
            stable_anchor("s1"),
        );
        assert_eq!(render_markdown(&demo_ir(), &RenderOptions::default()), expected);
    }

    /// T5.2: LaTeX output is a full article without a repeated title.
    #[test]
    fn latex_document() {
        let out = render_latex(&demo_ir(), &RenderOptions::default());
        assert!(out.starts_with("\\documentclass[11pt]{article}\n"));
        assert!(out.contains("\\title{Demo Spec}\n"));
        assert!(!out.contains("\\section*{Demo Spec}"));
        assert!(out.contains("\\subsection*{Intro}\n"));
        assert!(out.contains("\\textbf{C1} \\emph{(normative)}\n\nMust \\textbf{hold}.\n"));
        assert!(out.ends_with("\\end{document}\n"));
    }

    /// T5.3: Rendering twice yields identical bytes.
    #[test]
    fn deterministic() {
        let ir = demo_ir();
        let options = RenderOptions::default();
        assert_eq!(render_markdown(&ir, &options), render_markdown(&ir, &options));
        assert_eq!(render_latex(&ir, &options), render_latex(&ir, &options));
    }
}

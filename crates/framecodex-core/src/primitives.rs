//! # Fixed Tables
//!
//! Compiled-in constants for the framecodex pipeline.
//!
//! These tables are immutable at runtime. Every ordering-sensitive step in the
//! pipeline reads its sort keys from here, never from map iteration order.

/// Default recursion budget for nested `meta[]` frames.
pub const DEFAULT_MAX_META_DEPTH: usize = 16;

/// Top-level fields every GF0 frame must carry, in check order.
pub const GF0_REQUIRED_FIELDS: [&str; 6] = ["graph_id", "version", "attrs", "nodes", "edges", "meta"];

/// Top-level fields that must be lists when present, in check order.
pub const GF0_LIST_FIELDS: [&str; 4] = ["attrs", "nodes", "edges", "meta"];

// =============================================================================
// SPECFRAME-K1 PROFILE
// =============================================================================

/// Profile identifier carried by the root node's `profile` attribute.
pub const SPECFRAME_K1: &str = "specframe-k1";

/// Root node kind for SpecFrame-K1.
pub const ROOT_KIND: &str = "spec";

/// Node kinds allowed by SpecFrame-K1.
pub const ALLOWED_NODE_KINDS: [&str; 7] = [
    "spec", "section", "term", "clause", "property", "example", "spec_ref",
];

/// Edge types allowed by SpecFrame-K1.
pub const ALLOWED_EDGE_TYPES: [&str; 6] = [
    "contains",
    "depends_on",
    "defines",
    "refines",
    "refers_to",
    "example_of",
];

/// Allowed `status` values for every kind except `spec_ref`.
pub const ALLOWED_STATUS: [&str; 3] = ["normative", "informative", "experimental"];

/// The hierarchy edge type.
pub const CONTAINS: &str = "contains";

/// Reference nodes are folded into a trailing References section.
pub const SPEC_REF_KIND: &str = "spec_ref";

/// Required attributes per kind, in report order.
#[must_use]
pub fn required_attrs(kind: &str) -> &'static [&'static str] {
    match kind {
        "spec" => &["title", "status", "summary", "profile"],
        "section" => &["title", "status"],
        "term" | "clause" | "property" | "example" => &["label", "status"],
        "spec_ref" => &["target_graph_id"],
        _ => &[],
    }
}

// =============================================================================
// DOCIR ORDERING
// =============================================================================

/// Rank of a kind among siblings; unknown kinds sort last.
#[must_use]
pub fn kind_rank(kind: &str) -> u32 {
    match kind {
        "section" => 10,
        "term" => 20,
        "clause" => 30,
        "property" => 40,
        "example" => 50,
        "spec_ref" => 60,
        _ => 999,
    }
}

/// Deepest heading level any printer emits.
pub const MAX_HEADING_LEVEL: u8 = 6;

/// DocIR schema version written into every document.
pub const DOCIR_VERSION: &str = "0.2.0";

// =============================================================================
// TEXT FORMATS
// =============================================================================

/// Text formats that bypass escaping and markup parsing.
pub const DEFAULT_PASSTHROUGH_FORMATS: [&str; 2] = ["tex-inline", "tex-block"];

/// Authoring format for the PubTeX shortcut.
pub const PUBTEX_AUTHORING_FORMAT: &str = "tex-inline-v0";

/// `kind` tag of the canonical PubTeX IR.
pub const PUBTEX_IR_KIND: &str = "pub-tex-inline-v0";

/// `kind` tag of the InlineMarkup-K1 AST.
pub const MARKUP_IR_KIND: &str = "inline-markup-k1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_allowed_kind_has_a_rank_below_other() {
        for kind in ALLOWED_NODE_KINDS.iter().filter(|k| **k != ROOT_KIND) {
            assert!(kind_rank(kind) < kind_rank("other"), "{kind}");
        }
    }

    #[test]
    fn spec_requires_profile() {
        assert!(required_attrs("spec").contains(&"profile"));
        assert!(required_attrs("unknown").is_empty());
    }
}

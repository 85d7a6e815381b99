//! # Core Type Definitions
//!
//! This module contains the value types shared by every stage of the pipeline:
//! - Diagnostic codes (`ViolationCode`) and values (`Violation`)
//! - The serialized `Report` envelope and its `ToolInfo`
//! - Fatal error types (`FrameError`)
//!
//! ## Determinism Guarantees
//!
//! - Violations are immutable once created; builders consume `self`
//! - Receipts use `BTreeMap` so serialization order is the key order
//! - Codes serialize to fixed dotted strings, never to enum indices

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// =============================================================================
// VIOLATION CODES
// =============================================================================

/// Namespaced diagnostic code.
///
/// The serialized form is the dotted string (`GF0.E.MISSING_FIELD`), which is
/// the only form consumers are allowed to rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ViolationCode {
    // GF0 structural schema
    #[serde(rename = "GF0.E.BAD_FRAME")]
    Gf0BadFrame,
    #[serde(rename = "GF0.E.MISSING_GRAPH_ID")]
    Gf0MissingGraphId,
    #[serde(rename = "GF0.E.MISSING_VERSION")]
    Gf0MissingVersion,
    #[serde(rename = "GF0.E.MISSING_FIELD")]
    Gf0MissingField,
    #[serde(rename = "GF0.E.BAD_FIELD_TYPE")]
    Gf0BadFieldType,
    #[serde(rename = "GF0.E.DUP_NODE_ID")]
    Gf0DupNodeId,
    #[serde(rename = "GF0.E.EDGE_MISSING_ENDPOINT")]
    Gf0EdgeMissingEndpoint,
    #[serde(rename = "GF0.E.META_DEPTH_EXCEEDED")]
    Gf0MetaDepthExceeded,

    // SpecFrame-K1 profile
    #[serde(rename = "SPEC.E.BAD_ROOT")]
    SpecBadRoot,
    #[serde(rename = "SPEC.E.BAD_KIND")]
    SpecBadKind,
    #[serde(rename = "SPEC.E.BAD_EDGE_TYPE")]
    SpecBadEdgeType,
    #[serde(rename = "SPEC.E.MISSING_REQUIRED_ATTR")]
    SpecMissingRequiredAttr,
    #[serde(rename = "SPEC.E.CONTAINS_CYCLE")]
    SpecContainsCycle,
    #[serde(rename = "SPEC.E.CONTAINS_MULTI_PARENT")]
    SpecContainsMultiParent,
    #[serde(rename = "SPEC.E.BAD_STATUS")]
    SpecBadStatus,

    // InlineMarkup-K1 text fields
    #[serde(rename = "TEXT.E.HTML_DISALLOWED")]
    TextHtmlDisallowed,
    #[serde(rename = "TEXT.E.BAD_TEXT_FORMAT")]
    TextBadTextFormat,
    #[serde(rename = "TEXT.E.BAD_CODEFENCE")]
    TextBadCodefence,
    #[serde(rename = "TEXT.E.UNBALANCED_DELIMS")]
    TextUnbalancedDelims,
    #[serde(rename = "TEXT.E.LINK_SYNTAX")]
    TextLinkSyntax,

    // PubTeX Inline-v0
    #[serde(rename = "PUBTEX.E.PARSE_ERROR")]
    PubTexParseError,
    #[serde(rename = "PUBTEX.E.FORBIDDEN_CONTROL_SEQ")]
    PubTexForbiddenControlSeq,
    #[serde(rename = "PUBTEX.E.JSON_MALFORMED")]
    PubTexJsonMalformed,
    #[serde(rename = "PUBTEX.E.BAD_DELIM")]
    PubTexBadDelim,
    #[serde(rename = "PUBTEX.E.BAD_TAG")]
    PubTexBadTag,
    #[serde(rename = "PUBTEX.E.UNKNOWN_TAG")]
    PubTexUnknownTag,

    // FrameURL references
    #[serde(rename = "REF.E.MISSING_GRAPH_ID")]
    RefMissingGraphId,
    #[serde(rename = "REF.E.ROOT_NODE_MISSING")]
    RefRootNodeMissing,
    #[serde(rename = "REF.E.UNRESOLVED_DEPENDS_ON")]
    RefUnresolvedDependsOn,
    #[serde(rename = "REF.E.UNRESOLVED_TARGET_GRAPH_ID")]
    RefUnresolvedTargetGraphId,
    #[serde(rename = "REF.E.UNRESOLVED_EDGE_FROM")]
    RefUnresolvedEdgeFrom,
    #[serde(rename = "REF.E.EDGE_FROM_NOT_GRAPH_ID")]
    RefEdgeFromNotGraphId,

    // Kernel dispatch
    #[serde(rename = "FCX.E.UNKNOWN_KERNEL")]
    FcxUnknownKernel,
}

impl ViolationCode {
    /// The dotted wire form of this code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gf0BadFrame => "GF0.E.BAD_FRAME",
            Self::Gf0MissingGraphId => "GF0.E.MISSING_GRAPH_ID",
            Self::Gf0MissingVersion => "GF0.E.MISSING_VERSION",
            Self::Gf0MissingField => "GF0.E.MISSING_FIELD",
            Self::Gf0BadFieldType => "GF0.E.BAD_FIELD_TYPE",
            Self::Gf0DupNodeId => "GF0.E.DUP_NODE_ID",
            Self::Gf0EdgeMissingEndpoint => "GF0.E.EDGE_MISSING_ENDPOINT",
            Self::Gf0MetaDepthExceeded => "GF0.E.META_DEPTH_EXCEEDED",
            Self::SpecBadRoot => "SPEC.E.BAD_ROOT",
            Self::SpecBadKind => "SPEC.E.BAD_KIND",
            Self::SpecBadEdgeType => "SPEC.E.BAD_EDGE_TYPE",
            Self::SpecMissingRequiredAttr => "SPEC.E.MISSING_REQUIRED_ATTR",
            Self::SpecContainsCycle => "SPEC.E.CONTAINS_CYCLE",
            Self::SpecContainsMultiParent => "SPEC.E.CONTAINS_MULTI_PARENT",
            Self::SpecBadStatus => "SPEC.E.BAD_STATUS",
            Self::TextHtmlDisallowed => "TEXT.E.HTML_DISALLOWED",
            Self::TextBadTextFormat => "TEXT.E.BAD_TEXT_FORMAT",
            Self::TextBadCodefence => "TEXT.E.BAD_CODEFENCE",
            Self::TextUnbalancedDelims => "TEXT.E.UNBALANCED_DELIMS",
            Self::TextLinkSyntax => "TEXT.E.LINK_SYNTAX",
            Self::PubTexParseError => "PUBTEX.E.PARSE_ERROR",
            Self::PubTexForbiddenControlSeq => "PUBTEX.E.FORBIDDEN_CONTROL_SEQ",
            Self::PubTexJsonMalformed => "PUBTEX.E.JSON_MALFORMED",
            Self::PubTexBadDelim => "PUBTEX.E.BAD_DELIM",
            Self::PubTexBadTag => "PUBTEX.E.BAD_TAG",
            Self::PubTexUnknownTag => "PUBTEX.E.UNKNOWN_TAG",
            Self::RefMissingGraphId => "REF.E.MISSING_GRAPH_ID",
            Self::RefRootNodeMissing => "REF.E.ROOT_NODE_MISSING",
            Self::RefUnresolvedDependsOn => "REF.E.UNRESOLVED_DEPENDS_ON",
            Self::RefUnresolvedTargetGraphId => "REF.E.UNRESOLVED_TARGET_GRAPH_ID",
            Self::RefUnresolvedEdgeFrom => "REF.E.UNRESOLVED_EDGE_FROM",
            Self::RefEdgeFromNotGraphId => "REF.E.EDGE_FROM_NOT_GRAPH_ID",
            Self::FcxUnknownKernel => "FCX.E.UNKNOWN_KERNEL",
        }
    }

    /// The subsystem namespace (`GF0`, `SPEC`, `TEXT`, `PUBTEX`, `REF`, `FCX`).
    #[must_use]
    pub fn namespace(self) -> &'static str {
        let s = self.as_str();
        s.split('.').next().unwrap_or(s)
    }
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// VIOLATION
// =============================================================================

/// A single diagnostic produced by a validator.
///
/// Violations are plain values: once built they are only moved or cloned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Namespaced code.
    pub code: ViolationCode,
    /// Source identifier (usually the frame path).
    pub path: String,
    /// Offending node, when the diagnostic is about one node.
    pub node_id: Option<String>,
    /// Offending edge id, when the edge carried one.
    pub edge_id: Option<String>,
    /// Human-readable detail.
    pub message: String,
}

impl Violation {
    /// Create a violation without node or edge attribution.
    #[must_use]
    pub fn new(code: ViolationCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.into(),
            node_id: None,
            edge_id: None,
            message: message.into(),
        }
    }

    /// Attribute the violation to a node.
    #[must_use]
    pub fn with_node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    /// Attribute the violation to an edge. Empty ids are dropped.
    #[must_use]
    pub fn with_edge(mut self, edge_id: Option<&str>) -> Self {
        self.edge_id = edge_id.filter(|id| !id.is_empty()).map(str::to_string);
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.path)?;
        if let Some(node) = &self.node_id {
            write!(f, " node={}", node)?;
        }
        if let Some(edge) = &self.edge_id {
            write!(f, " edge={}", edge)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Every validator exposes this pair: violations first, then warnings.
pub type Diagnostics = (Vec<Violation>, Vec<Violation>);

// =============================================================================
// REPORT
// =============================================================================

/// Identity of the tool and kernel that produced a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub id: String,
    pub kernel: String,
    pub version: String,
}

/// The serialized outcome of one kernel run.
///
/// `ok` is true iff `violations` is empty; warnings never affect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub tool: ToolInfo,
    pub ok: bool,
    pub violations: Vec<Violation>,
    pub warnings: Vec<Violation>,
    /// Content hashes and other provenance strings, ordered by key.
    pub receipts: BTreeMap<String, String>,
}

impl Report {
    /// Assemble a report, deriving `ok` from the violation list.
    #[must_use]
    pub fn new(
        tool: ToolInfo,
        violations: Vec<Violation>,
        warnings: Vec<Violation>,
        receipts: BTreeMap<String, String>,
    ) -> Self {
        Self {
            tool,
            ok: violations.is_empty(),
            violations,
            warnings,
            receipts,
        }
    }

    /// Append another report's diagnostics without reordering either side.
    pub fn merge(&mut self, other: Report) {
        self.violations.extend(other.violations);
        self.warnings.extend(other.warnings);
        self.receipts.extend(other.receipts);
        self.ok = self.violations.is_empty();
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Fatal errors of the framecodex pipeline.
///
/// Diagnostics about frame content are `Violation`s, not errors. A
/// `FrameError` means the pipeline could not run at all.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The source could not be read.
    #[error("I/O error: {0}")]
    IoError(String),

    /// The source is not well-formed YAML or JSON.
    #[error("Parse error in {path}: {message}")]
    ParseError { path: String, message: String },

    /// A typed view was requested over a value that is not a mapping.
    #[error("Frame is not a mapping: {0}")]
    NotAMapping(String),

    /// The frame has no node whose id equals `graph_id`.
    #[error("Root node not found: {0:?}")]
    MissingRoot(String),

    /// A single-frame kernel was run with no frame.
    #[error("No input frame for kernel {0}")]
    MissingInput(String),

    /// A value could not be serialized.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// =============================================================================
// TESTS
// =============================================================================

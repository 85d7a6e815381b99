//! # framecodex-core
//!
//! The deterministic frame pipeline for framecodex - THE LOGIC.
//!
//! A specification is authored as a *frame*: a YAML/JSON graph of typed nodes
//! and edges. This crate validates frames, lowers them to a document
//! intermediate representation and prints that representation as Markdown or
//! LaTeX.
//!
//! ## Pipeline
//!
//! ```text
//! bytes -> FrameDocument -> GF0 -> profile (SpecFrame-K1) -> checks
//!                                   \-> DocIR builder -> Markdown / LaTeX
//! ```
//!
//! - `gf0` checks the generic graph shape
//! - `profile` layers profile semantics on structurally clean frames
//! - `checks` validate free-text markup, PubTeX attributes and cross-frame references
//! - `docir` lowers a frame to ordered, anchored blocks
//! - `render` prints DocIR
//! - `kernel` wraps the validators into reports with content receipts
//!
//! ## Constraints
//!
//! - Pure and synchronous: no I/O outside `FrameDocument::load`
//! - Deterministic: the same bytes always produce the same diagnostics,
//!   anchors, DocIR and output text
//! - Ordered collections only (`BTreeMap`/`BTreeSet`); no hash-order leaks

// =============================================================================
// MODULES
// =============================================================================

pub mod checks;
pub mod docir;
pub mod formats;
pub mod frame;
pub mod gf0;
pub mod kernel;
pub mod markup;
pub mod primitives;
pub mod profile;
pub mod pubtex;
pub mod render;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Diagnostics, FrameError, Report, ToolInfo, Violation, ViolationCode};

// =============================================================================
// RE-EXPORTS: Frames and Validation
// =============================================================================

pub use checks::{check_markup, check_pub_tex, check_references};
pub use frame::{Attr, Edge, Frame, FrameDocument, Node};
pub use gf0::{Budget, validate_gf0};
pub use profile::{ProfileRegistry, ProfileValidator, SpecFrameK1, infer_profile};

// =============================================================================
// RE-EXPORTS: Text
// =============================================================================

pub use markup::{MarkupDoc, MarkupError, MarkupMode};
pub use pubtex::{PubTexError, PubTexIr, Segment, parse_tex_inline_v0};

// =============================================================================
// RE-EXPORTS: Documents (from docir and render modules)
// =============================================================================

pub use docir::{Block, DocIr, FrontMatter, build};
pub use render::{RenderOptions, render_latex, render_markdown};

// =============================================================================
// RE-EXPORTS: Kernels and Formats
// =============================================================================

pub use formats::{sha256_hex, stable_json};
pub use kernel::{Kernel, KernelCtx, KernelOutput, kernel, kernels, run_kernel};

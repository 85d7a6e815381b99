//! # Kernel Registry
//!
//! Named, versioned entry points over the validators. A kernel takes the
//! loaded frames and returns an output object plus diagnostics and receipts;
//! [`run_kernel`] wraps that into a [`Report`].
//!
//! Every report carries `output.sha256`, the SHA-256 of the stable JSON of
//! the kernel output, so two runs over the same bytes compare equal.

use crate::checks::{check_markup, check_pub_tex, check_references};
use crate::formats::{sha256_text, stable_sha256};
use crate::frame::FrameDocument;
use crate::gf0::{Budget, validate_gf0};
use crate::profile::{ProfileRegistry, infer_profile};
use crate::render::RenderOptions;
use crate::types::{Diagnostics, FrameError, Report, ToolInfo, Violation, ViolationCode};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Tool id recorded in every report.
pub const TOOL_ID: &str = "fcx";

/// Version shared by the built-in kernels.
pub const KERNEL_VERSION: &str = "0.1.0";

// =============================================================================
// CONTEXT AND OUTPUT
// =============================================================================

/// Immutable settings every kernel runs under.
#[derive(Debug, Default)]
pub struct KernelCtx {
    pub budget: Budget,
    pub profiles: ProfileRegistry,
    /// Passthrough formats the markup check skips, as the renderers do.
    pub render: RenderOptions,
}

impl KernelCtx {
    /// Standard profiles with the given budget.
    #[must_use]
    pub fn new(budget: Budget) -> Self {
        Self {
            budget,
            profiles: ProfileRegistry::standard(),
            render: RenderOptions::default(),
        }
    }

    /// Replace the render options.
    #[must_use]
    pub fn with_render(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }
}

/// What a kernel returns before report assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelOutput {
    pub output: Value,
    pub violations: Vec<Violation>,
    pub warnings: Vec<Violation>,
    pub receipts: BTreeMap<String, String>,
}

type KernelFn = fn(&KernelCtx, &[FrameDocument]) -> Result<KernelOutput, FrameError>;

/// A registered kernel.
#[derive(Clone, Copy)]
pub struct Kernel {
    pub id: &'static str,
    pub version: &'static str,
    run: KernelFn,
}

impl Kernel {
    /// Receipt identifying this kernel: SHA-256 of `"<id>@<version>"`.
    #[must_use]
    pub fn receipt(&self) -> String {
        kernel_receipt(self.id, self.version)
    }

    /// Run the kernel without wrapping the result.
    pub fn run(&self, ctx: &KernelCtx, frames: &[FrameDocument]) -> Result<KernelOutput, FrameError> {
        (self.run)(ctx, frames)
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("id", &self.id)
            .field("version", &self.version)
            .finish()
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

static KERNELS: [Kernel; 5] = [
    Kernel {
        id: "validate_gf0",
        version: KERNEL_VERSION,
        run: k_validate_gf0,
    },
    Kernel {
        id: "validate_frame",
        version: KERNEL_VERSION,
        run: k_validate_frame,
    },
    Kernel {
        id: "validate_markup",
        version: KERNEL_VERSION,
        run: k_validate_markup,
    },
    Kernel {
        id: "validate_pub_tex",
        version: KERNEL_VERSION,
        run: k_validate_pub_tex,
    },
    Kernel {
        id: "validate_references",
        version: KERNEL_VERSION,
        run: k_validate_references,
    },
];

/// Look up a kernel by id.
#[must_use]
pub fn kernel(id: &str) -> Option<&'static Kernel> {
    KERNELS.iter().find(|k| k.id == id)
}

/// All registered kernels, in registration order.
#[must_use]
pub fn kernels() -> &'static [Kernel] {
    &KERNELS
}

/// Run kernel `id` over `frames` and assemble its report.
///
/// An unknown id is not an error: it yields a failed report with a single
/// `FCX.E.UNKNOWN_KERNEL` violation.
pub fn run_kernel(ctx: &KernelCtx, id: &str, frames: &[FrameDocument]) -> Result<Report, FrameError> {
    let Some(k) = kernel(id) else {
        tracing::warn!(kernel = id, "unknown kernel");
        let path = frames.first().map(|d| d.path.as_str()).unwrap_or("");
        let tool = ToolInfo {
            id: TOOL_ID.to_string(),
            kernel: id.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        let violation = Violation::new(
            ViolationCode::FcxUnknownKernel,
            path,
            format!("unknown kernel: {}", id),
        );
        return Ok(Report::new(tool, vec![violation], Vec::new(), BTreeMap::new()));
    };

    let mut out = k.run(ctx, frames)?;
    out.receipts
        .insert("output.sha256".to_string(), stable_sha256(&out.output)?);
    tracing::debug!(
        kernel = k.id,
        frames = frames.len(),
        violations = out.violations.len(),
        warnings = out.warnings.len(),
        "kernel finished"
    );

    let tool = ToolInfo {
        id: TOOL_ID.to_string(),
        kernel: k.id.to_string(),
        version: k.version.to_string(),
    };
    Ok(Report::new(tool, out.violations, out.warnings, out.receipts))
}

// =============================================================================
// KERNELS
// =============================================================================

fn single<'a>(id: &str, frames: &'a [FrameDocument]) -> Result<&'a FrameDocument, FrameError> {
    frames
        .first()
        .ok_or_else(|| FrameError::MissingInput(id.to_string()))
}

fn receipts(pairs: &[(&str, String)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

/// A top-level field for the output object; `""` when the frame is not a mapping.
fn field(doc: &FrameDocument, key: &str) -> Value {
    if doc.value.is_object() {
        doc.value.get(key).cloned().unwrap_or(Value::Null)
    } else {
        Value::String(String::new())
    }
}

fn kernel_receipt(id: &str, version: &str) -> String {
    sha256_text(&format!("{}@{}", id, version))
}

fn self_receipt(id: &str) -> String {
    kernel_receipt(id, KERNEL_VERSION)
}

fn k_validate_gf0(ctx: &KernelCtx, frames: &[FrameDocument]) -> Result<KernelOutput, FrameError> {
    let doc = single("validate_gf0", frames)?;
    let violations = validate_gf0(&doc.value, &doc.path, &ctx.budget);
    Ok(KernelOutput {
        output: json!({
            "graph_id": field(doc, "graph_id"),
            "version": field(doc, "version"),
        }),
        violations,
        warnings: Vec::new(),
        receipts: receipts(&[
            ("input.frame_sha256", doc.sha256()),
            ("kernel", self_receipt("validate_gf0")),
        ]),
    })
}

/// GF0 first; the profile validator only sees structurally clean frames.
fn k_validate_frame(ctx: &KernelCtx, frames: &[FrameDocument]) -> Result<KernelOutput, FrameError> {
    let doc = single("validate_frame", frames)?;
    let mut violations = validate_gf0(&doc.value, &doc.path, &ctx.budget);
    if !violations.is_empty() {
        return Ok(KernelOutput {
            output: json!({"phase": "gf0"}),
            violations,
            warnings: Vec::new(),
            receipts: receipts(&[("input.frame_sha256", doc.sha256())]),
        });
    }

    let frame = doc.frame()?;
    let profile = infer_profile(&frame).to_string();
    match ctx.profiles.get(&profile) {
        Some(validator) => violations.extend(validator.validate(&frame, &doc.path)),
        None => tracing::debug!(path = %doc.path, profile = %profile, "no validator for profile"),
    }

    Ok(KernelOutput {
        output: json!({
            "graph_id": field(doc, "graph_id"),
            "version": field(doc, "version"),
            "profile": profile,
        }),
        violations,
        warnings: Vec::new(),
        receipts: receipts(&[
            ("input.frame_sha256", doc.sha256()),
            ("kernel", self_receipt("validate_frame")),
            ("profile", profile.clone()),
        ]),
    })
}

fn batch(id: &str, (violations, warnings): Diagnostics) -> KernelOutput {
    KernelOutput {
        output: json!({}),
        violations,
        warnings,
        receipts: receipts(&[("kernel", self_receipt(id))]),
    }
}

fn k_validate_markup(ctx: &KernelCtx, frames: &[FrameDocument]) -> Result<KernelOutput, FrameError> {
    Ok(batch("validate_markup", check_markup(frames, &ctx.render.passthrough)))
}

fn k_validate_pub_tex(_: &KernelCtx, frames: &[FrameDocument]) -> Result<KernelOutput, FrameError> {
    Ok(batch("validate_pub_tex", check_pub_tex(frames)))
}

fn k_validate_references(
    _: &KernelCtx,
    frames: &[FrameDocument],
) -> Result<KernelOutput, FrameError> {
    Ok(batch("validate_references", check_references(frames)))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(path: &str, yaml: &str) -> FrameDocument {
        FrameDocument::from_bytes(path, yaml.as_bytes().to_vec()).expect("frame parses")
    }

    const SPEC_FRAME: &str = "\
graph_id: spec://demo
version: '1'
attrs: []
nodes:
  - id: spec://demo
    kind: spec
    attrs:
      - {key: profile, value: specframe-k1}
      - {key: title, value: Demo}
      - {key: status, value: normative}
      - {key: summary, value: A demo frame.}
edges: []
meta: []
";

    #[test]
    fn registry_lists_builtin_kernels() {
        let ids: Vec<_> = kernels().iter().map(|k| k.id).collect();
        assert_eq!(
            ids,
            vec![
                "validate_gf0",
                "validate_frame",
                "validate_markup",
                "validate_pub_tex",
                "validate_references"
            ]
        );
        assert!(kernel("gate_enforce_repo_law").is_none());
    }

    #[test]
    fn kernel_receipt_hashes_id_and_version() {
        let k = kernel("validate_gf0").expect("registered");
        assert_eq!(k.receipt(), sha256_text("validate_gf0@0.1.0"));
    }

    #[test]
    fn gf0_report_has_input_kernel_and_output_receipts() {
        let d = doc("demo.yml", SPEC_FRAME);
        let report = run_kernel(&KernelCtx::default(), "validate_gf0", &[d.clone()]).expect("runs");
        assert!(report.ok);
        assert_eq!(report.tool.id, "fcx");
        assert_eq!(report.tool.kernel, "validate_gf0");
        assert_eq!(report.tool.version, "0.1.0");
        assert_eq!(
            report.receipts.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["input.frame_sha256", "kernel", "output.sha256"]
        );
        assert_eq!(report.receipts["input.frame_sha256"], d.sha256());
        let expected_out = json!({"graph_id": "spec://demo", "version": "1"});
        assert_eq!(
            report.receipts["output.sha256"],
            stable_sha256(&expected_out).expect("hash")
        );
    }

    #[test]
    fn frame_report_names_profile() {
        let report =
            run_kernel(&KernelCtx::default(), "validate_frame", &[doc("d.yml", SPEC_FRAME)]).expect("runs");
        assert!(report.ok, "{:?}", report.violations);
        assert_eq!(report.receipts["profile"], "specframe-k1");
    }

    #[test]
    fn frame_stops_after_gf0_failure() {
        let d = doc("bad.yml", "graph_id: g\nnodes: []\n");
        let report = run_kernel(&KernelCtx::default(), "validate_frame", &[d]).expect("runs");
        assert!(!report.ok);
        assert!(report.violations.iter().all(|v| v.code.namespace() == "GF0"));
        assert!(!report.receipts.contains_key("kernel"));
        assert!(!report.receipts.contains_key("profile"));
        assert_eq!(
            report.receipts["output.sha256"],
            stable_sha256(&json!({"phase": "gf0"})).expect("hash")
        );
    }

    #[test]
    fn unknown_profile_is_not_validated() {
        let yaml = SPEC_FRAME.replace("specframe-k1", "custom-x").replace("kind: spec", "kind: weird");
        let report = run_kernel(&KernelCtx::default(), "validate_frame", &[doc("d.yml", &yaml)]).expect("runs");
        assert!(report.ok);
        assert_eq!(report.receipts["profile"], "custom-x");
    }

    #[test]
    fn unknown_kernel_is_a_failed_report() {
        let report =
            run_kernel(&KernelCtx::default(), "gate_enforce_repo_law", &[doc("d.yml", SPEC_FRAME)]).expect("runs");
        assert!(!report.ok);
        assert_eq!(report.tool.kernel, "gate_enforce_repo_law");
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].code, ViolationCode::FcxUnknownKernel);
        assert_eq!(report.violations[0].path, "d.yml");
        assert_eq!(report.violations[0].message, "unknown kernel: gate_enforce_repo_law");
        assert!(report.receipts.is_empty());
    }

    #[test]
    fn single_frame_kernel_needs_a_frame() {
        let err = run_kernel(&KernelCtx::default(), "validate_gf0", &[]);
        assert!(matches!(err, Err(FrameError::MissingInput(k)) if k == "validate_gf0"));
    }

    #[test]
    fn batch_kernels_carry_only_kernel_receipt() {
        let report =
            run_kernel(&KernelCtx::default(), "validate_references", &[doc("d.yml", SPEC_FRAME)]).expect("runs");
        assert!(report.ok);
        assert_eq!(report.receipts["kernel"], sha256_text("validate_references@0.1.0"));
        assert_eq!(report.receipts["output.sha256"], stable_sha256(&json!({})).expect("hash"));
        assert_eq!(report.receipts.len(), 2);
    }
}

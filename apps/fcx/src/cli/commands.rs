//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::config::Settings;
use framecodex_core::formats::{pretty_json, stable_json};
use framecodex_core::{
    FrameDocument, FrameError, KernelCtx, build, kernels, render_latex, render_markdown,
    run_kernel,
};
use std::io::Write;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum frame file size (64 MB).
///
/// Frames are parsed fully into memory.
const MAX_FRAME_FILE_SIZE: u64 = 64 * 1024 * 1024;

fn validate_file_size(path: &Path, max_size: u64) -> Result<(), FrameError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| FrameError::IoError(format!("{}: {}", path.display(), e)))?;

    if metadata.len() > max_size {
        return Err(FrameError::IoError(format!(
            "{}: file size {} bytes exceeds maximum allowed {} bytes",
            path.display(),
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Load frames in the order given.
pub fn load_frames(paths: &[PathBuf]) -> Result<Vec<FrameDocument>, FrameError> {
    paths
        .iter()
        .map(|path| {
            validate_file_size(path, MAX_FRAME_FILE_SIZE)?;
            FrameDocument::load(path)
        })
        .collect()
}

/// Write to `out`, or to stdout when absent.
fn write_output(out: Option<&Path>, text: &str) -> Result<(), FrameError> {
    match out {
        Some(path) => std::fs::write(path, text)
            .map_err(|e| FrameError::IoError(format!("{}: {}", path.display(), e))),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(|e| FrameError::IoError(format!("stdout: {}", e)))
        }
    }
}

// =============================================================================
// VALIDATE COMMANDS
// =============================================================================

/// Run a kernel and write its report as stable JSON.
pub fn cmd_validate(
    settings: &Settings,
    kernel_id: &str,
    paths: &[PathBuf],
    out: Option<&Path>,
) -> Result<bool, FrameError> {
    let frames = load_frames(paths)?;
    let ctx = KernelCtx::new(settings.budget).with_render(settings.render.clone());
    let report = run_kernel(&ctx, kernel_id, &frames)?;

    write_output(out, &stable_json(&report)?)?;
    tracing::info!(
        kernel = kernel_id,
        ok = report.ok,
        violations = report.violations.len(),
        warnings = report.warnings.len(),
        "report written"
    );
    Ok(report.ok)
}

/// List kernel ids and versions as stable JSON.
pub fn cmd_kernels(out: Option<&Path>) -> Result<bool, FrameError> {
    let listing: Vec<serde_json::Value> = kernels()
        .iter()
        .map(|k| serde_json::json!({"id": k.id, "version": k.version, "receipt": k.receipt()}))
        .collect();
    write_output(out, &stable_json(&listing)?)?;
    Ok(true)
}

// =============================================================================
// DOCUMENT COMMANDS
// =============================================================================

/// Output format of `cmd_render`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    Markdown,
    Latex,
}

fn build_docir(path: &Path) -> Result<framecodex_core::DocIr, FrameError> {
    validate_file_size(path, MAX_FRAME_FILE_SIZE)?;
    let doc = FrameDocument::load(path)?;
    build(&doc.frame()?, &doc.bytes)
}

/// Lower a frame and write its DocIR as indented, key-sorted JSON.
pub fn cmd_docir(path: &Path, out: Option<&Path>) -> Result<bool, FrameError> {
    let docir = build_docir(path)?;
    write_output(out, &pretty_json(&docir)?)?;
    tracing::info!(blocks = docir.blocks.len(), "docir written");
    Ok(true)
}

/// Lower a frame and render it.
pub fn cmd_render(
    settings: &Settings,
    path: &Path,
    target: RenderTarget,
    out: Option<&Path>,
) -> Result<bool, FrameError> {
    let docir = build_docir(path)?;
    let text = match target {
        RenderTarget::Markdown => render_markdown(&docir, &settings.render),
        RenderTarget::Latex => render_latex(&docir, &settings.render),
    };
    write_output(out, &text)?;
    tracing::info!(format = ?target, bytes = text.len(), "document rendered");
    Ok(true)
}

//! # fcx CLI Module
//!
//! This module implements the CLI interface for framecodex.
//!
//! ## Available Commands
//!
//! - `validate-gf0` - Structural check of one frame
//! - `validate-frame` - GF0, then the frame's declared profile
//! - `validate-markup` - Text-format checks over a batch of frames
//! - `validate-pub-tex` - PubTeX checks over a batch of frames
//! - `validate-references` - FrameURL resolution across a batch of frames
//! - `docir` - Lower one frame to DocIR JSON
//! - `render-md` - Render one frame as Markdown
//! - `render-tex` - Render one frame as a LaTeX article
//! - `kernels` - List the registered kernels

mod commands;

use crate::config::{FileConfig, Overrides, Settings};
use clap::{Parser, Subcommand};
use framecodex_core::FrameError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// fcx - framecodex tool
///
/// Validates graph frames and compiles them to Markdown or LaTeX.
/// Reports are stable JSON: identical input bytes give identical reports.
#[derive(Parser, Debug)]
#[command(name = "fcx")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Config file (default: ./fcx.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Deepest allowed nesting of meta frames
    #[arg(long, global = true)]
    pub max_meta_depth: Option<usize>,

    /// text.format emitted verbatim by renderers (repeatable)
    #[arg(long = "passthrough", global = true, value_name = "FORMAT")]
    pub passthrough: Vec<String>,

    /// Write output to this file instead of stdout
    #[arg(short, long, global = true)]
    pub out: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check one frame against the GF0 structural schema
    ValidateGf0 {
        /// Frame file (YAML or JSON)
        frame: PathBuf,
    },

    /// Check one frame against GF0 and its declared profile
    ValidateFrame {
        /// Frame file (YAML or JSON)
        frame: PathBuf,
    },

    /// Check text.format and markup of every node
    ValidateMarkup {
        /// Frame files
        #[arg(required = true)]
        frames: Vec<PathBuf>,
    },

    /// Check PubTeX attributes of every node
    ValidatePubTex {
        /// Frame files
        #[arg(required = true)]
        frames: Vec<PathBuf>,
    },

    /// Resolve FrameURL references across frames
    ValidateReferences {
        /// Frame files, in the order they are checked
        #[arg(required = true)]
        frames: Vec<PathBuf>,
    },

    /// Lower one frame to DocIR JSON
    Docir {
        /// Frame file (YAML or JSON)
        frame: PathBuf,
    },

    /// Render one frame as Markdown
    RenderMd {
        /// Frame file (YAML or JSON)
        frame: PathBuf,
    },

    /// Render one frame as a LaTeX article
    RenderTex {
        /// Frame file (YAML or JSON)
        frame: PathBuf,
    },

    /// List registered kernels
    Kernels,
}

impl Cli {
    /// Flag values that override the config file.
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        Overrides {
            max_meta_depth: self.max_meta_depth,
            passthrough: self.passthrough.clone(),
        }
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
///
/// Returns whether the run was clean: `false` means a report with
/// violations was written.
pub fn execute(cli: Cli) -> Result<bool, FrameError> {
    let file = FileConfig::discover(cli.config.as_deref())?;
    let settings = Settings::resolve(&file, &cli.overrides());
    let out = cli.out.as_deref();

    match cli.command {
        Commands::ValidateGf0 { frame } => cmd_validate(&settings, "validate_gf0", &[frame], out),
        Commands::ValidateFrame { frame } => {
            cmd_validate(&settings, "validate_frame", &[frame], out)
        }
        Commands::ValidateMarkup { frames } => {
            cmd_validate(&settings, "validate_markup", &frames, out)
        }
        Commands::ValidatePubTex { frames } => {
            cmd_validate(&settings, "validate_pub_tex", &frames, out)
        }
        Commands::ValidateReferences { frames } => {
            cmd_validate(&settings, "validate_references", &frames, out)
        }
        Commands::Docir { frame } => cmd_docir(&frame, out),
        Commands::RenderMd { frame } => cmd_render(&settings, &frame, RenderTarget::Markdown, out),
        Commands::RenderTex { frame } => cmd_render(&settings, &frame, RenderTarget::Latex, out),
        Commands::Kernels => cmd_kernels(out),
    }
}

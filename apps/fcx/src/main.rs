//! # fcx - framecodex tool
//!
//! The command-line binary for the framecodex frame pipeline.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              apps/fcx (THE BINARY)           │
//! │                                              │
//! │   ┌───────────┐   ┌───────────┐              │
//! │   │   CLI     │   │  Config   │              │
//! │   │  (clap)   │   │  (toml)   │              │
//! │   └─────┬─────┘   └─────┬─────┘              │
//! │         └───────┬───────┘                    │
//! │                 ▼                            │
//! │         ┌─────────────────┐                  │
//! │         │ framecodex-core │                  │
//! │         │   (THE LOGIC)   │                  │
//! │         └─────────────────┘                  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! fcx validate-frame spec/demo.yml
//! fcx validate-references spec/*.yml --out refs.json
//! fcx render-md spec/demo.yml --passthrough tex-block
//! ```
//!
//! Exit status: 0 clean, 1 report with violations, 2 fatal error.

use clap::Parser;
use fcx::cli;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let code = match cli::execute(cli) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            tracing::error!("Error: {}", e);
            2
        }
    };
    std::process::exit(code);
}

/// Logs go to stderr so stdout carries only reports and documents.
///
/// `FCX_LOG` (or `RUST_LOG`) overrides the flag-derived filter;
/// `FCX_LOG_FORMAT=json` enables machine-parseable output.
fn init_tracing(verbose: bool, quiet: bool) {
    let log_format = std::env::var("FCX_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if quiet {
        "fcx=error,framecodex_core=error"
    } else if verbose {
        "fcx=debug,framecodex_core=debug"
    } else {
        "fcx=info,framecodex_core=warn"
    };
    let filter = EnvFilter::try_from_env("FCX_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

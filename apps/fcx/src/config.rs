//! # Configuration
//!
//! Settings come from three layers, highest first:
//! 1. command-line flags
//! 2. the TOML config file (`--config`, or `fcx.toml` in the working directory)
//! 3. built-in defaults
//!
//! ```toml
//! [budget]
//! max_meta_depth = 16
//!
//! [render]
//! passthrough_formats = ["tex-inline", "tex-block"]
//! ```

use framecodex_core::{Budget, FrameError, RenderOptions};
use serde::Deserialize;
use std::path::Path;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "fcx.toml";

// =============================================================================
// FILE LAYER
// =============================================================================

/// Contents of a config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub budget: BudgetConfig,
    pub render: RenderConfig,
}

/// `[budget]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BudgetConfig {
    pub max_meta_depth: Option<usize>,
}

/// `[render]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub passthrough_formats: Option<Vec<String>>,
}

impl FileConfig {
    /// Parse TOML text; `origin` names the source in errors.
    pub fn from_toml(origin: &str, text: &str) -> Result<Self, FrameError> {
        toml::from_str(text).map_err(|e| FrameError::ParseError {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, FrameError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| FrameError::IoError(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml(&path.display().to_string(), &text)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// An explicit path must exist; the implicit `fcx.toml` may be absent.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, FrameError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let implicit = Path::new(DEFAULT_CONFIG_FILE);
                if implicit.is_file() {
                    Self::load(implicit)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

// =============================================================================
// RESOLVED SETTINGS
// =============================================================================

/// Values given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub max_meta_depth: Option<usize>,
    /// Replaces the passthrough set when non-empty.
    pub passthrough: Vec<String>,
}

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub budget: Budget,
    pub render: RenderOptions,
}

impl Settings {
    /// Merge the layers: flag, then file, then default.
    #[must_use]
    pub fn resolve(file: &FileConfig, overrides: &Overrides) -> Self {
        let max_meta_depth = overrides
            .max_meta_depth
            .or(file.budget.max_meta_depth)
            .unwrap_or(Budget::default().max_meta_depth);

        let render = if !overrides.passthrough.is_empty() {
            RenderOptions::with_passthrough(overrides.passthrough.iter().cloned())
        } else if let Some(formats) = &file.render.passthrough_formats {
            RenderOptions::with_passthrough(formats.iter().cloned())
        } else {
            RenderOptions::default()
        };

        Self {
            budget: Budget { max_meta_depth },
            render,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

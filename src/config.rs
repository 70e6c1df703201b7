//! Settings read from `annotator.toml`.
//!
//! ```toml
//! mode = "semi"
//! char_width = 1.0
//! line_height = 1.0
//! ratio = 1.0
//!
//! [log]
//! file = "annotator.log"
//! filter = "annotator=debug"
//!
//! [[highlight]]
//! entity = "*"
//! mode = "underline"
//! color = "cyan"
//! opacity = 0.8
//! ```

use crate::types::{EditMode, Geometry, HighlightMode, HighlightSchema, HighlightStyle};
use crate::utils::default_config_paths;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mode the annotator starts in.
    pub mode: EditMode,
    pub char_width: f32,
    pub line_height: f32,
    pub ratio: f32,
    pub log: LogConfig,
    #[serde(rename = "highlight")]
    pub highlights: Vec<HighlightRule>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: EditMode::default(),
            char_width: 1.0,
            line_height: 1.0,
            ratio: 1.0,
            log: LogConfig::default(),
            highlights: Vec::new(),
        }
    }
}

/// Log output. Nothing is logged unless `file` is set.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub file: Option<PathBuf>,
    /// `tracing_subscriber::EnvFilter` directives, e.g. `"annotator=debug"`.
    pub filter: Option<String>,
}

/// How anchors of one entity (or `"*"` for all) are painted.
#[derive(Debug, Deserialize)]
pub struct HighlightRule {
    pub entity: String,
    #[serde(default)]
    pub mode: HighlightMode,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

fn default_color() -> String {
    "yellow".to_string()
}

fn default_opacity() -> f32 {
    1.0
}

impl Config {
    pub fn from_toml(s: &str) -> Result<Self> {
        toml::from_str(s).context("Invalid configuration")
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)
            .with_context(|| format!("Reading {}", path.display()))?;
        Self::from_toml(&s).with_context(|| format!("Parsing {}", path.display()))
    }

    /// Load `explicit` if given, else the first `annotator.toml` found in the default
    /// locations, else the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_file(path);
        }
        Self::load_first(&default_config_paths())
    }

    fn load_first(candidates: &[PathBuf]) -> Result<Self> {
        match candidates.iter().find(|p| p.is_file()) {
            Some(path) => Self::load_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Geometry of a text area `columns` glyphs wide.
    pub fn geometry(&self, columns: usize) -> Geometry {
        #[allow(clippy::cast_precision_loss)]
        let width = columns as f32 * self.char_width;
        Geometry {
            width,
            char_width: self.char_width,
            line_height: self.line_height,
            ratio: self.ratio,
        }
    }

    /// Highlight schema for an entity: its own rule first, then the `"*"` rule.
    pub fn highlight_for(&self, entity: &str) -> Option<HighlightSchema> {
        let rule = self
            .highlights
            .iter()
            .find(|r| r.entity == entity)
            .or_else(|| self.highlights.iter().find(|r| r.entity == "*"))?;
        Some(HighlightSchema {
            mode: rule.mode,
            style: HighlightStyle {
                color: rule.color.clone(),
                opacity: rule.opacity,
            },
        })
    }
}

// Library exports for sheet-insight

pub mod analysis;
pub mod cascade;
pub mod classify;
pub mod coerce;
pub mod config;
pub mod data;
pub mod error;
pub mod external;
pub mod graph;
pub mod report;
pub mod sample;
pub mod sanitize;

pub use analysis::{generate_analysis_report, Analyzer};
pub use config::AnalysisConfig;
pub use data::{Cell, TableContent};
pub use error::{AnalysisError, Result};
pub use report::{Chart, ChartKind, Report, ReportStatus};

use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

impl OutputFormat {
    /// `.svg` selects SVG, anything else PNG
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => OutputFormat::Svg,
            _ => OutputFormat::Png,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: OutputFormat::Png,
        }
    }
}

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::analysis::selection::ChartParams;

/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV: &str = "STAT_EXPLORER_CONFIG";

// ---------------------------------------------------------------------------
// Application configuration
// ---------------------------------------------------------------------------

/// Startup settings. Every field is optional in the file.
///
/// ```json
/// { "window_size": [1400, 900], "preview_rows": 20, "default_bins": 15 }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window_size: [f32; 2],
    /// Rows shown in the data preview.
    pub preview_rows: usize,
    /// Initial histogram bin count (clamped to 5..=50).
    pub default_bins: usize,
    /// Points the KDE curve is evaluated at.
    pub kde_grid: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_size: [1200.0, 800.0],
            preview_rows: 10,
            default_bins: ChartParams::DEFAULT_BINS,
            kde_grid: ChartParams::DEFAULT_KDE_GRID,
        }
    }
}

impl AppConfig {
    /// Load from `$STAT_EXPLORER_CONFIG` when set. A missing variable gives
    /// the defaults; an unreadable or invalid file is logged and ignored.
    pub fn from_env() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV) else {
            return Self::default();
        };
        match Self::from_file(Path::new(&path)) {
            Ok(config) => {
                log::info!("Loaded config from {}", Path::new(&path).display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring config: {e:#}");
                Self::default()
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid config JSON")
    }

    /// Chart parameters a fresh selection starts with.
    pub fn chart_params(&self) -> ChartParams {
        ChartParams {
            num_bins: self
                .default_bins
                .clamp(ChartParams::MIN_BINS, ChartParams::MAX_BINS),
            kde_grid: self.kde_grid.max(2),
        }
    }
}

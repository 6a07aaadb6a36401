use std::path::Path;

use crate::analysis::dispatch::dispatch;
use crate::analysis::error::ComputationError;
use crate::analysis::selection::Selection;
use crate::analysis::ComputationResult;
use crate::config::AppConfig;
use crate::data::loader;
use crate::data::model::Dataset;

/// What the last dispatch produced: a result, the guarded no-op (`Ok(None)`),
/// or a computation error.
pub type Outcome = Result<Option<ComputationResult>, ComputationError>;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AppConfig,

    /// Loaded dataset (None until user loads a file).
    pub dataset: Option<Dataset>,

    /// Display name of the loaded file.
    pub file_name: Option<String>,

    /// Current user choices; replaced wholesale on every interaction.
    pub selection: Selection,

    /// Result of dispatching `selection` over `dataset` (cached between frames).
    pub outcome: Option<Outcome>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let selection = Selection::with_params(config.chart_params());
        Self {
            config,
            dataset: None,
            file_name: None,
            selection,
            outcome: None,
            status_message: None,
        }
    }

    /// Ingest a newly loaded dataset. The previous selection referred to the
    /// old columns, so it is discarded.
    pub fn set_dataset(&mut self, dataset: Dataset, file_name: String) {
        log::info!(
            "Loaded {file_name}: {} rows, columns {:?}",
            dataset.len(),
            dataset.column_names()
        );
        self.selection = Selection::with_params(self.config.chart_params());
        self.dataset = Some(dataset);
        self.file_name = Some(file_name);
        self.status_message = None;
        self.recompute();
    }

    /// Parse uploaded bytes; on failure the current state is kept.
    pub fn load_bytes(&mut self, file_name: &str, bytes: &[u8]) {
        match loader::load_bytes(bytes) {
            Ok(dataset) => self.set_dataset(dataset, file_name.to_string()),
            Err(e) => {
                log::error!("Failed to load {file_name}: {e}");
                self.status_message = Some(format!("Error loading the file: {e}"));
            }
        }
    }

    pub fn load_path(&mut self, path: &Path) {
        match loader::load_file(path) {
            Ok(dataset) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.set_dataset(dataset, name);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error loading the file: {e:#}"));
            }
        }
    }

    /// Replace the selection and recompute if anything changed.
    pub fn apply_selection(&mut self, next: Selection) {
        if next != self.selection {
            self.selection = next;
            self.recompute();
        }
    }

    /// Re-derive the outcome from the current selection and dataset.
    pub fn recompute(&mut self) {
        self.outcome = self.dataset.as_ref().map(|ds| {
            let outcome = dispatch(&self.selection, ds);
            if let Err(e) = &outcome {
                log::warn!("{} failed: {e}", self.selection.mode);
            }
            outcome
        });
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

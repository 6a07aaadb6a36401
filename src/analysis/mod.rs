/// Analysis layer: selection state, dispatch and the computations.
///
/// ```text
///   Selection + Dataset
///          │
///          ▼
///    ┌────────────┐
///    │  dispatch   │  pick + validate
///    └────────────┘
///      │    │    │
///      ▼    ▼    ▼
///   stats charts regression
///      │    │    │
///      ▼    ▼    ▼
///    ComputationResult
/// ```

pub mod charts;
pub mod dispatch;
pub mod error;
pub mod regression;
pub mod selection;
pub mod stats;

use charts::Figure;
use regression::RegressionReport;
use stats::StatsTable;

/// Output of one dispatch, rendered verbatim by the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputationResult {
    Stats(StatsTable),
    Figure(Figure),
    Regression(RegressionReport),
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::data::model::{CellValue, Column};

    #[track_caller]
    pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected} ± {tolerance}, got {actual}"
        );
    }

    pub fn numeric_column(name: &str, values: &[f64]) -> Column {
        Column::new(name, values.iter().map(|v| CellValue::Float(*v)).collect())
    }

    pub fn text_column(name: &str, values: &[&str]) -> Column {
        Column::new(
            name,
            values.iter().map(|v| CellValue::String((*v).to_string())).collect(),
        )
    }
}

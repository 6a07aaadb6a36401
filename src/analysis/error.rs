use thiserror::Error;

/// Failure of a requested computation, raised at the dispatch boundary or
/// inside an adapter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComputationError {
    #[error("column '{0}' does not exist in the loaded dataset")]
    UnknownColumn(String),

    #[error("column '{column}' is not numeric, but {purpose} needs numeric data")]
    NotNumeric {
        column: String,
        purpose: &'static str,
    },

    #[error("the dataset has no columns")]
    EmptyDataset,

    #[error("'{0}' cannot be both the dependent and an independent variable")]
    DependentIsRegressor(String),

    #[error("regression needs at least {needed} complete rows, found {found}")]
    TooFewObservations { needed: usize, found: usize },

    #[error("the design matrix is singular (independent variables are collinear)")]
    SingularMatrix,

    #[error("distribution error: {0}")]
    Distribution(String),
}

use std::fmt;

// ---------------------------------------------------------------------------
// Analysis mode / chart kind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisMode {
    #[default]
    Stats,
    Plot,
    Regression,
}

impl AnalysisMode {
    pub const ALL: [AnalysisMode; 3] = [
        AnalysisMode::Stats,
        AnalysisMode::Plot,
        AnalysisMode::Regression,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AnalysisMode::Stats => "Basic Statistics",
            AnalysisMode::Plot => "Basic Plots",
            AnalysisMode::Regression => "Regression Analysis",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
    Scatter,
    Histogram,
    Box,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::Bar,
        ChartKind::Line,
        ChartKind::Scatter,
        ChartKind::Histogram,
        ChartKind::Box,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Bar => "Bar Plot",
            ChartKind::Line => "Line Plot",
            ChartKind::Scatter => "Scatter Plot",
            ChartKind::Histogram => "Histogram",
            ChartKind::Box => "Box Plot",
        }
    }

    /// Whether the chart reads the Y column at all.
    pub fn uses_y(self) -> bool {
        !matches!(self, ChartKind::Histogram)
    }

    pub fn requires_numeric_x(self) -> bool {
        matches!(self, ChartKind::Histogram)
    }

    pub fn requires_numeric_y(self) -> bool {
        matches!(self, ChartKind::Bar | ChartKind::Line | ChartKind::Box)
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Chart parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartParams {
    /// Requested histogram bin count; read through [`ChartParams::bins`].
    pub num_bins: usize,
    /// Number of points the KDE curve is evaluated at.
    pub kde_grid: usize,
}

impl ChartParams {
    pub const MIN_BINS: usize = 5;
    pub const MAX_BINS: usize = 50;
    pub const DEFAULT_BINS: usize = 10;
    pub const DEFAULT_KDE_GRID: usize = 200;

    /// Bin count clamped to `MIN_BINS..=MAX_BINS`.
    pub fn bins(&self) -> usize {
        self.num_bins.clamp(Self::MIN_BINS, Self::MAX_BINS)
    }
}

impl Default for ChartParams {
    fn default() -> Self {
        Self {
            num_bins: Self::DEFAULT_BINS,
            kde_grid: Self::DEFAULT_KDE_GRID,
        }
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// The user's current choices. Treated as an immutable value: widgets
/// produce the next `Selection` through the `with_*` methods and the
/// dispatcher re-derives the result from it.
///
/// Unset column fields mean "the dataset's first column".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selection {
    pub mode: AnalysisMode,
    pub x_column: Option<String>,
    pub y_column: Option<String>,
    pub chart_kind: ChartKind,
    pub chart_params: ChartParams,
    pub dependent_var: Option<String>,
    /// Independent variables in the order they were picked.
    pub independent_vars: Vec<String>,
}

impl Selection {
    /// Fresh selection with the given chart parameters (e.g. from config).
    pub fn with_params(chart_params: ChartParams) -> Self {
        Self {
            chart_params,
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: AnalysisMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_x_column(mut self, column: impl Into<String>) -> Self {
        self.x_column = Some(column.into());
        self
    }

    pub fn with_y_column(mut self, column: impl Into<String>) -> Self {
        self.y_column = Some(column.into());
        self
    }

    pub fn with_chart_kind(mut self, kind: ChartKind) -> Self {
        self.chart_kind = kind;
        self
    }

    /// Set the histogram bin count, clamped to the allowed range.
    pub fn with_num_bins(mut self, bins: usize) -> Self {
        self.chart_params.num_bins = bins.clamp(ChartParams::MIN_BINS, ChartParams::MAX_BINS);
        self
    }

    pub fn with_dependent_var(mut self, column: impl Into<String>) -> Self {
        self.dependent_var = Some(column.into());
        self
    }

    /// Add or remove one independent variable.
    pub fn with_independent(mut self, column: &str, included: bool) -> Self {
        let present = self.independent_vars.iter().any(|c| c == column);
        if included && !present {
            self.independent_vars.push(column.to_string());
        } else if !included {
            self.independent_vars.retain(|c| c != column);
        }
        self
    }
}

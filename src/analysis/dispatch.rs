use super::charts::{render_chart, Figure};
use super::error::ComputationError;
use super::regression::fit_ols;
use super::selection::{AnalysisMode, Selection};
use super::stats::describe;
use super::ComputationResult;
use crate::data::model::{Column, Dataset};

// ---------------------------------------------------------------------------
// Selection → computation
// ---------------------------------------------------------------------------

/// Pick the computation for the current selection, validate its inputs and
/// run it.
///
/// Returns `Ok(None)` for the one guarded no-op: a regression with no
/// independent variables selected.
pub fn dispatch(
    selection: &Selection,
    dataset: &Dataset,
) -> Result<Option<ComputationResult>, ComputationError> {
    log::debug!(
        "dispatching {} over {} rows × {} columns",
        selection.mode,
        dataset.len(),
        dataset.width()
    );

    match selection.mode {
        AnalysisMode::Stats => Ok(Some(ComputationResult::Stats(describe(dataset)))),
        AnalysisMode::Plot => plot(selection, dataset).map(|f| Some(ComputationResult::Figure(f))),
        AnalysisMode::Regression => regression(selection, dataset),
    }
}

fn plot(
    selection: &Selection,
    dataset: &Dataset,
) -> Result<Figure, ComputationError> {
    let kind = selection.chart_kind;
    let x = resolve_column(dataset, selection.x_column.as_deref())?;
    let y = if kind.uses_y() {
        resolve_column(dataset, selection.y_column.as_deref())?
    } else {
        x
    };

    if kind.requires_numeric_x() {
        require_numeric(x, kind.label())?;
    }
    if kind.requires_numeric_y() {
        require_numeric(y, kind.label())?;
    }

    Ok(render_chart(dataset, kind, x, y, &selection.chart_params))
}

fn regression(
    selection: &Selection,
    dataset: &Dataset,
) -> Result<Option<ComputationResult>, ComputationError> {
    if selection.independent_vars.is_empty() {
        return Ok(None);
    }

    let dependent = resolve_column(dataset, selection.dependent_var.as_deref())?;
    require_numeric(dependent, "regression")?;

    let independents = selection
        .independent_vars
        .iter()
        .map(|name| {
            let column = resolve_column(dataset, Some(name))?;
            if column.name == dependent.name {
                return Err(ComputationError::DependentIsRegressor(column.name.clone()));
            }
            require_numeric(column, "regression")?;
            Ok(column)
        })
        .collect::<Result<Vec<&Column>, _>>()?;

    let report = fit_ols(dependent, &independents)?;
    Ok(Some(ComputationResult::Regression(report)))
}

/// Look up a selected column; an unset selection means the first column.
fn resolve_column<'a>(dataset: &'a Dataset, name: Option<&str>) -> Result<&'a Column, ComputationError> {
    match name {
        Some(name) => dataset
            .column(name)
            .ok_or_else(|| ComputationError::UnknownColumn(name.to_string())),
        None => dataset.first_column().ok_or(ComputationError::EmptyDataset),
    }
}

fn require_numeric(column: &Column, purpose: &'static str) -> Result<(), ComputationError> {
    if column.is_numeric() {
        Ok(())
    } else {
        Err(ComputationError::NotNumeric {
            column: column.name.clone(),
            purpose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::charts::FigureKind;
    use crate::analysis::selection::ChartKind;
    use crate::analysis::testing::{assert_close, numeric_column, text_column};

    fn sample() -> Dataset {
        Dataset::from_columns(vec![
            text_column("region", &["north", "south", "north", "east", "south", "east"]),
            numeric_column("x", &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]),
            numeric_column("y", &[1.0, 3.0, 5.0, 7.0, 9.0, 11.0]),
            numeric_column("z", &[2.0, 1.0, 4.0, 3.0, 6.0, 5.0]),
        ])
    }

    fn plot_selection(kind: ChartKind, x: &str, y: &str) -> Selection {
        Selection::default()
            .with_mode(AnalysisMode::Plot)
            .with_chart_kind(kind)
            .with_x_column(x)
            .with_y_column(y)
    }

    #[test]
    fn stats_mode_always_describes() {
        let result = dispatch(&Selection::default(), &sample()).unwrap();
        assert!(matches!(result, Some(ComputationResult::Stats(_))));
    }

    #[test]
    fn every_chart_kind_produces_a_figure() {
        let ds = sample();
        for kind in ChartKind::ALL {
            let result = dispatch(&plot_selection(kind, "x", "y"), &ds).unwrap();
            let Some(ComputationResult::Figure(figure)) = result else {
                panic!("{kind} produced no figure");
            };
            assert_eq!(figure.title, kind.label());
        }
    }

    #[test]
    fn unset_axes_default_to_first_column() {
        let ds = sample();
        let selection = Selection::default()
            .with_mode(AnalysisMode::Plot)
            .with_chart_kind(ChartKind::Scatter);
        let Some(ComputationResult::Figure(figure)) = dispatch(&selection, &ds).unwrap() else {
            panic!("expected figure");
        };
        assert_eq!(figure.x_label, "region");
        assert_eq!(figure.y_label, "region");
    }

    #[test]
    fn categorical_y_is_rejected_for_bar_line_and_box() {
        let ds = sample();
        for kind in [ChartKind::Bar, ChartKind::Line, ChartKind::Box] {
            let err = dispatch(&plot_selection(kind, "x", "region"), &ds).unwrap_err();
            assert!(
                matches!(err, ComputationError::NotNumeric { ref column, .. } if column == "region"),
                "{kind}: {err:?}"
            );
        }
        // Categorical x is fine: it is the grouping variable.
        assert!(dispatch(&plot_selection(ChartKind::Box, "region", "y"), &ds).is_ok());
    }

    #[test]
    fn histogram_needs_numeric_x_only() {
        let ds = sample();
        let err = dispatch(&plot_selection(ChartKind::Histogram, "region", "x"), &ds).unwrap_err();
        assert!(matches!(err, ComputationError::NotNumeric { .. }));

        let selection = plot_selection(ChartKind::Histogram, "x", "region").with_num_bins(10);
        let Some(ComputationResult::Figure(figure)) = dispatch(&selection, &ds).unwrap() else {
            panic!("expected figure");
        };
        let FigureKind::Histogram(h) = figure.kind else {
            panic!("expected histogram");
        };
        assert_eq!(h.counts.len(), 10);
        assert_eq!(h.total(), ds.len());

        let stale_y = plot_selection(ChartKind::Histogram, "x", "gone");
        assert!(dispatch(&stale_y, &ds).is_ok());
    }

    #[test]
    fn stale_column_is_reported() {
        let err = dispatch(&plot_selection(ChartKind::Bar, "gone", "y"), &sample()).unwrap_err();
        assert_eq!(err, ComputationError::UnknownColumn("gone".into()));
    }

    #[test]
    fn regression_without_independents_is_a_no_op() {
        let selection = Selection::default()
            .with_mode(AnalysisMode::Regression)
            .with_dependent_var("y");
        assert_eq!(dispatch(&selection, &sample()), Ok(None));
    }

    #[test]
    fn single_regressor_report_has_figure() {
        let selection = Selection::default()
            .with_mode(AnalysisMode::Regression)
            .with_dependent_var("y")
            .with_independent("x", true);
        let Some(ComputationResult::Regression(report)) = dispatch(&selection, &sample()).unwrap()
        else {
            panic!("expected regression report");
        };
        assert_close(report.coefficients[0].estimate, 1.0, 1e-9);
        assert_close(report.coefficients[1].estimate, 2.0, 1e-9);
        assert_close(report.r_squared, 1.0, 1e-9);
        assert!(report.fitted_line.is_some());
    }

    #[test]
    fn two_regressors_report_has_no_figure() {
        let selection = Selection::default()
            .with_mode(AnalysisMode::Regression)
            .with_dependent_var("y")
            .with_independent("x", true)
            .with_independent("z", true);
        let Some(ComputationResult::Regression(report)) = dispatch(&selection, &sample()).unwrap()
        else {
            panic!("expected regression report");
        };
        assert!(report.fitted_line.is_none());
    }

    #[test]
    fn regression_rejects_bad_columns() {
        let ds = sample();
        let base = Selection::default().with_mode(AnalysisMode::Regression);

        let err = dispatch(&base.clone().with_dependent_var("y").with_independent("y", true), &ds)
            .unwrap_err();
        assert_eq!(err, ComputationError::DependentIsRegressor("y".into()));

        let err = dispatch(&base.clone().with_dependent_var("y").with_independent("region", true), &ds)
            .unwrap_err();
        assert!(matches!(err, ComputationError::NotNumeric { .. }));

        // Unset dependent defaults to the first column, which is categorical here.
        let err = dispatch(&base.with_independent("x", true), &ds).unwrap_err();
        assert!(matches!(err, ComputationError::NotNumeric { ref column, .. } if column == "region"));
    }
}

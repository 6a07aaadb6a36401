use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::analysis::regression::RegressionReport;
use crate::analysis::stats::{NumericSummary, StatsTable};
use crate::data::model::Dataset;

const ROW_HEIGHT: f32 = 18.0;
const HEADER_HEIGHT: f32 = 20.0;

fn fmt_num(v: Option<f64>) -> String {
    match v {
        Some(v) if v.is_finite() => format!("{v:.4}"),
        Some(v) => format!("{v}"),
        None => "NaN".into(),
    }
}

fn fmt_p(p: f64) -> String {
    if p.is_nan() {
        "NaN".into()
    } else if p < 0.001 {
        format!("{p:.2e}")
    } else {
        format!("{p:.3}")
    }
}

// ---------------------------------------------------------------------------
// Data preview
// ---------------------------------------------------------------------------

/// First `rows` rows of the dataset.
pub fn data_preview(ui: &mut Ui, dataset: &Dataset, rows: usize) {
    let shown = rows.min(dataset.len());
    ui.push_id("data_preview", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .vscroll(false)
            .column(Column::auto().at_least(40.0))
            .columns(Column::auto().at_least(80.0), dataset.width())
            .header(HEADER_HEIGHT, |mut header| {
                header.col(|ui| {
                    ui.strong("#");
                });
                for column in dataset.columns() {
                    header.col(|ui| {
                        ui.strong(&column.name).on_hover_text(column.kind.to_string());
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, shown, |mut row| {
                    let index = row.index();
                    row.col(|ui| {
                        ui.label(index.to_string());
                    });
                    for column in dataset.columns() {
                        row.col(|ui| {
                            ui.label(column.values[index].to_string());
                        });
                    }
                });
            });
    });
}

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

pub fn stats_table(ui: &mut Ui, table: &StatsTable) {
    match table {
        StatsTable::Numeric(summaries) => numeric_table(ui, summaries),
        StatsTable::Categorical(summaries) => {
            let labels = ["count", "unique", "top", "freq"];
            let names: Vec<&str> = summaries.iter().map(|s| s.column.as_str()).collect();
            let cells: Vec<[String; 4]> = summaries
                .iter()
                .map(|s| {
                    [
                        s.count.to_string(),
                        s.unique.to_string(),
                        s.top.clone().unwrap_or_else(|| "NaN".into()),
                        s.freq.to_string(),
                    ]
                })
                .collect();
            transposed_table(ui, "categorical_stats", &names, &labels, |col, row| {
                cells[col][row].clone()
            });
        }
    }
}

fn numeric_table(ui: &mut Ui, summaries: &[NumericSummary]) {
    let names: Vec<&str> = summaries.iter().map(|s| s.column.as_str()).collect();
    let values: Vec<[Option<f64>; 8]> = summaries.iter().map(NumericSummary::values).collect();
    transposed_table(ui, "numeric_stats", &names, &NumericSummary::ROW_LABELS, |col, row| {
        if row == 0 {
            summaries[col].count.to_string()
        } else {
            fmt_num(values[col][row])
        }
    });
}

/// Statistic names down the left, one column per dataset column.
fn transposed_table(
    ui: &mut Ui,
    id: &str,
    columns: &[&str],
    row_labels: &[&str],
    cell: impl Fn(usize, usize) -> String,
) {
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .vscroll(false)
            .column(Column::auto().at_least(60.0))
            .columns(Column::auto().at_least(90.0), columns.len())
            .header(HEADER_HEIGHT, |mut header| {
                header.col(|_ui| {});
                for name in columns {
                    header.col(|ui| {
                        ui.strong(*name);
                    });
                }
            })
            .body(|mut body| {
                for (r, label) in row_labels.iter().enumerate() {
                    body.row(ROW_HEIGHT, |mut row| {
                        row.col(|ui| {
                            ui.strong(*label);
                        });
                        for c in 0..columns.len() {
                            row.col(|ui| {
                                ui.label(cell(c, r));
                            });
                        }
                    });
                }
            });
    });
}

// ---------------------------------------------------------------------------
// Regression report
// ---------------------------------------------------------------------------

pub fn regression_report(ui: &mut Ui, report: &RegressionReport) {
    ui.strong("OLS Regression Results");
    egui::Grid::new("ols_summary")
        .num_columns(4)
        .spacing([24.0, 4.0])
        .striped(true)
        .show(ui, |ui: &mut Ui| {
            let pairs = [
                ("Dep. Variable:", report.dependent.clone(), "R-squared:", fmt_num(Some(report.r_squared))),
                ("Model:", "OLS".into(), "Adj. R-squared:", fmt_num(Some(report.adj_r_squared))),
                ("Method:", "Least Squares".into(), "F-statistic:", fmt_num(Some(report.f_statistic))),
                ("No. Observations:", report.n_obs.to_string(), "Prob (F-statistic):", fmt_p(report.f_p_value)),
                ("Df Residuals:", report.df_resid.to_string(), "Log-Likelihood:", fmt_num(Some(report.log_likelihood))),
                ("Df Model:", report.df_model.to_string(), "AIC:", fmt_num(Some(report.aic))),
                ("Covariance Type:", "nonrobust".into(), "BIC:", fmt_num(Some(report.bic))),
            ];
            for (l1, v1, l2, v2) in pairs {
                ui.label(l1);
                ui.monospace(v1);
                ui.label(l2);
                ui.monospace(v2);
                ui.end_row();
            }
        });

    ui.add_space(8.0);
    residual_diagnostics(ui, report);

    ui.add_space(8.0);
    let headers = ["", "coef", "std err", "t", "P>|t|", "[0.025", "0.975]"];
    ui.push_id("ols_coefficients", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .columns(Column::auto().at_least(80.0), headers.len())
            .header(HEADER_HEIGHT, |mut header| {
                for h in headers {
                    header.col(|ui| {
                        ui.strong(h);
                    });
                }
            })
            .body(|mut body| {
                for c in &report.coefficients {
                    body.row(ROW_HEIGHT, |mut row| {
                        row.col(|ui| {
                            ui.strong(&c.name);
                        });
                        let cells = [
                            fmt_num(Some(c.estimate)),
                            fmt_num(Some(c.std_error)),
                            fmt_num(Some(c.t_value)),
                            fmt_p(c.p_value),
                            fmt_num(Some(c.ci_low)),
                            fmt_num(Some(c.ci_high)),
                        ];
                        for text in cells {
                            row.col(|ui| {
                                ui.monospace(text);
                            });
                        }
                    });
                }
            });
    });
}

/// Lower block of the summary: normality of the residuals and conditioning.
fn residual_diagnostics(ui: &mut Ui, report: &RegressionReport) {
    egui::Grid::new("ols_diagnostics")
        .num_columns(4)
        .spacing([24.0, 4.0])
        .striped(true)
        .show(ui, |ui: &mut Ui| {
            let pairs = [
                ("Omnibus:", fmt_num(Some(report.omnibus)), "Durbin-Watson:", fmt_num(Some(report.durbin_watson))),
                ("Prob(Omnibus):", fmt_p(report.omnibus_p), "Jarque-Bera (JB):", fmt_num(Some(report.jarque_bera))),
                ("Skew:", fmt_num(Some(report.skew)), "Prob(JB):", fmt_p(report.jarque_bera_p)),
                ("Kurtosis:", fmt_num(Some(report.kurtosis)), "Cond. No.:", fmt_cond(report.condition_number)),
            ];
            for (l1, v1, l2, v2) in pairs {
                ui.label(l1);
                ui.monospace(v1);
                ui.label(l2);
                ui.monospace(v2);
                ui.end_row();
            }
        });
}

fn fmt_cond(c: f64) -> String {
    if c.is_finite() && c >= 1e4 {
        format!("{c:.2e}")
    } else {
        format!("{c:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_formatted_like_a_summary_table() {
        assert_eq!(fmt_num(Some(3.0)), "3.0000");
        assert_eq!(fmt_num(None), "NaN");
        assert_eq!(fmt_num(Some(f64::INFINITY)), "inf");
        assert_eq!(fmt_p(0.1234), "0.123");
        assert_eq!(fmt_p(0.0), "0.00e0");
        assert_eq!(fmt_cond(8.3657), "8.4");
        assert_eq!(fmt_cond(123_456.0), "1.23e5");
    }
}

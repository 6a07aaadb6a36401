//! Ordinary least squares with the usual inferential summary.
//!
//! The fit solves the normal equations `XᵀX β = Xᵀy` through a Cholesky
//! factorisation of `XᵀX`; the same factorisation yields `(XᵀX)⁻¹` for the
//! coefficient covariance.

use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, StudentsT};

use super::charts::{Figure, FigureKind, RegressionPlot};
use super::error::ComputationError;
use crate::data::model::Column;

/// Name given to the intercept term.
pub const INTERCEPT: &str = "const";

/// Points the fitted line and confidence band are evaluated at.
const LINE_POINTS: usize = 100;

/// Smallest accepted ratio between a squared Cholesky pivot and the largest
/// diagonal entry of `XᵀX`; below it the design is treated as rank-deficient.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// The omnibus normality test needs at least this many residuals.
const OMNIBUS_MIN_OBS: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
    pub ci_low: f64,
    pub ci_high: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionReport {
    pub dependent: String,
    /// Intercept first, then the regressors in selection order.
    pub coefficients: Vec<Coefficient>,
    pub n_obs: usize,
    pub df_model: usize,
    pub df_resid: usize,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub f_statistic: f64,
    pub f_p_value: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    pub durbin_watson: f64,
    /// D'Agostino–Pearson K² of the residuals; NaN below eight observations.
    pub omnibus: f64,
    pub omnibus_p: f64,
    /// Residual skewness (biased moment estimate).
    pub skew: f64,
    /// Residual kurtosis, Pearson convention (3 for a normal).
    pub kurtosis: f64,
    pub jarque_bera: f64,
    pub jarque_bera_p: f64,
    /// Ratio of the largest to the smallest singular value of the design.
    pub condition_number: f64,
    pub fitted: Vec<f64>,
    pub residuals: Vec<f64>,
    /// Scatter plus fitted line; only for a single regressor.
    pub fitted_line: Option<Figure>,
}

/// Fit `dependent ~ const + independents`.
///
/// Rows with a missing value in any of the involved columns are dropped.
/// The columns must already be known to be numeric.
pub fn fit_ols(
    dependent: &Column,
    independents: &[&Column],
) -> Result<RegressionReport, ComputationError> {
    let k = independents.len() + 1;

    let rows: Vec<(f64, Vec<f64>)> = (0..dependent.values.len())
        .filter_map(|row| {
            let y = dependent.values[row].as_f64()?;
            let xs = independents
                .iter()
                .map(|c| c.values.get(row).and_then(|v| v.as_f64()))
                .collect::<Option<Vec<f64>>>()?;
            Some((y, xs))
        })
        .collect();

    let n = rows.len();
    if n <= k {
        return Err(ComputationError::TooFewObservations {
            needed: k + 1,
            found: n,
        });
    }

    let x = DMatrix::from_fn(n, k, |i, j| if j == 0 { 1.0 } else { rows[i].1[j - 1] });
    let y = DVector::from_iterator(n, rows.iter().map(|(y, _)| *y));

    let xtx = x.transpose() * &x;
    let xty = x.transpose() * &y;
    let chol = xtx.clone().cholesky().ok_or(ComputationError::SingularMatrix)?;

    let max_diag = xtx.diagonal().max();
    let min_pivot = chol.l().diagonal().map(|d| d * d).min();
    if !(min_pivot > PIVOT_TOLERANCE * max_diag) {
        return Err(ComputationError::SingularMatrix);
    }

    let beta = chol.solve(&xty);
    let xtx_inv = chol.inverse();
    if beta.iter().any(|b| !b.is_finite()) {
        return Err(ComputationError::SingularMatrix);
    }

    let fitted = &x * &beta;
    let residuals = &y - &fitted;

    let n_f = n as f64;
    let df_model = k - 1;
    let df_resid = n - k;
    let ssr = residuals.norm_squared();
    let y_mean = y.mean();
    let sst: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let ess = sst - ssr;
    let sigma2 = ssr / df_resid as f64;

    let r_squared = 1.0 - ssr / sst;
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (n_f - 1.0) / df_resid as f64;
    let f_statistic = (ess / df_model as f64) / sigma2;

    let t_dist = StudentsT::new(0.0, 1.0, df_resid as f64)
        .map_err(|e| ComputationError::Distribution(e.to_string()))?;
    let f_dist = FisherSnedecor::new(df_model as f64, df_resid as f64)
        .map_err(|e| ComputationError::Distribution(e.to_string()))?;
    let t_crit = t_dist.inverse_cdf(0.975);

    let names = std::iter::once(INTERCEPT).chain(independents.iter().map(|c| c.name.as_str()));
    let coefficients = names
        .enumerate()
        .map(|(j, name)| {
            let estimate = beta[j];
            let std_error = (sigma2 * xtx_inv[(j, j)]).sqrt();
            // An exact fit has no sampling error: t is infinite, even for a zero estimate.
            let t_value = if std_error == 0.0 {
                f64::INFINITY.copysign(estimate)
            } else {
                estimate / std_error
            };
            Coefficient {
                name: name.to_string(),
                estimate,
                std_error,
                t_value,
                p_value: two_sided_p(&t_dist, t_value),
                ci_low: estimate - t_crit * std_error,
                ci_high: estimate + t_crit * std_error,
            }
        })
        .collect();

    let log_likelihood =
        -n_f / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (ssr / n_f).ln() + 1.0);
    let aic = -2.0 * log_likelihood + 2.0 * k as f64;
    let bic = -2.0 * log_likelihood + k as f64 * n_f.ln();
    let durbin_watson = residuals
        .as_slice()
        .windows(2)
        .map(|w| (w[1] - w[0]).powi(2))
        .sum::<f64>()
        / ssr;

    let (skew, kurtosis) = skew_kurtosis(residuals.as_slice());
    let chi2 = ChiSquared::new(2.0).map_err(|e| ComputationError::Distribution(e.to_string()))?;
    let jarque_bera = n_f / 6.0 * (skew.powi(2) + (kurtosis - 3.0).powi(2) / 4.0);
    let omnibus = if n < OMNIBUS_MIN_OBS {
        f64::NAN
    } else {
        skew_z(skew, n_f).powi(2) + kurtosis_z(kurtosis, n_f).powi(2)
    };
    let singular = x.singular_values();
    let condition_number = singular.max() / singular.min();

    let fitted_line = match independents {
        [only] => Some(fitted_line_figure(
            only,
            dependent,
            &rows,
            &beta,
            &(xtx_inv * sigma2),
            t_crit,
        )),
        _ => None,
    };

    log::debug!(
        "OLS fit of {} on {} regressor(s): n={n}, R²={r_squared:.4}",
        dependent.name,
        df_model
    );

    Ok(RegressionReport {
        dependent: dependent.name.clone(),
        coefficients,
        n_obs: n,
        df_model,
        df_resid,
        r_squared,
        adj_r_squared,
        f_statistic,
        f_p_value: upper_tail_p(&f_dist, f_statistic),
        log_likelihood,
        aic,
        bic,
        durbin_watson,
        omnibus,
        omnibus_p: chi2_upper_p(&chi2, omnibus),
        skew,
        kurtosis,
        jarque_bera,
        jarque_bera_p: chi2_upper_p(&chi2, jarque_bera),
        condition_number,
        fitted: fitted.iter().copied().collect(),
        residuals: residuals.iter().copied().collect(),
        fitted_line,
    })
}

fn two_sided_p(dist: &StudentsT, t: f64) -> f64 {
    if t.is_nan() {
        f64::NAN
    } else if t.is_infinite() {
        0.0
    } else {
        (2.0 * dist.sf(t.abs())).min(1.0)
    }
}

fn upper_tail_p(dist: &FisherSnedecor, f: f64) -> f64 {
    if f.is_nan() {
        f64::NAN
    } else if f.is_infinite() {
        0.0
    } else if f <= 0.0 {
        1.0
    } else {
        dist.sf(f)
    }
}

fn chi2_upper_p(dist: &ChiSquared, x: f64) -> f64 {
    if x.is_nan() {
        f64::NAN
    } else if x.is_infinite() {
        0.0
    } else {
        dist.sf(x)
    }
}

/// Biased sample skewness and Pearson kurtosis from central moments.
fn skew_kurtosis(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let moment = |p: i32| values.iter().map(|v| (v - mean).powi(p)).sum::<f64>() / n;
    let m2 = moment(2);
    (moment(3) / m2.powf(1.5), moment(4) / m2.powi(2))
}

/// D'Agostino's normal approximation of the skewness.
fn skew_z(skew: f64, n: f64) -> f64 {
    let y = skew * ((n + 1.0) * (n + 3.0) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    delta * (y / alpha).asinh()
}

/// Anscombe–Glynn normal approximation of the kurtosis.
fn kurtosis_z(kurtosis: f64, n: f64) -> f64 {
    let expected = 3.0 * (n - 1.0) / (n + 1.0);
    let variance =
        24.0 * n * (n - 2.0) * (n - 3.0) / ((n + 1.0).powi(2) * (n + 3.0) * (n + 5.0));
    let x = (kurtosis - expected) / variance.sqrt();
    let sqrt_beta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * (6.0 * (n + 3.0) * (n + 5.0) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0
        + 8.0 / sqrt_beta1 * (2.0 / sqrt_beta1 + (1.0 + 4.0 / sqrt_beta1.powi(2)).sqrt());
    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    if denom == 0.0 {
        return f64::NAN;
    }
    let term2 = ((1.0 - 2.0 / a) / denom.abs()).cbrt().copysign(denom);
    (term1 - term2) / (2.0 / (9.0 * a)).sqrt()
}

/// Data points, fitted line and 95 % mean-confidence band for a
/// single-regressor fit.
fn fitted_line_figure(
    regressor: &Column,
    dependent: &Column,
    rows: &[(f64, Vec<f64>)],
    beta: &DVector<f64>,
    covariance: &DMatrix<f64>,
    t_crit: f64,
) -> Figure {
    let points: Vec<[f64; 2]> = rows.iter().map(|(y, xs)| [xs[0], *y]).collect();
    let lo = points.iter().map(|p| p[0]).fold(f64::INFINITY, f64::min);
    let hi = points.iter().map(|p| p[0]).fold(f64::NEG_INFINITY, f64::max);
    let step = (hi - lo) / (LINE_POINTS - 1) as f64;

    let mut line = Vec::with_capacity(LINE_POINTS);
    let mut band = Vec::with_capacity(LINE_POINTS);
    for i in 0..LINE_POINTS {
        let x0 = lo + step * i as f64;
        let y0 = beta[0] + beta[1] * x0;
        let var = covariance[(0, 0)] + 2.0 * x0 * covariance[(0, 1)] + x0 * x0 * covariance[(1, 1)];
        let half = t_crit * var.max(0.0).sqrt();
        line.push([x0, y0]);
        band.push((x0, y0 - half, y0 + half));
    }

    Figure {
        title: format!("{} vs {}", dependent.name, regressor.name),
        x_label: regressor.name.clone(),
        y_label: dependent.name.clone(),
        x_categories: None,
        y_categories: None,
        kind: FigureKind::Regression(RegressionPlot { points, line, band }),
    }
}

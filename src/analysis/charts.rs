use std::collections::{BTreeMap, BTreeSet, HashMap};

use eframe::egui::Color32;

use super::selection::{ChartKind, ChartParams};
use super::stats::{mean, quantile_sorted, sample_std};
use crate::color::{blue_red, ColorMap};
use crate::data::model::{CellValue, Column, Dataset};

/// z-value for a two-sided 95 % normal interval.
const Z_95: f64 = 1.96;

// ---------------------------------------------------------------------------
// Figure model
// ---------------------------------------------------------------------------

/// A chart ready to be drawn: labels plus the computed series.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Tick labels when the x axis shows categories at positions 0, 1, 2, …
    pub x_categories: Option<Vec<String>>,
    /// Same for the y axis (scatter over a categorical y).
    pub y_categories: Option<Vec<String>>,
    pub kind: FigureKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FigureKind {
    Bar(Vec<BarGroup>),
    Line(Vec<LinePoint>),
    Scatter(ScatterSeries),
    Histogram(Histogram),
    Box(Vec<BoxGroup>),
    Regression(RegressionPlot),
}

/// One bar: mean of y over the rows sharing an x value.
#[derive(Debug, Clone, PartialEq)]
pub struct BarGroup {
    pub position: f64,
    pub label: String,
    pub mean: f64,
    /// 95 % confidence half-width; `None` for groups of one.
    pub ci_half_width: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinePoint {
    pub x: f64,
    pub mean: f64,
    pub ci_half_width: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    /// Source row, for hover details.
    pub row: usize,
    pub color: Color32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColorLegend {
    Continuous { column: String, min: f64, max: f64 },
    Categorical { column: String, entries: Vec<(String, Color32)> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterSeries {
    pub points: Vec<ScatterPoint>,
    pub legend: Option<ColorLegend>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `counts.len() + 1` ascending edges.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
    /// Density estimate scaled to counts, as `[x, y]` points.
    pub kde: Option<Vec<[f64; 2]>>,
}

impl Histogram {
    pub fn bin_width(&self) -> f64 {
        match (self.edges.first(), self.edges.get(1)) {
            (Some(a), Some(b)) => b - a,
            _ => 0.0,
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxGroup {
    pub position: f64,
    pub label: String,
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
    pub count: usize,
}

/// Scatter of the data plus the fitted line of a one-regressor OLS fit.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionPlot {
    pub points: Vec<[f64; 2]>,
    pub line: Vec<[f64; 2]>,
    /// `(x, lower, upper)` of the 95 % confidence band of the mean.
    pub band: Vec<(f64, f64, f64)>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Compute the series for one chart kind.
///
/// Column kinds are validated by the dispatcher; cells that are not usable
/// here (nulls, text in a numeric role) are skipped.
pub fn render_chart(
    dataset: &Dataset,
    kind: ChartKind,
    x: &Column,
    y: &Column,
    params: &ChartParams,
) -> Figure {
    match kind {
        ChartKind::Bar => bar_chart(x, y),
        ChartKind::Line => line_chart(x, y),
        ChartKind::Scatter => scatter_chart(dataset, x, y),
        ChartKind::Histogram => histogram_chart(x, params),
        ChartKind::Box => box_chart(x, y),
    }
}

// ---------------------------------------------------------------------------
// Axis helpers
// ---------------------------------------------------------------------------

/// Plot positions of a column. Numeric columns use their values; other
/// columns map each distinct value to 0, 1, 2, … by first appearance.
struct Axis {
    positions: Vec<Option<f64>>,
    categories: Option<Vec<String>>,
}

fn axis_for(column: &Column) -> Axis {
    if column.is_numeric() {
        return Axis {
            positions: column.numeric_values(),
            categories: None,
        };
    }

    let mut index: HashMap<&CellValue, usize> = HashMap::new();
    let mut labels = Vec::new();
    let positions = column
        .values
        .iter()
        .map(|v| {
            if v.is_null() {
                return None;
            }
            let next = index.len();
            let i = *index.entry(v).or_insert_with(|| {
                labels.push(v.to_string());
                next
            });
            Some(i as f64)
        })
        .collect();

    Axis {
        positions,
        categories: Some(labels),
    }
}

/// Group the numeric y values by x. Numeric x groups are sorted by value,
/// others keep their order of first appearance. Rows with a null x or y are
/// dropped.
fn group_by_x(x: &Column, y: &Column) -> Vec<(String, Vec<f64>)> {
    let pairs = x
        .values
        .iter()
        .zip(y.values.iter())
        .filter(|(xv, _)| !xv.is_null())
        .filter_map(|(xv, yv)| yv.as_f64().map(|yf| (xv, yf)));

    if x.is_numeric() {
        let mut groups: BTreeMap<&CellValue, Vec<f64>> = BTreeMap::new();
        for (xv, yf) in pairs {
            groups.entry(xv).or_default().push(yf);
        }
        return groups
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
    }

    let mut order: HashMap<&CellValue, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
    for (xv, yf) in pairs {
        let i = *order.entry(xv).or_insert_with(|| {
            groups.push((xv.to_string(), Vec::new()));
            groups.len() - 1
        });
        groups[i].1.push(yf);
    }
    groups
}

/// Normal-approximation 95 % half-width of a group mean.
fn ci_half_width(values: &[f64]) -> Option<f64> {
    sample_std(values).map(|s| Z_95 * s / (values.len() as f64).sqrt())
}

// ---------------------------------------------------------------------------
// Bar / line
// ---------------------------------------------------------------------------

fn bar_chart(x: &Column, y: &Column) -> Figure {
    let groups: Vec<BarGroup> = group_by_x(x, y)
        .into_iter()
        .enumerate()
        .filter_map(|(i, (label, values))| {
            Some(BarGroup {
                position: i as f64,
                label,
                mean: mean(&values)?,
                ci_half_width: ci_half_width(&values),
                count: values.len(),
            })
        })
        .collect();

    Figure {
        title: "Bar Plot".into(),
        x_label: x.name.clone(),
        y_label: y.name.clone(),
        x_categories: Some(groups.iter().map(|g| g.label.clone()).collect()),
        y_categories: None,
        kind: FigureKind::Bar(groups),
    }
}

fn line_chart(x: &Column, y: &Column) -> Figure {
    let axis = axis_for(x);

    // Position of each group: its numeric value, or its category index.
    let mut by_position: BTreeMap<u64, (f64, Vec<f64>)> = BTreeMap::new();
    for (pos, yv) in axis.positions.iter().zip(y.values.iter()) {
        let (Some(p), Some(yf)) = (pos, yv.as_f64()) else {
            continue;
        };
        by_position
            .entry(order_key(*p))
            .or_insert_with(|| (*p, Vec::new()))
            .1
            .push(yf);
    }

    let points = by_position
        .into_values()
        .filter_map(|(p, values)| {
            Some(LinePoint {
                x: p,
                mean: mean(&values)?,
                ci_half_width: ci_half_width(&values),
            })
        })
        .collect();

    Figure {
        title: "Line Plot".into(),
        x_label: x.name.clone(),
        y_label: y.name.clone(),
        x_categories: axis.categories,
        y_categories: None,
        kind: FigureKind::Line(points),
    }
}

/// Map an `f64` to a `u64` with the same total order, for use as a map key.
fn order_key(v: f64) -> u64 {
    let bits = v.to_bits();
    if bits >> 63 == 1 {
        !bits
    } else {
        bits | (1 << 63)
    }
}

// ---------------------------------------------------------------------------
// Scatter
// ---------------------------------------------------------------------------

fn scatter_chart(dataset: &Dataset, x: &Column, y: &Column) -> Figure {
    let x_axis = axis_for(x);
    let y_axis = axis_for(y);

    let (colors, legend) = match dataset.first_column() {
        Some(first) => color_by(first),
        None => (vec![Color32::LIGHT_BLUE; dataset.len()], None),
    };

    let points = x_axis
        .positions
        .iter()
        .zip(y_axis.positions.iter())
        .enumerate()
        .filter_map(|(row, (xp, yp))| {
            Some(ScatterPoint {
                x: (*xp)?,
                y: (*yp)?,
                row,
                color: colors.get(row).copied().unwrap_or(Color32::GRAY),
            })
        })
        .collect();

    Figure {
        title: "Scatter Plot".into(),
        x_label: x.name.clone(),
        y_label: y.name.clone(),
        x_categories: x_axis.categories,
        y_categories: y_axis.categories,
        kind: FigureKind::Scatter(ScatterSeries { points, legend }),
    }
}

/// One colour per row from the colouring column: a blue → red gradient for
/// numeric columns, a distinct palette colour per value otherwise.
fn color_by(column: &Column) -> (Vec<Color32>, Option<ColorLegend>) {
    if column.is_numeric() {
        let present = column.present_numbers();
        let min = present.iter().copied().fold(f64::INFINITY, f64::min);
        let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if present.is_empty() {
            return (vec![Color32::GRAY; column.values.len()], None);
        }
        let range = max - min;
        let colors = column
            .values
            .iter()
            .map(|v| match v.as_f64() {
                Some(f) if range > 0.0 => blue_red((f - min) / range),
                Some(_) => blue_red(0.0),
                None => Color32::GRAY,
            })
            .collect();
        let legend = ColorLegend::Continuous {
            column: column.name.clone(),
            min,
            max,
        };
        return (colors, Some(legend));
    }

    let unique: BTreeSet<CellValue> = column
        .values
        .iter()
        .filter(|v| !v.is_null())
        .cloned()
        .collect();
    let map = ColorMap::new(&column.name, &unique);
    let colors = column.values.iter().map(|v| map.color_for(v)).collect();
    let legend = ColorLegend::Categorical {
        column: map.column.clone(),
        entries: map.legend_entries(),
    };
    (colors, Some(legend))
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

fn histogram_chart(x: &Column, params: &ChartParams) -> Figure {
    let values = x.present_numbers();
    Figure {
        title: "Histogram".into(),
        x_label: x.name.clone(),
        y_label: "Frequency".into(),
        x_categories: None,
        y_categories: None,
        kind: FigureKind::Histogram(histogram(&values, params.bins(), params.kde_grid)),
    }
}

/// Equal-width bins from min to max; every bin is half-open except the last,
/// which also takes the maximum, so the counts sum to `values.len()`.
pub fn histogram(values: &[f64], bins: usize, kde_grid: usize) -> Histogram {
    let bins = bins.max(1);
    if values.is_empty() {
        return Histogram {
            edges: Vec::new(),
            counts: Vec::new(),
            kde: None,
        };
    }

    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins)
        .map(|i| if i == bins { hi } else { lo + width * i as f64 })
        .collect();

    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let kde = gaussian_kde(values, lo, hi, kde_grid)
        .map(|curve| {
            let scale = values.len() as f64 * width;
            curve.into_iter().map(|[x, d]| [x, d * scale]).collect()
        });

    Histogram { edges, counts, kde }
}

/// Gaussian kernel density with Scott's bandwidth, evaluated on `grid`
/// evenly spaced points over `lo..=hi`.
fn gaussian_kde(values: &[f64], lo: f64, hi: f64, grid: usize) -> Option<Vec<[f64; 2]>> {
    let sigma = sample_std(values)?;
    if sigma <= 0.0 || grid < 2 {
        return None;
    }
    let n = values.len() as f64;
    let bandwidth = sigma * n.powf(-0.2);
    let norm = 1.0 / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    let step = (hi - lo) / (grid - 1) as f64;

    Some(
        (0..grid)
            .map(|i| {
                let x = lo + step * i as f64;
                let density: f64 = values
                    .iter()
                    .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                    .sum();
                [x, density * norm]
            })
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Box plot
// ---------------------------------------------------------------------------

fn box_chart(x: &Column, y: &Column) -> Figure {
    let groups: Vec<BoxGroup> = group_by_x(x, y)
        .into_iter()
        .enumerate()
        .filter_map(|(i, (label, values))| box_group(i as f64, label, values))
        .collect();

    Figure {
        title: "Box Plot".into(),
        x_label: x.name.clone(),
        y_label: y.name.clone(),
        x_categories: Some(groups.iter().map(|g| g.label.clone()).collect()),
        y_categories: None,
        kind: FigureKind::Box(groups),
    }
}

/// Quartiles plus whiskers at the furthest points within 1.5 · IQR.
fn box_group(position: f64, label: String, mut values: Vec<f64>) -> Option<BoxGroup> {
    values.sort_by(f64::total_cmp);
    let q1 = quantile_sorted(&values, 0.25)?;
    let median = quantile_sorted(&values, 0.5)?;
    let q3 = quantile_sorted(&values, 0.75)?;
    let iqr = q3 - q1;
    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    let inside = values
        .iter()
        .copied()
        .filter(|v| *v >= lower_fence && *v <= upper_fence);
    let lower_whisker = inside.clone().fold(f64::INFINITY, f64::min);
    let upper_whisker = inside.fold(f64::NEG_INFINITY, f64::max);
    let outliers = values
        .iter()
        .copied()
        .filter(|v| *v < lower_fence || *v > upper_fence)
        .collect();

    Some(BoxGroup {
        position,
        label,
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
        outliers,
        count: values.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testing::{assert_close, numeric_column, text_column};

    fn params(bins: usize) -> ChartParams {
        ChartParams {
            num_bins: bins,
            ..ChartParams::default()
        }
    }

    #[test]
    fn ten_bins_over_uniform_values() {
        let values: Vec<f64> = (1..=100).map(f64::from).collect();
        let h = histogram(&values, 10, 200);
        assert_eq!(h.counts.len(), 10);
        assert_eq!(h.edges.len(), 11);
        assert_eq!(h.total(), 100);
        assert!(h.counts.iter().all(|&c| c == 10));
        assert_eq!(h.edges[0], 1.0);
        assert_eq!(h.edges[10], 100.0);
        for pair in h.edges.windows(2) {
            assert_close(pair[1] - pair[0], 9.9, 1e-9);
        }
    }

    #[test]
    fn requested_bins_are_clamped() {
        let col = numeric_column("v", &[1.0, 2.0, 3.0, 4.0]);
        let ds = Dataset::from_columns(vec![col.clone()]);

        let fig = render_chart(&ds, ChartKind::Histogram, &col, &col, &params(2));
        let FigureKind::Histogram(h) = fig.kind else {
            panic!("expected histogram");
        };
        assert_eq!(h.counts.len(), 5);

        let fig = render_chart(&ds, ChartKind::Histogram, &col, &col, &params(99));
        let FigureKind::Histogram(h) = fig.kind else {
            panic!("expected histogram");
        };
        assert_eq!(h.counts.len(), 50);
        assert_eq!(h.total(), 4);
        assert_eq!(fig.y_label, "Frequency");
    }

    #[test]
    fn histogram_skips_nan_cells_from_a_file() {
        let ds = crate::data::loader::load_bytes(b"v\n1\n-nan\n3\nNAN\n2\n").unwrap();
        let v = ds.column("v").unwrap();

        let fig = render_chart(&ds, ChartKind::Histogram, v, v, &params(5));
        let FigureKind::Histogram(h) = fig.kind else {
            panic!("expected histogram");
        };
        assert_eq!(h.total(), 3);
        assert_eq!(h.edges[0], 1.0);
        assert_eq!(h.edges[5], 3.0);
        assert_eq!(h.counts, vec![1, 0, 1, 0, 1]);
    }

    #[test]
    fn constant_column_gets_unit_range() {
        let h = histogram(&[3.0, 3.0, 3.0], 5, 200);
        assert_eq!(h.edges[0], 2.5);
        assert_eq!(h.edges[5], 3.5);
        assert_eq!(h.total(), 3);
        assert!(h.kde.is_none());
    }

    #[test]
    fn kde_area_matches_histogram_area() {
        let values: Vec<f64> = (0..200).map(|i| ((i * 37) % 101) as f64).collect();
        let h = histogram(&values, 10, 400);
        let kde = h.kde.as_ref().unwrap();
        assert_eq!(kde.len(), 400);
        // Trapezoid area under the scaled curve stays near n · width
        // (a little lower because the tails beyond the data are cut).
        let area: f64 = kde
            .windows(2)
            .map(|w| (w[1][0] - w[0][0]) * (w[0][1] + w[1][1]) / 2.0)
            .sum();
        let expected = values.len() as f64 * h.bin_width();
        assert!(area > 0.8 * expected && area <= expected * 1.01, "{area} vs {expected}");
    }

    #[test]
    fn bars_are_group_means_in_order_of_appearance() {
        let x = text_column("city", &["Oslo", "Rome", "Oslo", "Rome", "Lima"]);
        let y = numeric_column("temp", &[2.0, 20.0, 4.0, 22.0, 18.0]);
        let ds = Dataset::from_columns(vec![x.clone(), y.clone()]);

        let fig = render_chart(&ds, ChartKind::Bar, &x, &y, &ChartParams::default());
        let FigureKind::Bar(groups) = &fig.kind else {
            panic!("expected bars");
        };
        let summary: Vec<(&str, f64, usize)> = groups
            .iter()
            .map(|g| (g.label.as_str(), g.mean, g.count))
            .collect();
        assert_eq!(summary, vec![("Oslo", 3.0, 2), ("Rome", 21.0, 2), ("Lima", 18.0, 1)]);
        assert!(groups[2].ci_half_width.is_none());
        assert_close(groups[0].ci_half_width.unwrap(), 1.96 * 2f64.sqrt() / 2f64.sqrt(), 1e-12);
        assert_eq!(fig.x_label, "city");
        assert_eq!(fig.y_label, "temp");
    }

    #[test]
    fn line_points_are_sorted_numeric_means() {
        let x = numeric_column("t", &[3.0, 1.0, 2.0, 1.0]);
        let y = numeric_column("v", &[30.0, 10.0, 20.0, 12.0]);
        let ds = Dataset::from_columns(vec![x.clone(), y.clone()]);

        let fig = render_chart(&ds, ChartKind::Line, &x, &y, &ChartParams::default());
        let FigureKind::Line(points) = fig.kind else {
            panic!("expected line");
        };
        let xy: Vec<(f64, f64)> = points.iter().map(|p| (p.x, p.mean)).collect();
        assert_eq!(xy, vec![(1.0, 11.0), (2.0, 20.0), (3.0, 30.0)]);
        assert!(fig.x_categories.is_none());
    }

    #[test]
    fn order_key_preserves_float_order() {
        let mut values = vec![3.5, -1.0, 0.0, -7.25, 2.0];
        let mut keys: Vec<u64> = values.iter().map(|v| order_key(*v)).collect();
        keys.sort_unstable();
        values.sort_by(f64::total_cmp);
        let expected: Vec<u64> = values.iter().map(|v| order_key(*v)).collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn scatter_is_coloured_by_first_column_with_categorical_legend() {
        let group = text_column("group", &["a", "b", "a"]);
        let x = numeric_column("x", &[1.0, 2.0, 3.0]);
        let y = numeric_column("y", &[4.0, 5.0, 6.0]);
        let ds = Dataset::from_columns(vec![group, x.clone(), y.clone()]);

        let fig = render_chart(&ds, ChartKind::Scatter, &x, &y, &ChartParams::default());
        let FigureKind::Scatter(series) = fig.kind else {
            panic!("expected scatter");
        };
        assert_eq!(series.points.len(), 3);
        assert_eq!(series.points[0].color, series.points[2].color);
        assert_ne!(series.points[0].color, series.points[1].color);
        assert_eq!(series.points[1].row, 1);
        match series.legend {
            Some(ColorLegend::Categorical { column, entries }) => {
                assert_eq!(column, "group");
                assert_eq!(entries.len(), 2);
            }
            other => panic!("unexpected legend {other:?}"),
        }
    }

    #[test]
    fn scatter_with_numeric_first_column_uses_gradient() {
        let x = numeric_column("x", &[0.0, 5.0, 10.0]);
        let y = text_column("kind", &["lo", "hi", "lo"]);
        let ds = Dataset::from_columns(vec![x.clone(), y.clone()]);

        let fig = render_chart(&ds, ChartKind::Scatter, &x, &y, &ChartParams::default());
        assert_eq!(fig.y_categories, Some(vec!["lo".to_string(), "hi".to_string()]));
        let FigureKind::Scatter(series) = fig.kind else {
            panic!("expected scatter");
        };
        assert_eq!(series.points[0].color, blue_red(0.0));
        assert_eq!(series.points[2].color, blue_red(1.0));
        assert_eq!(series.points[1].y, 1.0);
        assert_eq!(
            series.legend,
            Some(ColorLegend::Continuous {
                column: "x".into(),
                min: 0.0,
                max: 10.0
            })
        );
    }

    #[test]
    fn box_groups_follow_iqr_rule() {
        let x = text_column("g", &["a"; 9]);
        let y = numeric_column("v", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 40.0]);
        let ds = Dataset::from_columns(vec![x.clone(), y.clone()]);

        let fig = render_chart(&ds, ChartKind::Box, &x, &y, &ChartParams::default());
        let FigureKind::Box(groups) = fig.kind else {
            panic!("expected box plot");
        };
        let g = &groups[0];
        assert_eq!((g.q1, g.median, g.q3), (3.0, 5.0, 7.0));
        assert_eq!(g.lower_whisker, 1.0);
        assert_eq!(g.upper_whisker, 8.0);
        assert_eq!(g.outliers, vec![40.0]);
        assert_eq!(g.count, 9);
    }

    #[test]
    fn nulls_are_skipped() {
        let x = Column::new(
            "x",
            vec![CellValue::Integer(1), CellValue::Null, CellValue::Integer(1)],
        );
        let y = Column::new(
            "y",
            vec![CellValue::Integer(2), CellValue::Integer(9), CellValue::Null],
        );
        let ds = Dataset::from_columns(vec![x.clone(), y.clone()]);
        let fig = render_chart(&ds, ChartKind::Bar, &x, &y, &ChartParams::default());
        let FigureKind::Bar(groups) = fig.kind else {
            panic!("expected bars");
        };
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].mean, 2.0);
        assert_eq!(groups[0].label, "1");
    }
}

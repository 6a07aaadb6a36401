use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, Plot, PlotPoint,
    PlotPoints, PlotUi, Points, Polygon,
};

use crate::analysis::charts::{
    BarGroup, BoxGroup, ColorLegend, Figure, FigureKind, Histogram, LinePoint, RegressionPlot,
    ScatterSeries,
};
use crate::color::generate_palette;
use crate::data::model::Dataset;

const SKY_BLUE: Color32 = Color32::from_rgb(135, 206, 235);
const BAND_FILL: Color32 = Color32::from_rgba_premultiplied(60, 60, 120, 50);
const HOVER_RADIUS_PX: f32 = 8.0;

// ---------------------------------------------------------------------------
// Figure plot (central panel)
// ---------------------------------------------------------------------------

/// Draw a computed [`Figure`]. Scatter points show the full source row of
/// the point under the cursor.
pub fn figure_plot(ui: &mut Ui, id: &str, figure: &Figure, dataset: &Dataset) {
    let mut plot = Plot::new(id)
        .legend(Legend::default())
        .x_axis_label(figure.x_label.clone())
        .y_axis_label(figure.y_label.clone())
        .height(420.0)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);

    if let Some(labels) = &figure.x_categories {
        plot = plot.x_axis_formatter(category_formatter(labels.clone()));
    }
    if let Some(labels) = &figure.y_categories {
        plot = plot.y_axis_formatter(category_formatter(labels.clone()));
    }

    let response = plot.show(ui, |plot_ui| match &figure.kind {
        FigureKind::Bar(groups) => {
            draw_bars(plot_ui, groups);
            None
        }
        FigureKind::Line(points) => {
            draw_line(plot_ui, points, &figure.y_label);
            None
        }
        FigureKind::Scatter(series) => draw_scatter(plot_ui, series),
        FigureKind::Histogram(h) => {
            draw_histogram(plot_ui, h);
            None
        }
        FigureKind::Box(groups) => {
            draw_boxes(plot_ui, groups);
            None
        }
        FigureKind::Regression(r) => {
            draw_regression(plot_ui, r);
            None
        }
    });

    if let Some(row) = response.inner {
        response.response.on_hover_ui_at_pointer(|ui: &mut Ui| {
            for (name, value) in dataset.row(row) {
                ui.label(format!("{name}: {value}"));
            }
        });
    }

    if let FigureKind::Scatter(ScatterSeries {
        legend: Some(ColorLegend::Continuous { column, min, max }),
        ..
    }) = &figure.kind
    {
        ui.label(
            RichText::new(format!("Colour: {column}  (blue = {min:.3} … red = {max:.3})")).weak(),
        );
    }
}

/// Tick labels for category positions 0, 1, 2, …; other ticks stay blank.
fn category_formatter(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark: GridMark, _range: &RangeInclusive<f64>| {
        let rounded = mark.value.round();
        if (mark.value - rounded).abs() > 1e-6 || rounded < 0.0 {
            return String::new();
        }
        labels.get(rounded as usize).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Per-kind drawing
// ---------------------------------------------------------------------------

fn draw_bars(plot_ui: &mut PlotUi, groups: &[BarGroup]) {
    let colors = generate_palette(groups.len());
    let bars: Vec<Bar> = groups
        .iter()
        .zip(colors)
        .map(|(g, c)| Bar::new(g.position, g.mean).width(0.7).name(&g.label).fill(c))
        .collect();
    plot_ui.bar_chart(BarChart::new(bars));

    for g in groups {
        if let Some(ci) = g.ci_half_width {
            let whisker = vec![[g.position, g.mean - ci], [g.position, g.mean + ci]];
            plot_ui.line(Line::new(PlotPoints::new(whisker)).color(Color32::DARK_GRAY).width(2.0));
        }
    }
}

fn draw_line(plot_ui: &mut PlotUi, points: &[LinePoint], name: &str) {
    let band: Vec<(f64, f64, f64)> = points
        .iter()
        .map(|p| {
            let ci = p.ci_half_width.unwrap_or(0.0);
            (p.x, p.mean - ci, p.mean + ci)
        })
        .collect();
    draw_band(plot_ui, &band, BAND_FILL);

    let line: PlotPoints = points.iter().map(|p| [p.x, p.mean]).collect();
    plot_ui.line(Line::new(line).name(name).width(2.0));
}

/// Fill between lower and upper bounds, one quad per segment so each piece
/// stays convex.
fn draw_band(plot_ui: &mut PlotUi, band: &[(f64, f64, f64)], fill: Color32) {
    for w in band.windows(2) {
        let (x0, lo0, hi0) = w[0];
        let (x1, lo1, hi1) = w[1];
        if lo0 == hi0 && lo1 == hi1 {
            continue;
        }
        let quad = vec![[x0, lo0], [x1, lo1], [x1, hi1], [x0, hi0]];
        plot_ui.polygon(
            Polygon::new(PlotPoints::new(quad))
                .fill_color(fill)
                .stroke((0.0, fill)),
        );
    }
}

/// Returns the source row of the point under the cursor, if any.
fn draw_scatter(plot_ui: &mut PlotUi, series: &ScatterSeries) -> Option<usize> {
    let names: BTreeMap<[u8; 4], String> = match &series.legend {
        Some(ColorLegend::Categorical { entries, .. }) => entries
            .iter()
            .map(|(label, c)| (c.to_array(), label.clone()))
            .collect(),
        _ => BTreeMap::new(),
    };

    let mut by_color: BTreeMap<[u8; 4], Vec<[f64; 2]>> = BTreeMap::new();
    for p in &series.points {
        by_color.entry(p.color.to_array()).or_default().push([p.x, p.y]);
    }
    for (rgba, points) in by_color {
        let color = Color32::from_rgba_premultiplied(rgba[0], rgba[1], rgba[2], rgba[3]);
        let mut layer = Points::new(points).color(color).radius(3.0);
        if let Some(name) = names.get(&rgba) {
            layer = layer.name(name);
        }
        plot_ui.points(layer);
    }

    let pointer = plot_ui.pointer_coordinate()?;
    let cursor = plot_ui.screen_from_plot(pointer);
    series
        .points
        .iter()
        .map(|p| {
            let pos = plot_ui.screen_from_plot(PlotPoint::new(p.x, p.y));
            (p.row, pos.distance(cursor))
        })
        .filter(|(_, d)| *d <= HOVER_RADIUS_PX)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(row, _)| row)
}

fn draw_histogram(plot_ui: &mut PlotUi, h: &Histogram) {
    let width = h.bin_width();
    let bars: Vec<Bar> = h
        .edges
        .windows(2)
        .zip(&h.counts)
        .map(|(edge, &count)| {
            Bar::new((edge[0] + edge[1]) / 2.0, count as f64)
                .width(width)
                .fill(SKY_BLUE)
        })
        .collect();
    let name = format!("count (n = {})", h.total());
    plot_ui.bar_chart(BarChart::new(bars).name(name).color(SKY_BLUE));

    if let Some(kde) = &h.kde {
        plot_ui.line(
            Line::new(PlotPoints::new(kde.clone()))
                .name("KDE")
                .color(Color32::from_rgb(30, 90, 160))
                .width(2.0),
        );
    }
}

fn draw_boxes(plot_ui: &mut PlotUi, groups: &[BoxGroup]) {
    let colors = generate_palette(groups.len());
    let boxes: Vec<BoxElem> = groups
        .iter()
        .zip(&colors)
        .map(|(g, c)| {
            let spread = BoxSpread::new(g.lower_whisker, g.q1, g.median, g.q3, g.upper_whisker);
            BoxElem::new(g.position, spread)
                .name(&g.label)
                .box_width(0.5)
                .fill(c.gamma_multiply(0.6))
                .stroke((1.5, *c))
        })
        .collect();
    plot_ui.box_plot(BoxPlot::new(boxes));

    let outliers: Vec<[f64; 2]> = groups
        .iter()
        .flat_map(|g| g.outliers.iter().map(move |v| [g.position, *v]))
        .collect();
    if !outliers.is_empty() {
        plot_ui.points(Points::new(outliers).radius(3.0).color(Color32::DARK_GRAY).name("outliers"));
    }
}

fn draw_regression(plot_ui: &mut PlotUi, r: &RegressionPlot) {
    draw_band(plot_ui, &r.band, Color32::from_rgba_premultiplied(120, 20, 20, 40));
    plot_ui.points(
        Points::new(r.points.clone())
            .radius(3.0)
            .color(Color32::BLACK)
            .name("observed"),
    );
    plot_ui.line(
        Line::new(PlotPoints::new(r.line.clone()))
            .color(Color32::RED)
            .width(2.0)
            .name("fitted"),
    );
}

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::analysis::selection::{AnalysisMode, ChartKind, ChartParams, Selection};
use crate::analysis::ComputationResult;
use crate::data::model::Dataset;
use crate::state::AppState;
use crate::ui::{plot, report};

const ACCENT: Color32 = Color32::from_rgb(0x4C, 0xAF, 0x50);

// ---------------------------------------------------------------------------
// Left side panel – analysis selection
// ---------------------------------------------------------------------------

/// Render the left panel. Widgets only build the next [`Selection`]; the
/// state recomputes when it differs from the current one.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading(RichText::new("Choose your Analysis").color(ACCENT));
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };

    let columns = dataset.column_names();
    let current = state.selection.clone();

    let next = ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            let mut next = current;
            ui.strong("Select the type of analysis");
            if let Some(mode) = mode_combo(ui, next.mode) {
                next = next.with_mode(mode);
            }
            ui.separator();

            match next.mode {
                AnalysisMode::Stats => next,
                AnalysisMode::Plot => plot_controls(ui, next, &columns),
                AnalysisMode::Regression => regression_controls(ui, next, dataset),
            }
        })
        .inner;

    state.apply_selection(next);
}

fn mode_combo(ui: &mut Ui, current: AnalysisMode) -> Option<AnalysisMode> {
    let mut picked = None;
    egui::ComboBox::from_id_salt("analysis_mode")
        .selected_text(current.label())
        .show_ui(ui, |ui: &mut Ui| {
            for mode in AnalysisMode::ALL {
                if ui.selectable_label(current == mode, mode.label()).clicked() {
                    picked = Some(mode);
                }
            }
        });
    picked
}

fn plot_controls(ui: &mut Ui, mut next: Selection, columns: &[String]) -> Selection {
    let first = columns.first().map(String::as_str).unwrap_or_default();

    ui.strong("Select X-axis");
    if let Some(col) = column_combo(ui, "x_axis", next.x_column.as_deref().unwrap_or(first), columns) {
        next = next.with_x_column(col);
    }

    if next.chart_kind.uses_y() {
        ui.strong("Select Y-axis");
        if let Some(col) =
            column_combo(ui, "y_axis", next.y_column.as_deref().unwrap_or(first), columns)
        {
            next = next.with_y_column(col);
        }
    }
    ui.separator();

    ui.strong("Type of graph");
    let mut picked = None;
    egui::ComboBox::from_id_salt("chart_kind")
        .selected_text(next.chart_kind.label())
        .show_ui(ui, |ui: &mut Ui| {
            for kind in ChartKind::ALL {
                if ui.selectable_label(next.chart_kind == kind, kind.label()).clicked() {
                    picked = Some(kind);
                }
            }
        });
    if let Some(kind) = picked {
        next = next.with_chart_kind(kind);
    }

    if next.chart_kind == ChartKind::Histogram {
        let mut bins = next.chart_params.bins();
        let slider = egui::Slider::new(&mut bins, ChartParams::MIN_BINS..=ChartParams::MAX_BINS)
            .text("Number of bins");
        if ui.add(slider).changed() {
            next = next.with_num_bins(bins);
        }
    }
    next
}

fn regression_controls(ui: &mut Ui, mut next: Selection, dataset: &Dataset) -> Selection {
    let columns = dataset.column_names();
    let first = columns.first().map(String::as_str).unwrap_or_default();

    ui.strong("Dependent Variable (y)");
    if let Some(col) = column_combo(
        ui,
        "dependent_var",
        next.dependent_var.as_deref().unwrap_or(first),
        &columns,
    ) {
        next = next.with_dependent_var(col);
    }
    ui.separator();

    ui.strong("Independent Variable(s) (x)");
    let mut toggled = Vec::new();
    for column in dataset.columns() {
        let mut checked = next.independent_vars.contains(&column.name);
        let text = RichText::new(&column.name);
        let text = if column.is_numeric() { text } else { text.weak() };
        if ui
            .checkbox(&mut checked, text)
            .on_hover_text(column.kind.to_string())
            .changed()
        {
            toggled.push((column.name.clone(), checked));
        }
    }
    for (name, included) in toggled {
        next = next.with_independent(&name, included);
    }
    next
}

/// Combo box over the dataset's columns; returns the newly picked column.
fn column_combo(ui: &mut Ui, id: &str, current: &str, columns: &[String]) -> Option<String> {
    let mut picked = None;
    egui::ComboBox::from_id_salt(id)
        .selected_text(current)
        .show_ui(ui, |ui: &mut Ui| {
            for col in columns {
                if ui.selectable_label(current == col, col).clicked() {
                    picked = Some(col.clone());
                }
            }
        });
    picked
}

// ---------------------------------------------------------------------------
// Central panel – preview and result
// ---------------------------------------------------------------------------

pub fn central_panel(ui: &mut Ui, state: &AppState) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading(RichText::new("Statistical Analysis").size(28.0).color(ACCENT));
    });
    ui.add_space(8.0);

    let Some(dataset) = &state.dataset else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Upload your CSV file  (File → Open…, or drop it here)");
        });
        return;
    };

    if dataset.is_empty() {
        ui.label(RichText::new("The file has a header but no data rows.").weak());
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            egui::CollapsingHeader::new(RichText::new("Data Preview").strong())
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    report::data_preview(ui, dataset, state.config.preview_rows);
                });
            ui.separator();

            let selection = &state.selection;
            if selection.mode == AnalysisMode::Plot {
                selections_summary(ui, selection, dataset);
                ui.separator();
            }

            match &state.outcome {
                None => {}
                Some(Err(e)) => {
                    ui.label(RichText::new(format!("Error: {e}")).color(Color32::RED));
                }
                Some(Ok(None)) => {
                    ui.heading("Linear Regression Analysis");
                    ui.label("Select at least one independent variable to fit a model.");
                }
                Some(Ok(Some(ComputationResult::Stats(table)))) => {
                    ui.heading("Basic Statistics");
                    report::stats_table(ui, table);
                }
                Some(Ok(Some(ComputationResult::Figure(figure)))) => {
                    ui.heading(&figure.title);
                    plot::figure_plot(ui, "chart", figure, dataset);
                }
                Some(Ok(Some(ComputationResult::Regression(r)))) => {
                    ui.heading("Linear Regression Analysis");
                    report::regression_report(ui, r);
                    if let Some(figure) = &r.fitted_line {
                        ui.add_space(8.0);
                        plot::figure_plot(ui, "fitted_line", figure, dataset);
                    }
                }
            }
        });
}

fn selections_summary(ui: &mut Ui, selection: &Selection, dataset: &Dataset) {
    let first = dataset
        .first_column()
        .map(|c| c.name.as_str())
        .unwrap_or_default();
    ui.strong("Your Selections");
    ui.label(format!("Analysis Type: {}", selection.mode));
    ui.label(format!("X-axis: {}", selection.x_column.as_deref().unwrap_or(first)));
    if selection.chart_kind.uses_y() {
        ui.label(format!("Y-axis: {}", selection.y_column.as_deref().unwrap_or(first)));
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(ds), Some(name)) = (&state.dataset, &state.file_name) {
            ui.label(format!("{name}: {} rows × {} columns", ds.len(), ds.width()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Upload your CSV file")
        .add_filter("CSV", &["csv", "txt"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}

mod analysis;
mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use app::StatExplorerApp;
use config::AppConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = AppConfig::from_env();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([600.0, 400.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Stat Explorer – Statistical Analysis",
        options,
        Box::new(|_cc| Ok(Box::new(StatExplorerApp::new(config)))),
    )
}

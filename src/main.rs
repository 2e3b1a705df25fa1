mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use std::path::PathBuf;

use app::DtiViewerApp;
use config::ColumnConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = ColumnConfig::from_env();
    let initial_file = std::env::args_os().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "数字化转型指数趋势分析",
        options,
        Box::new(move |cc| {
            ui::install_fonts(&cc.egui_ctx);
            let mut app = DtiViewerApp::new(config);
            if let Some(path) = &initial_file {
                app.state.open(path);
            }
            Ok(Box::new(app))
        }),
    )
}

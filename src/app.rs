use eframe::egui;

use crate::config::ColumnConfig;
use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DtiViewerApp {
    pub state: AppState,
}

impl DtiViewerApp {
    pub fn new(config: ColumnConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl eframe::App for DtiViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: query settings ----
        egui::SidePanel::left("query_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: result or overview ----
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| match &self.state.analysis {
                    Some(analysis) => {
                        plot::analysis_chart(ui, analysis);
                        ui.separator();
                        table::summary(ui, analysis);
                        ui.separator();
                        table::records(ui, "result_table", &analysis.record_refs());
                    }
                    None => overview(ui, &self.state),
                });
        });
    }
}

fn overview(ui: &mut egui::Ui, state: &AppState) {
    let Some(dataset) = &state.dataset else {
        ui.centered_and_justified(|ui| {
            ui.heading("打开数据文件以开始查询  (文件 → 打开…)");
        });
        return;
    };
    ui.heading("数据样例");
    let sample: Vec<_> = dataset.records.iter().take(5).collect();
    table::records(ui, "sample_table", &sample);
    ui.separator();
    plot::index_histogram(ui, &state.index_histogram);
}

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::config::MAX_COMPARISONS;
use crate::data::export::export_file_name;
use crate::data::query::option_label;
use crate::state::{AppState, ChartKind};

/// Directory entries listed in the company picker at once.
const PICKER_LIMIT: usize = 200;

// ---------------------------------------------------------------------------
// Left side panel – query widgets
// ---------------------------------------------------------------------------

/// Render the left query panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("查询设置");
    ui.separator();

    let Some(bounds) = state.dataset.as_ref().and_then(|ds| ds.year_bounds) else {
        ui.label("未加载数据。");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Main code ----
            ui.strong("股票代码");
            ui.add(egui::TextEdit::singleline(&mut state.code_input).hint_text("例如: 000001"));
            if let Some(name) = state.directory.name(&state.code_input) {
                ui.small(name);
            }

            ui.add(egui::TextEdit::singleline(&mut state.search).hint_text("搜索代码片段"));
            let mut picked: Option<String> = None;
            egui::ComboBox::from_id_salt("company_picker")
                .selected_text("或者从列表中选择")
                .width(ui.available_width())
                .show_ui(ui, |ui: &mut Ui| {
                    for (code, name) in state.directory.search(&state.search).take(PICKER_LIMIT) {
                        if ui.selectable_label(false, option_label(code, name)).clicked() {
                            picked = Some(code.to_string());
                        }
                    }
                });
            if let Some(code) = picked {
                state.select_code(&code);
            }
            ui.separator();

            // ---- Year range ----
            ui.strong("年份范围");
            let (from, to) = &mut state.year_range;
            ui.add(egui::Slider::new(from, bounds.min..=bounds.max).text("起"));
            ui.add(egui::Slider::new(to, bounds.min..=bounds.max).text("止"));
            ui.separator();

            // ---- Chart type ----
            ui.strong("趋势图类型");
            egui::ComboBox::from_id_salt("chart_kind")
                .selected_text(state.chart.label())
                .width(ui.available_width())
                .show_ui(ui, |ui: &mut Ui| {
                    for kind in ChartKind::ALL {
                        ui.selectable_value(&mut state.chart, kind, kind.label());
                    }
                });

            ui.checkbox(&mut state.compare, "启用企业对比分析");
            if state.compare {
                for (i, pick) in state.comparison_picks.iter_mut().enumerate() {
                    ui.add(
                        egui::TextEdit::singleline(pick)
                            .hint_text(format!("对比企业 {}", i + 1)),
                    );
                }
                if !state.chart.supports_comparison() {
                    ui.small("对比仅在指数趋势图和雷达图中显示");
                }
                ui.small(format!("最多 {MAX_COMPARISONS} 家"));
            }
            ui.separator();

            if ui.button(RichText::new("生成趋势图").strong()).clicked() {
                state.run_query();
            }
            ui.separator();

            // ---- Dataset statistics ----
            ui.heading("数据统计");
            ui.label(format!("数据覆盖年份: {} - {}", bounds.min, bounds.max));
            ui.label(format!("企业总数: {}", state.overview.companies));
            ui.label(format!("股票代码数: {}", state.overview.codes));
            ui.label(format!("年份数: {}", state.overview.years));
            ui.label(format!("总数据条数: {}", state.overview.records));

            ui.strong("热门查询");
            let mut quick: Option<String> = None;
            for entry in &state.top {
                let label = format!("{} ({})", option_label(&entry.code, &entry.company), entry.records);
                if ui.small_button(label).clicked() {
                    quick = Some(entry.code.clone());
                }
            }
            if let Some(code) = quick {
                state.select_code(&code);
                state.run_query();
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("文件", |ui: &mut Ui| {
            if ui.button("打开…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_export = state.analysis.is_some();
            if ui.add_enabled(can_export, egui::Button::new("导出 CSV…")).clicked() {
                save_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(ds), Some(src)) = (&state.dataset, &state.source) {
            let file = src
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            ui.label(format!(
                "{file}: {} 条记录，{} 条无效已剔除",
                ds.len(),
                ds.dropped_rows
            ));
        }

        if let Some(analysis) = &state.analysis {
            ui.separator();
            ui.label(format!("当前结果: {} 条", analysis.records.len()));
        }

        if let Some(status) = &state.status {
            ui.separator();
            let mut text = RichText::new(&status.message);
            if status.error {
                text = text.color(Color32::RED);
            }
            ui.label(text);
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("打开数字化转型指数数据")
        .add_filter("Supported files", &["xlsx", "xls", "csv", "json", "parquet", "pq"])
        .add_filter("Excel", &["xlsx", "xls"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let Some(analysis) = &state.analysis else {
        return;
    };
    let name = export_file_name(
        &analysis.query.code,
        &analysis.company,
        analysis.query.min_year,
        analysis.query.max_year,
    );
    let file = rfd::FileDialog::new()
        .set_title("导出趋势数据")
        .set_file_name(name)
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        state.export(&path);
    }
}

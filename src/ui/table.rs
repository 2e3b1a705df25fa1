use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::{Indicator, Record};
use crate::data::stats::{
    aggregate, growth_rate, keyword_summary, radar_profile, DimensionBalance, Summary,
};
use crate::state::{Analysis, ChartKind};

// ---------------------------------------------------------------------------
// Metrics under the chart
// ---------------------------------------------------------------------------

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.vertical(|ui| {
        ui.small(label);
        ui.label(RichText::new(value).heading());
    });
}

fn summary_row(ui: &mut Ui, name: &str, s: Summary) {
    metric(ui, &format!("平均{name}"), format!("{:.2}", s.mean));
    metric(ui, &format!("最高{name}"), format!("{:.2}", s.max));
    metric(ui, &format!("最低{name}"), format!("{:.2}", s.min));
}

/// Summary statistics matching the chart of `analysis`.
pub fn summary(ui: &mut Ui, analysis: &Analysis) {
    let records = analysis.record_refs();
    match analysis.chart {
        ChartKind::IndexTrend => {
            ui.strong("趋势分析统计");
            let Ok(s) = aggregate(&records, Indicator::Index) else {
                ui.label("数据集不包含数字化转型指数列");
                return;
            };
            let growth = growth_rate(&records, Indicator::Index).unwrap_or(0.0);
            ui.horizontal(|ui| {
                summary_row(ui, "指数", s);
                metric(ui, "增长率", format!("{growth:.2}%"));
            });
        }
        ChartKind::Dimensions => {
            ui.strong("维度平衡分析");
            let (Ok(tech), Ok(app)) = (
                aggregate(&records, Indicator::TechDimension),
                aggregate(&records, Indicator::AppDimension),
            ) else {
                ui.label("数据集不包含完整的维度信息");
                return;
            };
            ui.horizontal(|ui| {
                metric(ui, "平均技术维度", format!("{:.2}", tech.mean));
                metric(ui, "平均应用维度", format!("{:.2}", app.mean));
            });
            let balance = DimensionBalance::assess(tech.mean, app.mean);
            ui.label(format!("该企业{}", balance.describe()));
        }
        ChartKind::KeywordTrend | ChartKind::KeywordCounts => {
            ui.strong("技术关键词分析");
            let mut keywords = Indicator::KEYWORDS.to_vec();
            if analysis.chart == ChartKind::KeywordCounts {
                keywords.push(Indicator::DigitalTechUsage);
            }
            let rows = keyword_summary(&records, &keywords);
            if rows.is_empty() {
                ui.label("数据集中未找到技术关键词列");
                return;
            }
            egui::Grid::new("keyword_summary").striped(true).show(ui, |ui| {
                for title in ["关键词", "总频次", "最高频次", "最新频次", "增长率"] {
                    ui.strong(title);
                }
                ui.end_row();
                for row in rows {
                    ui.label(row.indicator.label());
                    ui.label(format!("{}", row.total));
                    ui.label(format!("{}", row.max));
                    ui.label(format!("{}", row.latest));
                    ui.label(format!("{:.2}%", row.growth));
                    ui.end_row();
                }
            });
        }
        ChartKind::Radar => {
            ui.strong("多维指标分析");
            if let Some(profile) = radar_profile(&records, analysis.has_index) {
                ui.horizontal(|ui| {
                    for (label, value) in &profile.axes {
                        metric(ui, label, format!("{value:.2}"));
                    }
                });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Record table
// ---------------------------------------------------------------------------

/// Tabulate `records`, with a column for every indicator any of them carries.
pub fn records(ui: &mut Ui, id: &str, records: &[&Record]) {
    let indicators: Vec<Indicator> = Indicator::ALL
        .iter()
        .copied()
        .filter(|&i| records.iter().any(|r| r.value(i).is_some()))
        .collect();

    ui.push_id(id, |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .column(Column::auto().at_least(70.0))
            .column(Column::auto().at_least(100.0))
            .column(Column::auto().at_least(50.0))
            .columns(Column::auto().at_least(80.0), indicators.len())
            .header(22.0, |mut header| {
                let titles = ["股票代码", "企业名称", "年份"]
                    .into_iter()
                    .chain(indicators.iter().map(|i| i.label()));
                for title in titles {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for r in records {
                    body.row(20.0, |mut row| {
                        row.col(|ui| {
                            ui.label(r.code.as_str());
                        });
                        row.col(|ui| {
                            ui.label(r.company.as_str());
                        });
                        row.col(|ui| {
                            ui.label(r.year.to_string());
                        });
                        for &i in &indicators {
                            row.col(|ui| {
                                ui.label(r.value(i).map(|v| format!("{v:.4}")).unwrap_or_default());
                            });
                        }
                    });
                }
            });
    });
}

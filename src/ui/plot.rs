use std::f64::consts::{FRAC_PI_2, TAU};

use eframe::egui::{Color32, Stroke, Ui};
use egui_plot::{
    Bar, BarChart, Legend, Line, LineStyle, Plot, PlotPoint, PlotPoints, PlotUi, Points, Polygon,
    Text,
};

use crate::color::{comparison_colors, indicator_color, PRIMARY};
use crate::data::model::{Indicator, Record};
use crate::data::stats::{
    comparison_profile, index_max, radar_profile, year_series, HistogramBin, RadarProfile,
};
use crate::state::{Analysis, ChartKind};

const CHART_HEIGHT: f32 = 380.0;

// ---------------------------------------------------------------------------
// Query result charts (central panel)
// ---------------------------------------------------------------------------

/// Render the chart selected for `analysis`.
pub fn analysis_chart(ui: &mut Ui, analysis: &Analysis) {
    let q = &analysis.query;
    ui.heading(format!(
        "{} ({})  {}  {}-{}",
        analysis.company,
        q.code,
        analysis.chart.label(),
        q.min_year,
        q.max_year
    ));

    let records = analysis.record_refs();
    match analysis.chart {
        ChartKind::IndexTrend => index_trend(ui, analysis, &records),
        ChartKind::Dimensions => indicator_lines(
            ui,
            "dimensions",
            "指数值",
            &records,
            &[Indicator::TechDimension, Indicator::AppDimension],
        ),
        ChartKind::KeywordTrend => {
            indicator_lines(ui, "keywords", "词频数量", &records, &Indicator::KEYWORDS)
        }
        ChartKind::KeywordCounts => keyword_bars(ui, &records),
        ChartKind::Radar => radar(ui, analysis, &records),
    }
}

/// A plot with years on the x axis.
fn year_plot(ui: &mut Ui, id: &str, y_label: &str, build: impl FnOnce(&mut PlotUi)) {
    Plot::new(id)
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label("年份")
        .y_axis_label(y_label)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true)
        .show(ui, build);
}

fn to_points(points: &[(i32, f64)]) -> PlotPoints<'static> {
    points.iter().map(|&(y, v)| [y as f64, v]).collect()
}

/// Line plus markers for one `(year, value)` series.
fn series(
    plot_ui: &mut PlotUi,
    name: &str,
    points: &[(i32, f64)],
    color: Color32,
    style: LineStyle,
) {
    plot_ui.line(Line::new(to_points(points)).name(name).color(color).width(2.5).style(style));
    plot_ui.points(Points::new(to_points(points)).name(name).color(color).radius(4.0));
}

fn index_trend(ui: &mut Ui, analysis: &Analysis, records: &[&Record]) {
    let colors = comparison_colors(analysis.comparisons.len());
    year_plot(ui, "index_trend", Indicator::Index.label(), |plot_ui| {
        series(
            plot_ui,
            &analysis.company,
            &year_series(records, Indicator::Index),
            PRIMARY,
            LineStyle::Solid,
        );
        for (cmp, &color) in analysis.comparisons.iter().zip(&colors) {
            let refs: Vec<&Record> = cmp.records.iter().collect();
            series(
                plot_ui,
                &format!("{} ({})", cmp.company, cmp.code),
                &year_series(&refs, Indicator::Index),
                color,
                LineStyle::dashed_loose(),
            );
        }
    });
}

fn indicator_lines(
    ui: &mut Ui,
    id: &str,
    y_label: &str,
    records: &[&Record],
    indicators: &[Indicator],
) {
    year_plot(ui, id, y_label, |plot_ui| {
        for &ind in indicators {
            let points = year_series(records, ind);
            if !points.is_empty() {
                series(plot_ui, ind.label(), &points, indicator_color(ind), LineStyle::Solid);
            }
        }
    });
}

/// Grouped bars: one group per year, one bar per keyword.
fn keyword_bars(ui: &mut Ui, records: &[&Record]) {
    let mut indicators = Indicator::KEYWORDS.to_vec();
    indicators.push(Indicator::DigitalTechUsage);
    let width = 0.8 / indicators.len() as f64;

    year_plot(ui, "keyword_bars", "词频数", |plot_ui| {
        for (slot, &ind) in indicators.iter().enumerate() {
            let offset = (slot as f64 - (indicators.len() as f64 - 1.0) / 2.0) * width;
            let bars: Vec<Bar> = year_series(records, ind)
                .into_iter()
                .map(|(year, v)| Bar::new(year as f64 + offset, v).width(width))
                .collect();
            if !bars.is_empty() {
                plot_ui.bar_chart(BarChart::new(bars).name(ind.label()).color(indicator_color(ind)));
            }
        }
    });
}

fn radar(ui: &mut Ui, analysis: &Analysis, records: &[&Record]) {
    let Some(main) = radar_profile(records, analysis.has_index) else {
        ui.label("数据集不包含生成雷达图所需的完整指标");
        return;
    };
    let index_max = index_max(records);
    let others: Vec<RadarProfile> = analysis
        .comparisons
        .iter()
        .filter_map(|cmp| {
            let rec = cmp.records.iter().find(|r| r.year == main.year)?;
            comparison_profile(rec, &main, index_max)
        })
        .collect();
    let colors = comparison_colors(others.len());

    ui.label(format!("分析年份: {}", main.year));
    Plot::new("radar")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .data_aspect(1.0)
        .show_axes([false, false])
        .show_grid(false)
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            let reach = std::iter::once(&main)
                .chain(&others)
                .flat_map(|p| p.axes.iter().map(|a| a.1))
                .fold(1.0_f64, f64::max);
            let n = main.axes.len();
            for (i, (label, _)) in main.axes.iter().enumerate() {
                let tip = polar(reach * 1.1, i, n);
                plot_ui.line(
                    Line::new(PlotPoints::from(vec![[0.0, 0.0], tip]))
                        .color(Color32::GRAY)
                        .width(0.5),
                );
                let at = polar(reach * 1.25, i, n);
                plot_ui.text(Text::new(PlotPoint::new(at[0], at[1]), *label));
            }

            radar_polygon(plot_ui, &main, PRIMARY);
            for (profile, &color) in others.iter().zip(&colors) {
                radar_polygon(plot_ui, profile, color);
            }
        });
}

fn polar(r: f64, i: usize, n: usize) -> [f64; 2] {
    let theta = FRAC_PI_2 - TAU * i as f64 / n as f64;
    [r * theta.cos(), r * theta.sin()]
}

fn radar_polygon(plot_ui: &mut PlotUi, profile: &RadarProfile, color: Color32) {
    let n = profile.axes.len();
    let points: PlotPoints = profile
        .axes
        .iter()
        .enumerate()
        .map(|(i, &(_, v))| polar(v, i, n))
        .collect();
    plot_ui.polygon(
        Polygon::new(points)
            .name(&profile.company)
            .stroke(Stroke::new(2.0, color))
            .fill_color(color.gamma_multiply(0.2)),
    );
}

// ---------------------------------------------------------------------------
// Dataset overview
// ---------------------------------------------------------------------------

/// Distribution of the transformation index over the whole dataset.
pub fn index_histogram(ui: &mut Ui, bins: &[HistogramBin]) {
    ui.heading("数字化转型指数分布");
    if bins.is_empty() {
        ui.label("没有可用的指数数据");
        return;
    }
    let bars: Vec<Bar> = bins
        .iter()
        .map(|b| {
            Bar::new((b.start + b.end) / 2.0, b.count as f64)
                .width(b.end - b.start)
                .name(format!("{:.2} – {:.2}", b.start, b.end))
        })
        .collect();
    Plot::new("index_histogram")
        .height(CHART_HEIGHT * 0.75)
        .x_axis_label(Indicator::Index.label())
        .y_axis_label("企业数量")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(PRIMARY));
        });
}

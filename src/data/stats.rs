use thiserror::Error;

use super::model::{Indicator, Record};
use super::query::sort_by_year;

/// Caller contract violations of the aggregation functions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("cannot aggregate an empty record selection")]
    EmptyRecords,
    #[error("no record in the selection has a value for {}", .0.label())]
    MissingValues(Indicator),
}

/// Mean, maximum and minimum of one indicator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub max: f64,
    pub min: f64,
}

/// Summarize `indicator` over the records that carry a value for it.
pub fn aggregate(records: &[&Record], indicator: Indicator) -> Result<Summary, StatsError> {
    if records.is_empty() {
        return Err(StatsError::EmptyRecords);
    }
    let values: Vec<f64> = records.iter().filter_map(|r| r.value(indicator)).collect();
    if values.is_empty() {
        return Err(StatsError::MissingValues(indicator));
    }
    let sum: f64 = values.iter().sum();
    Ok(Summary {
        mean: sum / values.len() as f64,
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
    })
}

/// Percentage change from the earliest to the latest value by year.
///
/// The denominator is `max(first, 1)`, so the figure is not a true relative
/// change when the first value is below one. Fewer than two values give 0.
pub fn growth_rate(records: &[&Record], indicator: Indicator) -> Result<f64, StatsError> {
    if records.is_empty() {
        return Err(StatsError::EmptyRecords);
    }
    let series = year_series(records, indicator);
    Ok(match (series.first(), series.last()) {
        (Some(&(_, first)), Some(&(_, last))) if series.len() >= 2 => {
            (last - first) / first.max(1.0) * 100.0
        }
        _ => 0.0,
    })
}

/// `(year, value)` points for `indicator`, ascending by year, absent values skipped.
pub fn year_series(records: &[&Record], indicator: Indicator) -> Vec<(i32, f64)> {
    sort_by_year(records.to_vec())
        .into_iter()
        .filter_map(|r| Some((r.year, r.value(indicator)?)))
        .collect()
}

// ---------------------------------------------------------------------------
// Keyword summary
// ---------------------------------------------------------------------------

/// Usage figures of one technology keyword over a selection.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordSummary {
    pub indicator: Indicator,
    pub total: f64,
    pub max: f64,
    /// Value in the latest year that has one.
    pub latest: f64,
    pub growth: f64,
}

/// One summary row per keyword in `keywords` that has at least one value.
pub fn keyword_summary(records: &[&Record], keywords: &[Indicator]) -> Vec<KeywordSummary> {
    keywords
        .iter()
        .filter_map(|&indicator| {
            let series = year_series(records, indicator);
            let &(_, latest) = series.last()?;
            Some(KeywordSummary {
                indicator,
                total: series.iter().map(|(_, v)| v).sum(),
                max: series.iter().map(|&(_, v)| v).fold(f64::NEG_INFINITY, f64::max),
                latest,
                growth: growth_rate(records, indicator).unwrap_or(0.0),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Dimension balance
// ---------------------------------------------------------------------------

/// Ratio by which one dimension must exceed the other to "lead".
pub const BALANCE_RATIO: f64 = 1.5;

/// How technology investment compares with its application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionBalance {
    TechLed,
    AppLed,
    Balanced,
}

impl DimensionBalance {
    pub fn assess(tech_mean: f64, app_mean: f64) -> Self {
        if tech_mean > app_mean * BALANCE_RATIO {
            DimensionBalance::TechLed
        } else if app_mean > tech_mean * BALANCE_RATIO {
            DimensionBalance::AppLed
        } else {
            DimensionBalance::Balanced
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            DimensionBalance::TechLed => {
                "技术投入较高，但应用转化相对不足，建议加强技术成果转化"
            }
            DimensionBalance::AppLed => {
                "应用需求旺盛，但技术支撑相对薄弱，建议加强技术研发投入"
            }
            DimensionBalance::Balanced => "技术与应用维度较为平衡，数字化发展较为协调",
        }
    }
}

// ---------------------------------------------------------------------------
// Radar profile
// ---------------------------------------------------------------------------

/// Label of the normalised index axis.
pub const NORMALIZED_INDEX_LABEL: &str = "数字化转型指数(归一化)";

/// Indicator values of one company in one year, ready for a radar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarProfile {
    pub company: String,
    pub year: i32,
    pub axes: Vec<(&'static str, f64)>,
}

/// Profile of the latest year in `records`.
///
/// Technology and application dimensions are taken as-is. With `index_axis`
/// set (the dataset has an index column) the index is scaled to
/// `min(100, value / max * 100)` with `max` taken over the whole selection;
/// a record without an index value scores 0 on that axis. `None` when either
/// dimension is missing.
pub fn radar_profile(records: &[&Record], index_axis: bool) -> Option<RadarProfile> {
    let latest = records.iter().copied().max_by_key(|r| r.year)?;
    let scale = index_axis.then(|| index_max(records).unwrap_or(0.0));
    radar_axes(latest, scale).map(|axes| RadarProfile {
        company: latest.company.clone(),
        year: latest.year,
        axes,
    })
}

/// Largest transformation index in the selection.
pub fn index_max(records: &[&Record]) -> Option<f64> {
    records
        .iter()
        .filter_map(|r| r.value(Indicator::Index))
        .reduce(f64::max)
}

/// Profile of a comparison record on the axes of `main`, with the index
/// scaled against `index_max` of the main selection. `None` when a dimension
/// is missing.
pub fn comparison_profile(
    record: &Record,
    main: &RadarProfile,
    index_max: Option<f64>,
) -> Option<RadarProfile> {
    let index_axis = main.axes.iter().any(|(label, _)| *label == NORMALIZED_INDEX_LABEL);
    let axes = radar_axes(record, index_axis.then(|| index_max.unwrap_or(0.0)))?;
    let same_shape = axes.len() == main.axes.len()
        && axes.iter().zip(&main.axes).all(|(a, b)| a.0 == b.0);
    same_shape.then(|| RadarProfile {
        company: record.company.clone(),
        year: record.year,
        axes,
    })
}

/// `index_max` is `Some` when the index axis is drawn.
fn radar_axes(record: &Record, index_max: Option<f64>) -> Option<Vec<(&'static str, f64)>> {
    let mut axes = vec![
        (Indicator::TechDimension.label(), record.value(Indicator::TechDimension)?),
        (Indicator::AppDimension.label(), record.value(Indicator::AppDimension)?),
    ];
    if let Some(max) = index_max {
        let scaled = match record.value(Indicator::Index) {
            Some(value) if max > 0.0 => (value / max * 100.0).min(100.0),
            _ => 0.0,
        };
        axes.push((NORMALIZED_INDEX_LABEL, scaled));
    }
    Some(axes)
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// One equal-width histogram bin; `end` is exclusive except for the last bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Distribution of the finite values in `values` over `bins` equal-width bins.
pub fn histogram(values: impl IntoIterator<Item = f64>, bins: usize) -> Vec<HistogramBin> {
    let values: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == min {
        return vec![HistogramBin {
            start: min - 0.5,
            end: max + 0.5,
            count: values.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: min + width * i as f64,
            end: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for v in values {
        let slot = (((v - min) / width) as usize).min(bins - 1);
        out[slot].count += 1;
    }
    out
}

use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single raw cell as read from the source file
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring what spreadsheet readers hand back.
/// Stock codes in particular arrive as any of these variants.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Whether the cell carries no usable value (null or NaN).
    pub fn is_null(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Interpret the cell as a finite number. Numeric text is accepted.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            CellValue::Float(v) => *v,
            CellValue::Integer(i) => *i as f64,
            CellValue::String(s) => s.trim().parse::<f64>().ok()?,
            CellValue::Bool(_) | CellValue::Null => return None,
        };
        v.is_finite().then_some(v)
    }

    /// Interpret the cell as a whole number; fractional values are rejected.
    pub fn as_year(&self) -> Option<i32> {
        match self {
            CellValue::Integer(i) => i32::try_from(*i).ok(),
            CellValue::String(s) => {
                let s = s.trim();
                match s.parse::<i64>() {
                    Ok(i) => i32::try_from(i).ok(),
                    Err(_) => CellValue::Float(s.parse().ok()?).as_year(),
                }
            }
            CellValue::Float(v) => {
                if v.is_finite() && v.fract() == 0.0 && v.abs() <= i32::MAX as f64 {
                    Some(*v as i32)
                } else {
                    None
                }
            }
            CellValue::Bool(_) | CellValue::Null => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Indicator – the numeric columns of a record
// ---------------------------------------------------------------------------

/// Numeric indicator fields of a company-year observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Indicator {
    /// Composite digital transformation index.
    Index,
    TechDimension,
    AppDimension,
    ArtificialIntelligence,
    BigData,
    CloudComputing,
    Blockchain,
    DigitalTechUsage,
}

impl Indicator {
    pub const COUNT: usize = 8;

    pub const ALL: [Indicator; Self::COUNT] = [
        Indicator::Index,
        Indicator::TechDimension,
        Indicator::AppDimension,
        Indicator::ArtificialIntelligence,
        Indicator::BigData,
        Indicator::CloudComputing,
        Indicator::Blockchain,
        Indicator::DigitalTechUsage,
    ];

    /// Per-technology keyword counts tracked individually in trend charts.
    pub const KEYWORDS: [Indicator; 4] = [
        Indicator::ArtificialIntelligence,
        Indicator::BigData,
        Indicator::CloudComputing,
        Indicator::Blockchain,
    ];

    /// Short display label.
    pub fn label(self) -> &'static str {
        match self {
            Indicator::Index => "数字化转型指数",
            Indicator::TechDimension => "技术维度",
            Indicator::AppDimension => "应用维度",
            Indicator::ArtificialIntelligence => "人工智能",
            Indicator::BigData => "大数据",
            Indicator::CloudComputing => "云计算",
            Indicator::Blockchain => "区块链",
            Indicator::DigitalTechUsage => "数字技术运用",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// Record – one cleaned company-year row
// ---------------------------------------------------------------------------

/// A single company-year observation after cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Canonical stock code (digits only, at least six characters).
    pub code: String,
    pub company: String,
    pub year: i32,
    values: [Option<f64>; Indicator::COUNT],
}

impl Record {
    pub fn new(code: impl Into<String>, company: impl Into<String>, year: i32) -> Self {
        Self {
            code: code.into(),
            company: company.into(),
            year,
            values: [None; Indicator::COUNT],
        }
    }

    /// Builder-style setter used by the cleaner and by tests.
    pub fn with(mut self, indicator: Indicator, value: f64) -> Self {
        self.set(indicator, Some(value));
        self
    }

    pub fn set(&mut self, indicator: Indicator, value: Option<f64>) {
        self.values[indicator.slot()] = value;
    }

    pub fn value(&self, indicator: Indicator) -> Option<f64> {
        self.values[indicator.slot()]
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete cleaned collection
// ---------------------------------------------------------------------------

/// Inclusive range of years observed in a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearBounds {
    pub min: i32,
    pub max: i32,
}

/// The cleaned, read-only dataset every query runs against.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Records in source order.
    pub records: Vec<Record>,
    /// Observed year range; `None` when no record survived cleaning.
    pub year_bounds: Option<YearBounds>,
    /// Rows excluded during cleaning.
    pub dropped_rows: usize,
    /// Indicators whose column exists in the source.
    pub indicators: BTreeSet<Indicator>,
}

impl Dataset {
    /// Build a dataset from already-clean records, computing year bounds.
    pub fn from_records(
        records: Vec<Record>,
        indicators: BTreeSet<Indicator>,
        dropped_rows: usize,
    ) -> Self {
        let year_bounds = records.iter().fold(None, |acc: Option<YearBounds>, r| {
            Some(match acc {
                Some(b) => YearBounds {
                    min: b.min.min(r.year),
                    max: b.max.max(r.year),
                },
                None => YearBounds {
                    min: r.year,
                    max: r.year,
                },
            })
        });
        Dataset {
            records,
            year_bounds,
            dropped_rows,
            indicators,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the source carried a column for `indicator`.
    pub fn has(&self, indicator: Indicator) -> bool {
        self.indicators.contains(&indicator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_parsing_accepts_whole_numbers_only() {
        assert_eq!(CellValue::Integer(2020).as_year(), Some(2020));
        assert_eq!(CellValue::Float(2021.0).as_year(), Some(2021));
        assert_eq!(CellValue::String(" 2019 ".into()).as_year(), Some(2019));
        assert_eq!(CellValue::String("2018.0".into()).as_year(), Some(2018));
        assert_eq!(CellValue::Float(2020.5).as_year(), None);
        assert_eq!(CellValue::String("n/a".into()).as_year(), None);
        assert_eq!(CellValue::Float(f64::NAN).as_year(), None);
        assert_eq!(CellValue::Null.as_year(), None);
    }

    #[test]
    fn numeric_cells_reject_non_finite() {
        assert_eq!(CellValue::String("1.5".into()).as_f64(), Some(1.5));
        assert_eq!(CellValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(CellValue::Float(f64::INFINITY).as_f64(), None);
        assert_eq!(CellValue::Bool(true).as_f64(), None);
        assert!(CellValue::Float(f64::NAN).is_null());
    }

    #[test]
    fn bounds_follow_records() {
        let ds = Dataset::from_records(
            vec![
                Record::new("000001", "A", 2015),
                Record::new("000001", "A", 2011),
                Record::new("000002", "B", 2020),
            ],
            BTreeSet::new(),
            0,
        );
        assert_eq!(ds.year_bounds, Some(YearBounds { min: 2011, max: 2020 }));
        assert!(Dataset::default().year_bounds.is_none());
    }
}

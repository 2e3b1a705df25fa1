use std::collections::BTreeSet;

use crate::config::ColumnConfig;

use super::loader::RawTable;
use super::model::{CellValue, Dataset, Indicator, Record};
use super::normalize::normalize_code;

// ---------------------------------------------------------------------------
// Schema – column positions resolved once per file
// ---------------------------------------------------------------------------

/// Column positions of the known fields in a raw table.
#[derive(Debug, Clone, Default)]
struct Schema {
    code: Option<usize>,
    company: Option<usize>,
    year: Option<usize>,
    indicators: Vec<(Indicator, usize)>,
}

impl Schema {
    fn resolve(headers: &[String], config: &ColumnConfig) -> Self {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name.trim());
        Schema {
            code: find(&config.code),
            company: find(&config.company),
            year: find(&config.year),
            indicators: Indicator::ALL
                .iter()
                .filter_map(|&ind| find(config.indicator_column(ind)).map(|col| (ind, col)))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

/// Turn a raw table into the immutable [`Dataset`].
///
/// Rows without a usable stock code or a whole-number year are dropped;
/// everything else is kept, with unparseable indicator cells left empty and
/// missing company names replaced by `config.unknown_company`.
pub fn clean(raw: &RawTable, config: &ColumnConfig) -> Dataset {
    let schema = Schema::resolve(&raw.headers, config);
    let indicators: BTreeSet<Indicator> = schema.indicators.iter().map(|(i, _)| *i).collect();

    let (Some(code_col), Some(year_col)) = (schema.code, schema.year) else {
        log::warn!(
            "Source lacks '{}' or '{}' column; all {} rows dropped",
            config.code,
            config.year,
            raw.rows.len()
        );
        return Dataset::from_records(Vec::new(), indicators, raw.rows.len());
    };

    let mut records = Vec::with_capacity(raw.rows.len());
    let mut dropped = 0;

    for row in 0..raw.rows.len() {
        let code = normalize_code(raw.cell(row, code_col));
        if code.is_empty() {
            log::debug!("Row {row}: no stock code in {:?}", raw.cell(row, code_col));
            dropped += 1;
            continue;
        }
        let Some(year) = raw.cell(row, year_col).as_year() else {
            log::debug!("Row {row}: invalid year {:?}", raw.cell(row, year_col));
            dropped += 1;
            continue;
        };
        let company = schema
            .company
            .and_then(|col| company_name(raw.cell(row, col)))
            .unwrap_or_else(|| config.unknown_company.clone());

        let mut record = Record::new(code, company, year);
        for &(ind, col) in &schema.indicators {
            record.set(ind, raw.cell(row, col).as_f64());
        }
        records.push(record);
    }

    Dataset::from_records(records, indicators, dropped)
}

fn company_name(cell: &CellValue) -> Option<String> {
    if cell.is_null() {
        return None;
    }
    let name = cell.to_string();
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::YearBounds;
    use crate::data::normalize::normalize_str;

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    fn table(rows: Vec<Vec<CellValue>>) -> RawTable {
        RawTable {
            headers: vec![
                " 股票代码 ".into(),
                "企业名称".into(),
                "年份".into(),
                "数字化转型指数".into(),
            ],
            rows,
        }
    }

    #[test]
    fn drops_malformed_rows() {
        let raw = table(vec![
            vec![s("600000.0"), s("浦发银行"), CellValue::Integer(2020), CellValue::Float(1.5)],
            vec![CellValue::Null, s("无代码"), CellValue::Integer(2020), CellValue::Null],
            vec![s("abc"), s("坏代码"), CellValue::Integer(2020), CellValue::Null],
            vec![CellValue::Integer(1), s("平安银行"), s("n/a"), CellValue::Null],
            vec![CellValue::Float(2.0), CellValue::Null, CellValue::Float(2019.0), s("x")],
        ]);
        let ds = clean(&raw, &ColumnConfig::default());

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.dropped_rows, 3);
        assert_eq!(ds.records[0].code, "600000");
        assert_eq!(ds.records[0].value(Indicator::Index), Some(1.5));
        assert_eq!(ds.records[1].code, "000002");
        assert_eq!(ds.records[1].company, "未知企业");
        assert_eq!(ds.records[1].value(Indicator::Index), None);
        assert_eq!(ds.year_bounds, Some(YearBounds { min: 2019, max: 2020 }));
    }

    #[test]
    fn records_are_fixed_points_of_normalization() {
        let raw = table(vec![
            vec![s(" 1 "), s("A"), CellValue::Integer(2020), CellValue::Null],
            vec![CellValue::Float(600519.0), s("B"), CellValue::Integer(2020), CellValue::Null],
            vec![s("SZ300750"), s("C"), CellValue::Integer(2020), CellValue::Null],
            vec![s("1234567"), s("D"), CellValue::Integer(2020), CellValue::Null],
        ]);
        let ds = clean(&raw, &ColumnConfig::default());
        assert_eq!(ds.len(), 4);
        for r in &ds.records {
            assert_eq!(normalize_str(&r.code), r.code);
            assert!(r.code.len() >= 6);
            assert!(!r.company.is_empty());
        }
    }

    #[test]
    fn schema_tracks_available_indicators() {
        let ds = clean(&table(Vec::new()), &ColumnConfig::default());
        assert!(ds.has(Indicator::Index));
        assert!(!ds.has(Indicator::TechDimension));
        assert!(ds.is_empty());
        assert!(ds.year_bounds.is_none());
    }

    #[test]
    fn missing_year_column_drops_everything() {
        let raw = RawTable {
            headers: vec!["股票代码".into()],
            rows: vec![vec![s("1")], vec![s("2")]],
        };
        let ds = clean(&raw, &ColumnConfig::default());
        assert!(ds.is_empty());
        assert_eq!(ds.dropped_rows, 2);
    }
}

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::ColumnConfig;

use super::model::{Indicator, Record};

/// UTF-8 byte-order mark so spreadsheet applications detect the encoding.
const BOM: &[u8] = "\u{feff}".as_bytes();

/// Write `records` as CSV using the source column names from `config`.
/// Only indicators listed in `indicators` get a column.
pub fn write_csv<W: Write>(
    mut out: W,
    records: &[&Record],
    indicators: &[Indicator],
    config: &ColumnConfig,
) -> Result<()> {
    out.write_all(BOM).context("writing BOM")?;
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec![config.code.as_str(), config.company.as_str(), config.year.as_str()];
    header.extend(indicators.iter().map(|&i| config.indicator_column(i)));
    writer.write_record(&header).context("writing CSV header")?;

    for r in records {
        let mut row = vec![r.code.clone(), r.company.clone(), r.year.to_string()];
        row.extend(
            indicators
                .iter()
                .map(|&i| r.value(i).map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

/// Write `records` to a CSV file at `path`.
pub fn export_file(
    path: &Path,
    records: &[&Record],
    indicators: &[Indicator],
    config: &ColumnConfig,
) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv(std::io::BufWriter::new(file), records, indicators, config)?;
    log::info!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}

/// Suggested file name for an exported selection.
pub fn export_file_name(code: &str, company: &str, min_year: i32, max_year: i32) -> String {
    let company: String = company
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') { '_' } else { c })
        .collect();
    format!("{code}_{company}_趋势数据_{min_year}-{max_year}.csv")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_with_bom_and_source_headers() {
        let a = Record::new("000001", "平安银行", 2020).with(Indicator::Index, 12.5);
        let b = Record::new("000001", "平安银行", 2021);
        let mut buf = Vec::new();
        write_csv(&mut buf, &[&a, &b], &[Indicator::Index], &ColumnConfig::default()).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let text = text.strip_prefix('\u{feff}').unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "股票代码,企业名称,年份,数字化转型指数");
        assert_eq!(lines[1], "000001,平安银行,2020,12.5");
        assert_eq!(lines[2], "000001,平安银行,2021,");
    }

    #[test]
    fn exported_file_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let a = Record::new("000001", "平安银行", 2020).with(Indicator::Index, 3.0);
        export_file(&path, &[&a], &[Indicator::Index], &ColumnConfig::default()).unwrap();

        let raw = crate::data::loader::load_file(&path).unwrap();
        let ds = crate::data::clean::clean(&raw, &ColumnConfig::default());
        assert_eq!(ds.records, vec![a]);
    }

    #[test]
    fn file_name_is_filesystem_safe() {
        assert_eq!(
            export_file_name("000001", "A/B", 2019, 2023),
            "000001_A_B_趋势数据_2019-2023.csv"
        );
    }
}

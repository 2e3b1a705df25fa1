use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use calamine::{open_workbook_auto, DataType as XlsCell, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

use super::model::CellValue;

// ---------------------------------------------------------------------------
// RawTable – the uncleaned file contents
// ---------------------------------------------------------------------------

/// Header row plus untyped cells, exactly as read from the file.
/// Rows may be shorter than the header; missing cells read as null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    /// Cell at `(row, col)`, or null when the row is short.
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a raw table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xls` – first worksheet, first row is the header
/// * `.csv`           – header row, one record per line
/// * `.json`          – `[{ "股票代码": 1, "年份": 2020, ... }, ...]`
/// * `.parquet`       – flat scalar columns
pub fn load_file(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "xlsx" | "xlsm" | "xls" => load_excel(path),
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Hex SHA-256 of the file contents, used to key the cleaned-dataset cache.
pub fn fingerprint(path: &Path) -> Result<String> {
    let mut file = BufReader::new(File::open(path).context("opening file for fingerprint")?);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).context("reading file for fingerprint")?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect())
}

// ---------------------------------------------------------------------------
// Excel loader
// ---------------------------------------------------------------------------

fn load_excel(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .context("workbook has no sheets")?;
    let range = workbook
        .worksheet_range(&sheet)
        .with_context(|| format!("reading sheet '{sheet}'"))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(RawTable::default());
    };
    let headers: Vec<String> = header_row.iter().map(|c| c.to_string()).collect();
    let rows: Vec<Vec<CellValue>> = rows
        .map(|row| row.iter().map(excel_to_cell).collect())
        .collect();

    Ok(RawTable { headers, rows })
}

fn excel_to_cell(cell: &XlsCell) -> CellValue {
    match cell {
        XlsCell::Int(i) => CellValue::Integer(*i),
        XlsCell::Float(f) => CellValue::Float(*f),
        XlsCell::String(s) if s.trim().is_empty() => CellValue::Null,
        XlsCell::String(s) => CellValue::String(s.clone()),
        XlsCell::Bool(b) => CellValue::Bool(*b),
        XlsCell::Empty | XlsCell::Error(_) => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<RawTable> {
    let file = File::open(path).context("opening CSV")?;
    read_csv(file)
}

fn read_csv<R: Read>(input: R) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(csv_cell).collect());
    }

    Ok(RawTable { headers, rows })
}

/// Missing-value markers pandas recognises by default.
const CSV_NA: [&str; 8] = ["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

/// A CSV field stays text so that names such as `007` survive; numeric
/// columns are parsed when the dataset is cleaned.
fn csv_cell(s: &str) -> CellValue {
    if CSV_NA.contains(&s.trim()) {
        CellValue::Null
    } else {
        CellValue::String(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')`).  The header is
/// the union of keys over all objects.
fn load_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows: Vec<Vec<CellValue>> = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    Ok(RawTable { headers, rows })
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Flat Parquet files as written by `df.to_parquet()` (Pandas) or
/// `df.write_parquet()` (Polars).  Nested columns are rendered as text.
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| arrow_to_cell(col, row))
                    .collect(),
            );
        }
    }

    Ok(RawTable { headers, rows })
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_to_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        other => CellValue::String(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;
    use crate::config::ColumnConfig;
    use crate::data::clean::clean;
    use crate::data::model::Indicator;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn csv_cells_keep_their_text() {
        let file = write_temp(
            ".csv",
            "\u{feff}股票代码,企业名称,年份\n600000.0,浦发银行,2020\n1,,2021\n2,NaN,2022\n",
        );
        let table = load_file(file.path()).unwrap();
        assert_eq!(table.headers, vec!["股票代码", "企业名称", "年份"]);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.cell(0, 0), &CellValue::String("600000.0".into()));
        assert_eq!(table.cell(0, 0).as_f64(), Some(600000.0));
        assert_eq!(table.cell(0, 1), &CellValue::String("浦发银行".into()));
        assert_eq!(table.cell(1, 2).as_year(), Some(2021));
        assert_eq!(table.cell(1, 1), &CellValue::Null);
        assert_eq!(table.cell(2, 1), &CellValue::Null);
        assert_eq!(table.cell(1, 9), &CellValue::Null);
    }

    #[test]
    fn numeric_looking_company_names_survive_cleaning() {
        let file = write_temp(
            ".csv",
            "股票代码,企业名称,年份,数字化转型指数\n1,007,2021,3.50\n2,1.50,2020,\n",
        );
        let table = load_file(file.path()).unwrap();
        let ds = clean(&table, &ColumnConfig::default());
        let names: Vec<&str> = ds.records.iter().map(|r| r.company.as_str()).collect();
        assert_eq!(names, vec!["007", "1.50"]);
        assert_eq!(ds.records[0].code, "000001");
        assert_eq!(ds.records[0].value(Indicator::Index), Some(3.5));
        assert_eq!(ds.records[1].value(Indicator::Index), None);
    }

    #[test]
    fn json_union_of_keys() {
        let file = write_temp(
            ".json",
            r#"[{"股票代码": "000001", "年份": 2020}, {"年份": 2021, "数字化转型指数": 3.5}]"#,
        );
        let table = load_file(file.path()).unwrap();
        assert_eq!(table.headers.len(), 3);
        let col = |name: &str| table.headers.iter().position(|h| h == name).unwrap();
        assert_eq!(table.cell(0, col("股票代码")), &CellValue::String("000001".into()));
        assert_eq!(table.cell(1, col("股票代码")), &CellValue::Null);
        assert_eq!(table.cell(1, col("数字化转型指数")), &CellValue::Float(3.5));
        assert_eq!(table.cell(1, col("年份")), &CellValue::Integer(2021));
    }

    #[test]
    fn parquet_flat_columns() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("股票代码", DataType::Float64, true),
            Field::new("企业名称", DataType::Utf8, true),
            Field::new("年份", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Float64Array::from(vec![Some(600000.0), None])),
                Arc::new(StringArray::from(vec![Some("浦发银行"), None])),
                Arc::new(Int64Array::from(vec![2020, 2021])),
            ],
        )
        .unwrap();
        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let out = File::create(file.path()).unwrap();
        let mut writer = ArrowWriter::try_new(out, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(file.path()).unwrap();
        assert_eq!(table.headers.len(), 3);
        assert_eq!(table.cell(0, 0), &CellValue::Float(600000.0));
        assert_eq!(table.cell(1, 0), &CellValue::Null);
        assert_eq!(table.cell(1, 2), &CellValue::Integer(2021));
    }

    #[test]
    fn unsupported_extension() {
        let file = write_temp(".txt", "hello");
        let err = load_file(file.path()).unwrap_err();
        assert!(err.to_string().contains(".txt"));
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = write_temp(".csv", "a\n1\n");
        let b = write_temp(".csv", "a\n1\n");
        let c = write_temp(".csv", "a\n2\n");
        let fa = fingerprint(a.path()).unwrap();
        assert_eq!(fa.len(), 64);
        assert_eq!(fa, fingerprint(b.path()).unwrap());
        assert_ne!(fa, fingerprint(c.path()).unwrap());
    }
}

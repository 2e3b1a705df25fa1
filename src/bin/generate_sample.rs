use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Deterministic SplitMix64 generator, enough for synthetic data.
struct SplitMix(u64);

impl SplitMix {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn poisson_like(&mut self, mean: f64) -> f64 {
        (mean * (0.5 + self.unit())).round()
    }
}

const COMPANIES: &[(f64, Option<&str>, f64)] = &[
    (1.0, Some("平安银行"), 1.4),
    (2.0, Some("万科A"), 0.6),
    (858.0, Some("五粮液"), 0.5),
    (2415.0, Some("海康威视"), 2.2),
    (300750.0, Some("宁德时代"), 1.6),
    (600000.0, Some("浦发银行"), 1.1),
    (600519.0, Some("贵州茅台"), 0.4),
    (688981.0, None, 1.9),
];

const KEYWORD_COLUMNS: [&str; 4] = ["人工智能词频数", "大数据词频数", "云计算词频数", "区块链词频数"];

fn main() -> Result<()> {
    let mut rng = SplitMix(7);

    let mut codes: Vec<f64> = Vec::new();
    let mut names: Vec<Option<String>> = Vec::new();
    let mut years = Vec::new();
    let mut index = Vec::new();
    let mut tech = Vec::new();
    let mut app = Vec::new();
    let mut keywords: [Vec<f64>; 4] = Default::default();
    let mut usage: Vec<f64> = Vec::new();

    for &(code, name, momentum) in COMPANIES {
        for year in 2010..=2023_i64 {
            let t = (year - 2010) as f64;
            let level = 5.0 + momentum * t * t * 0.4 + rng.unit() * 4.0;
            let kw: Vec<f64> = [0.8, 1.2, 0.9, 0.3]
                .iter()
                .map(|w| rng.poisson_like(level * w))
                .collect();

            codes.push(code);
            names.push(name.map(str::to_string));
            years.push(year);
            index.push(level);
            tech.push(level * (0.4 + 0.2 * rng.unit()));
            app.push(level * (0.3 + 0.3 * rng.unit()));
            for (col, v) in keywords.iter_mut().zip(&kw) {
                col.push(*v);
            }
            usage.push(kw.iter().sum());
        }
    }

    let mut fields = vec![
        Field::new("股票代码", DataType::Float64, false),
        Field::new("企业名称", DataType::Utf8, true),
        Field::new("年份", DataType::Int64, false),
        Field::new("数字化转型指数", DataType::Float64, false),
        Field::new("技术维度", DataType::Float64, false),
        Field::new("应用维度", DataType::Float64, false),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(Float64Array::from(codes)),
        Arc::new(StringArray::from(names)),
        Arc::new(Int64Array::from(years)),
        Arc::new(Float64Array::from(index)),
        Arc::new(Float64Array::from(tech)),
        Arc::new(Float64Array::from(app)),
    ];
    for (name, values) in KEYWORD_COLUMNS.iter().zip(keywords) {
        fields.push(Field::new(*name, DataType::Float64, false));
        columns.push(Arc::new(Float64Array::from(values)));
    }
    fields.push(Field::new("数字技术运用词频数", DataType::Float64, false));
    columns.push(Arc::new(Float64Array::from(usage)));

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let parquet_path = "sample_dti.parquet";
    let file = std::fs::File::create(parquet_path).context("creating parquet output")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;

    let csv_path = "sample_dti.csv";
    let file = std::fs::File::create(csv_path).context("creating CSV output")?;
    arrow::csv::Writer::new(file)
        .write(&batch)
        .context("writing CSV")?;

    println!(
        "Wrote {} records for {} companies to {parquet_path} and {csv_path}",
        batch.num_rows(),
        COMPANIES.len()
    );
    Ok(())
}

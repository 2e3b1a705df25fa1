use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::model::Indicator;

/// Environment variable naming a JSON file with column-name overrides.
pub const COLUMNS_ENV: &str = "DTI_COLUMNS";

/// Number of bins used for the dataset-wide index histogram.
pub const HISTOGRAM_BINS: usize = 30;

/// Maximum number of companies compared against the main selection.
pub const MAX_COMPARISONS: usize = 3;

/// Number of entries in the "top companies" list.
pub const TOP_COMPANIES: usize = 5;

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

/// Maps logical record fields to the column headers of the source file.
///
/// Every field has a default matching the published annual-report workbook,
/// so an override file only needs the columns that differ:
///
/// ```json
/// { "code": "stock_code", "year": "fiscal_year" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub code: String,
    pub company: String,
    pub year: String,
    pub index: String,
    pub tech_dimension: String,
    pub app_dimension: String,
    pub artificial_intelligence: String,
    pub big_data: String,
    pub cloud_computing: String,
    pub blockchain: String,
    pub digital_tech_usage: String,
    /// Company name used when the source cell is empty.
    pub unknown_company: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            code: "股票代码".into(),
            company: "企业名称".into(),
            year: "年份".into(),
            index: "数字化转型指数".into(),
            tech_dimension: "技术维度".into(),
            app_dimension: "应用维度".into(),
            artificial_intelligence: "人工智能词频数".into(),
            big_data: "大数据词频数".into(),
            cloud_computing: "云计算词频数".into(),
            blockchain: "区块链词频数".into(),
            digital_tech_usage: "数字技术运用词频数".into(),
            unknown_company: "未知企业".into(),
        }
    }
}

impl ColumnConfig {
    /// Source column holding the given indicator.
    pub fn indicator_column(&self, indicator: Indicator) -> &str {
        match indicator {
            Indicator::Index => &self.index,
            Indicator::TechDimension => &self.tech_dimension,
            Indicator::AppDimension => &self.app_dimension,
            Indicator::ArtificialIntelligence => &self.artificial_intelligence,
            Indicator::BigData => &self.big_data,
            Indicator::CloudComputing => &self.cloud_computing,
            Indicator::Blockchain => &self.blockchain,
            Indicator::DigitalTechUsage => &self.digital_tech_usage,
        }
    }

    /// Read a (possibly partial) column mapping from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading column config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing column config {}", path.display()))
    }

    /// Mapping named by [`COLUMNS_ENV`], or the defaults when unset or unreadable.
    pub fn from_env() -> Self {
        match std::env::var_os(COLUMNS_ENV) {
            Some(path) => match Self::from_json_file(Path::new(&path)) {
                Ok(cfg) => {
                    log::info!("Using column mapping from {}", Path::new(&path).display());
                    cfg
                }
                Err(e) => {
                    log::warn!("Ignoring {COLUMNS_ENV}: {e:#}");
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn partial_override_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "code": "stock", "unknown_company": "n/a" }}"#).unwrap();

        let cfg = ColumnConfig::from_json_file(file.path()).unwrap();
        assert_eq!(cfg.code, "stock");
        assert_eq!(cfg.unknown_company, "n/a");
        assert_eq!(cfg.year, "年份");
        assert_eq!(cfg.indicator_column(Indicator::Index), "数字化转型指数");
    }

    #[test]
    fn malformed_config_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2").unwrap();
        assert!(ColumnConfig::from_json_file(file.path()).is_err());
    }
}

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::{ColumnConfig, HISTOGRAM_BINS, MAX_COMPARISONS, TOP_COMPANIES};
use crate::data::model::{Dataset, Indicator, Record};
use crate::data::query::{
    comparison_codes, parse_code_input, top_companies, CompanyCount, CompanyDirectory,
    DatasetOverview, Query, QueryOutcome,
};
use crate::data::stats::{histogram, HistogramBin};
use crate::data::{clean, export, loader};

// ---------------------------------------------------------------------------
// Chart selection
// ---------------------------------------------------------------------------

/// Which trend chart the central panel draws for a query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    IndexTrend,
    Dimensions,
    KeywordTrend,
    KeywordCounts,
    Radar,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::IndexTrend,
        ChartKind::Dimensions,
        ChartKind::KeywordTrend,
        ChartKind::KeywordCounts,
        ChartKind::Radar,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ChartKind::IndexTrend => "数字化转型指数趋势",
            ChartKind::Dimensions => "技术维度 vs 应用维度对比",
            ChartKind::KeywordTrend => "多技术关键词趋势",
            ChartKind::KeywordCounts => "数字技术运用词频数",
            ChartKind::Radar => "多维指标雷达图",
        }
    }

    /// Whether this chart overlays comparison companies.
    pub fn supports_comparison(self) -> bool {
        matches!(self, ChartKind::IndexTrend | ChartKind::Radar)
    }
}

// ---------------------------------------------------------------------------
// Query result
// ---------------------------------------------------------------------------

/// Another company drawn next to the main selection.
#[derive(Debug, Clone)]
pub struct ComparisonSeries {
    pub code: String,
    pub company: String,
    /// Records inside the query's year range, ascending by year.
    pub records: Vec<Record>,
}

/// The outcome of the last successful query, owned so the UI can keep
/// drawing it while the inputs change.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub query: Query,
    pub company: String,
    pub chart: ChartKind,
    /// Records inside the year range, ascending by year.
    pub records: Vec<Record>,
    pub comparisons: Vec<ComparisonSeries>,
    /// Whether the dataset carries a transformation index column.
    pub has_index: bool,
}

impl Analysis {
    pub fn record_refs(&self) -> Vec<&Record> {
        self.records.iter().collect()
    }
}

/// Message shown in the top bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub message: String,
    pub error: bool,
}

impl Status {
    pub fn info(message: impl Into<String>) -> Self {
        Status {
            message: message.into(),
            error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Status {
            message: message.into(),
            error: true,
        }
    }
}

/// Where the current dataset came from.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub path: PathBuf,
    /// SHA-256 of the file contents the dataset was cleaned from.
    pub fingerprint: String,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: ColumnConfig,

    /// Cleaned dataset (None until user loads a file).
    pub dataset: Option<Dataset>,
    pub source: Option<LoadedSource>,

    /// Views derived once per dataset.
    pub directory: CompanyDirectory,
    pub overview: DatasetOverview,
    pub top: Vec<CompanyCount>,
    pub index_histogram: Vec<HistogramBin>,

    /// Query inputs.
    pub code_input: String,
    pub search: String,
    pub year_range: (i32, i32),
    pub chart: ChartKind,
    pub compare: bool,
    pub comparison_picks: [String; MAX_COMPARISONS],

    pub analysis: Option<Analysis>,

    /// Status / error message shown in the UI.
    pub status: Option<Status>,
}

impl AppState {
    pub fn new(config: ColumnConfig) -> Self {
        Self {
            config,
            dataset: None,
            source: None,
            directory: CompanyDirectory::default(),
            overview: DatasetOverview::default(),
            top: Vec::new(),
            index_histogram: Vec::new(),
            code_input: String::new(),
            search: String::new(),
            year_range: (1999, 2023),
            chart: ChartKind::IndexTrend,
            compare: false,
            comparison_picks: Default::default(),
            analysis: None,
            status: None,
        }
    }

    /// Load and clean `path`, reusing the current dataset when the file
    /// content is unchanged. Failures end up in `status`.
    pub fn open(&mut self, path: &Path) {
        if let Err(e) = self.try_open(path) {
            log::error!("Failed to load file: {e:#}");
            self.status = Some(Status::error(format!("数据加载失败: {e:#}")));
        }
    }

    fn try_open(&mut self, path: &Path) -> Result<()> {
        let fingerprint = loader::fingerprint(path)?;
        let unchanged = matches!(&self.source, Some(src) if src.fingerprint == fingerprint);
        if let (true, Some(ds)) = (unchanged, &self.dataset) {
            log::info!("{} unchanged, reusing cleaned dataset", path.display());
            self.status = Some(Status::info(format!("数据未变化，共 {} 条记录", ds.len())));
            self.source = Some(LoadedSource {
                path: path.to_path_buf(),
                fingerprint,
            });
            return Ok(());
        }

        let raw = loader::load_file(path)?;
        let dataset = clean::clean(&raw, &self.config);
        log::info!(
            "Loaded {}: {} records kept, {} dropped, years {:?}",
            path.display(),
            dataset.len(),
            dataset.dropped_rows,
            dataset.year_bounds
        );
        self.set_dataset(
            dataset,
            LoadedSource {
                path: path.to_path_buf(),
                fingerprint,
            },
        );
        Ok(())
    }

    /// Ingest a newly cleaned dataset and reset everything derived from it.
    pub fn set_dataset(&mut self, dataset: Dataset, source: LoadedSource) {
        self.directory = CompanyDirectory::build(&dataset);
        self.overview = DatasetOverview::of(&dataset);
        self.top = top_companies(&dataset, TOP_COMPANIES);
        self.index_histogram = histogram(
            dataset.records.iter().filter_map(|r| r.value(Indicator::Index)),
            HISTOGRAM_BINS,
        );
        if let Some(b) = dataset.year_bounds {
            self.year_range = (b.min, b.max);
        }
        self.status = Some(Status::info(format!("数据加载成功，共加载 {} 条记录", dataset.len())));
        self.analysis = None;
        self.dataset = Some(dataset);
        self.source = Some(source);
    }

    /// Put `code` into the query input, e.g. from a quick-pick button.
    pub fn select_code(&mut self, code: &str) {
        self.code_input = code.to_string();
    }

    /// Run the query described by the current inputs.
    pub fn run_query(&mut self) {
        let Some(dataset) = &self.dataset else {
            self.status = Some(Status::error("请先加载数据文件"));
            return;
        };
        let code = match parse_code_input(&self.code_input) {
            Ok(code) => code,
            Err(e) => {
                self.status = Some(Status::error(format!("请输入有效的数字股票代码: {e}")));
                return;
            }
        };
        let query = Query::new(&code, self.year_range.0, self.year_range.1);

        let records = match query.resolve(dataset) {
            QueryOutcome::UnknownCode => {
                self.status = Some(Status::error(format!("未找到股票代码 {code} 的数据")));
                self.analysis = None;
                return;
            }
            QueryOutcome::OutOfRange => {
                self.status = Some(Status::error(format!(
                    "在 {}-{} 年份范围内未找到数据",
                    query.min_year, query.max_year
                )));
                self.analysis = None;
                return;
            }
            QueryOutcome::Found(records) => records,
        };

        let picks: &[String] = if self.compare { &self.comparison_picks } else { &[] };
        let comparisons = comparison_codes(&code, picks, MAX_COMPARISONS)
            .into_iter()
            .filter_map(|c| {
                let found = query.for_code(&c).run(dataset);
                let company = found.first()?.company.clone();
                Some(ComparisonSeries {
                    code: c,
                    company,
                    records: found.into_iter().cloned().collect(),
                })
            })
            .collect();

        let has_index = dataset.has(Indicator::Index);
        let company = records[0].company.clone();
        log::info!("Query {code} {}-{}: {} records", query.min_year, query.max_year, records.len());
        self.status = Some(Status::info(format!("正在分析: {company} (股票代码: {code})")));
        self.analysis = Some(Analysis {
            query,
            company,
            chart: self.chart,
            records: records.into_iter().cloned().collect(),
            comparisons,
            has_index,
        });
    }

    /// Indicators exported alongside code, company and year.
    pub fn export_indicators(&self) -> Vec<Indicator> {
        match &self.dataset {
            Some(ds) => Indicator::ALL.iter().copied().filter(|&i| ds.has(i)).collect(),
            None => Vec::new(),
        }
    }

    /// Write the current analysis to `path` as CSV.
    pub fn export(&mut self, path: &Path) {
        let Some(analysis) = &self.analysis else {
            return;
        };
        let indicators = self.export_indicators();
        match export::export_file(path, &analysis.record_refs(), &indicators, &self.config) {
            Ok(()) => self.status = Some(Status::info(format!("已导出到 {}", path.display()))),
            Err(e) => {
                log::error!("Export failed: {e:#}");
                self.status = Some(Status::error(format!("导出失败: {e:#}")));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const CSV: &str = "股票代码,企业名称,年份,数字化转型指数,技术维度,应用维度\n\
                       1,平安银行,2020,10,1,2\n\
                       000001.0,平安银行,2021,20,3,4\n\
                       2,万科A,2021,5,1,1\n\
                       ,无代码,2021,1,1,1\n";

    fn loaded() -> (AppState, tempfile::NamedTempFile) {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();
        let mut state = AppState::new(ColumnConfig::default());
        state.open(file.path());
        (state, file)
    }

    #[test]
    fn open_builds_derived_views() {
        let (state, _file) = loaded();
        let ds = state.dataset.as_ref().unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.dropped_rows, 1);
        assert_eq!(state.year_range, (2020, 2021));
        assert_eq!(state.directory.len(), 2);
        assert_eq!(state.top[0].code, "000001");
        assert_eq!(state.overview.records, 3);
        assert!(!state.index_histogram.is_empty());
    }

    #[test]
    fn reopening_same_content_keeps_dataset() {
        let (mut state, file) = loaded();
        state.code_input = "1".into();
        state.run_query();
        assert!(state.analysis.is_some());

        state.open(file.path());
        assert!(state.analysis.is_some());

        let mut changed = std::fs::OpenOptions::new().append(true).open(file.path()).unwrap();
        writeln!(changed, "3,新公司,2022,1,1,1").unwrap();
        state.open(file.path());
        assert!(state.analysis.is_none());
        assert_eq!(state.dataset.as_ref().unwrap().len(), 4);
        assert_eq!(state.year_range, (2020, 2022));
    }

    #[test]
    fn query_with_comparisons() {
        let (mut state, _file) = loaded();
        state.code_input = "000001".into();
        state.compare = true;
        state.comparison_picks = ["2".into(), "1".into(), "9".into()];
        state.run_query();

        let analysis = state.analysis.as_ref().unwrap();
        assert_eq!(analysis.company, "平安银行");
        assert!(analysis.has_index);
        assert_eq!(
            analysis.records.iter().map(|r| r.year).collect::<Vec<_>>(),
            vec![2020, 2021]
        );
        assert_eq!(analysis.comparisons.len(), 1);
        assert_eq!(analysis.comparisons[0].company, "万科A");
    }

    #[test]
    fn rejected_and_empty_queries() {
        let (mut state, _file) = loaded();
        state.code_input = "SZ000001".into();
        state.run_query();
        assert!(state.analysis.is_none());

        state.code_input = "1".into();
        state.year_range = (2022, 2020);
        state.run_query();
        assert!(state.analysis.is_none());
        let status = state.status.as_ref().unwrap();
        assert!(status.error);
        assert!(status.message.contains("2022-2020"));
    }

    #[test]
    fn export_round_trip() {
        let (mut state, _file) = loaded();
        state.code_input = "1".into();
        state.run_query();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        state.export(&path);

        let raw = loader::load_file(&path).unwrap();
        let ds = clean::clean(&raw, &state.config);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[1].value(Indicator::AppDimension), Some(4.0));
    }
}

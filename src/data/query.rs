use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::model::{Dataset, Record};
use super::normalize::normalize_str;

// ---------------------------------------------------------------------------
// Primitive queries
// ---------------------------------------------------------------------------

/// All records whose code matches `code` after normalization.
/// A code that normalizes to nothing matches nothing.
pub fn lookup<'a>(dataset: &'a Dataset, code: &str) -> Vec<&'a Record> {
    let code = normalize_str(code);
    if code.is_empty() {
        return Vec::new();
    }
    dataset.records.iter().filter(|r| r.code == code).collect()
}

/// Records with `min_year <= year <= max_year`, in input order.
pub fn filter_by_year_range<'a>(
    records: &[&'a Record],
    min_year: i32,
    max_year: i32,
) -> Vec<&'a Record> {
    records
        .iter()
        .copied()
        .filter(|r| (min_year..=max_year).contains(&r.year))
        .collect()
}

/// Ascending by year; equal years keep their input order.
pub fn sort_by_year(mut records: Vec<&Record>) -> Vec<&Record> {
    records.sort_by_key(|r| r.year);
    records
}

// ---------------------------------------------------------------------------
// Request-scoped query
// ---------------------------------------------------------------------------

/// Rejected query input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("no stock code entered")]
    Empty,
    #[error("'{0}' is not a numeric stock code")]
    NotNumeric(String),
}

/// Validate typed stock-code input and return its canonical form.
///
/// Only digits and `.` are accepted, so `600000.0` passes but `SH600000`
/// does not, even though [`normalize_str`] would accept both.
pub fn parse_code_input(input: &str) -> Result<String, QueryError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(QueryError::Empty);
    }
    if !input.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(QueryError::NotNumeric(input.to_string()));
    }
    let code = normalize_str(input);
    if code.is_empty() {
        return Err(QueryError::NotNumeric(input.to_string()));
    }
    Ok(code)
}

/// One lookup: a company code and an inclusive year range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub code: String,
    pub min_year: i32,
    pub max_year: i32,
}

/// Result of resolving a [`Query`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome<'a> {
    /// No record carries this code at all.
    UnknownCode,
    /// The code exists but has no record inside the year range.
    OutOfRange,
    /// Matching records, ascending by year.
    Found(Vec<&'a Record>),
}

impl Query {
    pub fn new(code: &str, min_year: i32, max_year: i32) -> Self {
        Query {
            code: normalize_str(code),
            min_year,
            max_year,
        }
    }

    /// Matching records sorted by year; empty when nothing matches.
    pub fn run<'a>(&self, dataset: &'a Dataset) -> Vec<&'a Record> {
        let hits = lookup(dataset, &self.code);
        sort_by_year(filter_by_year_range(&hits, self.min_year, self.max_year))
    }

    /// Like [`Query::run`], but tells an unknown code from an empty range.
    pub fn resolve<'a>(&self, dataset: &'a Dataset) -> QueryOutcome<'a> {
        let hits = lookup(dataset, &self.code);
        if hits.is_empty() {
            return QueryOutcome::UnknownCode;
        }
        let in_range = filter_by_year_range(&hits, self.min_year, self.max_year);
        if in_range.is_empty() {
            QueryOutcome::OutOfRange
        } else {
            QueryOutcome::Found(sort_by_year(in_range))
        }
    }

    /// The same year range applied to another company.
    pub fn for_code(&self, code: &str) -> Query {
        Query::new(code, self.min_year, self.max_year)
    }
}

/// Normalized comparison codes: valid per [`parse_code_input`], distinct,
/// never `main`, at most `limit`.
pub fn comparison_codes<S: AsRef<str>>(main: &str, picks: &[S], limit: usize) -> Vec<String> {
    let main = normalize_str(main);
    let mut out: Vec<String> = Vec::new();
    for pick in picks {
        let Ok(code) = parse_code_input(pick.as_ref()) else {
            continue;
        };
        if code == main || out.contains(&code) {
            continue;
        }
        out.push(code);
        if out.len() == limit {
            break;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Dataset-level views
// ---------------------------------------------------------------------------

/// Code → company name. When a code appears under several names the last
/// one in source order wins.
#[derive(Debug, Clone, Default)]
pub struct CompanyDirectory {
    names: BTreeMap<String, String>,
}

impl CompanyDirectory {
    pub fn build(dataset: &Dataset) -> Self {
        let names = dataset
            .records
            .iter()
            .map(|r| (r.code.clone(), r.company.clone()))
            .collect();
        CompanyDirectory { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn name(&self, code: &str) -> Option<&str> {
        self.names.get(&normalize_str(code)).map(String::as_str)
    }

    /// `(code, name)` pairs whose code contains `fragment`, ascending by code.
    pub fn search<'a>(&'a self, fragment: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let fragment = fragment.trim();
        self.names
            .iter()
            .filter(move |(code, _)| code.contains(fragment))
            .map(|(c, n)| (c.as_str(), n.as_str()))
    }
}

/// Selector label shown for a company, e.g. `000001 - 平安银行`.
pub fn option_label(code: &str, name: &str) -> String {
    format!("{code} - {name}")
}

/// A `(code, company)` group and its record count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyCount {
    pub code: String,
    pub company: String,
    pub records: usize,
}

/// The `n` companies with the most records; ties go to the lower code.
pub fn top_companies(dataset: &Dataset, n: usize) -> Vec<CompanyCount> {
    let mut groups: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for r in &dataset.records {
        *groups.entry((r.code.as_str(), r.company.as_str())).or_default() += 1;
    }
    let mut counts: Vec<CompanyCount> = groups
        .into_iter()
        .map(|((code, company), records)| CompanyCount {
            code: code.to_string(),
            company: company.to_string(),
            records,
        })
        .collect();
    counts.sort_by(|a, b| b.records.cmp(&a.records));
    counts.truncate(n);
    counts
}

/// Headline counts for the dataset summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetOverview {
    pub records: usize,
    pub codes: usize,
    pub companies: usize,
    pub years: usize,
}

impl DatasetOverview {
    pub fn of(dataset: &Dataset) -> Self {
        let distinct = |f: fn(&Record) -> String| -> usize {
            dataset.records.iter().map(f).collect::<BTreeSet<_>>().len()
        };
        DatasetOverview {
            records: dataset.len(),
            codes: distinct(|r| r.code.clone()),
            companies: distinct(|r| r.company.clone()),
            years: dataset
                .records
                .iter()
                .map(|r| r.year)
                .collect::<BTreeSet<_>>()
                .len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Indicator;

    fn dataset(rows: &[(&str, &str, i32)]) -> Dataset {
        let records = rows
            .iter()
            .map(|&(code, name, year)| Record::new(normalize_str(code), name, year))
            .collect();
        Dataset::from_records(records, [Indicator::Index].into(), 0)
    }

    fn years(records: &[&Record]) -> Vec<i32> {
        records.iter().map(|r| r.year).collect()
    }

    #[test]
    fn lookup_normalizes_the_query() {
        let ds = dataset(&[("1", "平安银行", 2021), ("600000", "浦发银行", 2020), ("000001", "平安银行", 2020)]);
        assert_eq!(lookup(&ds, "1").len(), 2);
        assert_eq!(lookup(&ds, " 000001 ").len(), 2);
        assert_eq!(lookup(&ds, "1.0").len(), 2);
        assert!(lookup(&ds, "999999").is_empty());
        assert!(lookup(&ds, "abc").is_empty());
        assert!(lookup(&ds, "").is_empty());
        assert!(lookup(&ds, "1").iter().all(|r| r.code == "000001"));
    }

    #[test]
    fn year_range_is_inclusive_and_monotonic() {
        let ds = dataset(&[("1", "A", 2021), ("1", "A", 2019), ("1", "A", 2020), ("1", "A", 2022)]);
        let all = lookup(&ds, "1");

        assert_eq!(years(&filter_by_year_range(&all, 2020, 2021)), vec![2021, 2020]);
        assert_eq!(years(&filter_by_year_range(&all, 2020, 2020)), vec![2020]);
        assert!(filter_by_year_range(&all, 2022, 2020).is_empty());

        let mut prev = 0;
        for (lo, hi) in [(2020, 2020), (2020, 2021), (2019, 2021), (2000, 2100)] {
            let n = filter_by_year_range(&all, lo, hi).len();
            assert!(n >= prev);
            prev = n;
        }
        assert_eq!(prev, 4);
    }

    #[test]
    fn sort_is_stable() {
        let ds = dataset(&[("1", "first", 2021), ("1", "A", 2019), ("1", "second", 2021)]);
        let sorted = sort_by_year(lookup(&ds, "1"));
        assert_eq!(years(&sorted), vec![2019, 2021, 2021]);
        assert_eq!(sorted[1].company, "first");
        assert_eq!(sorted[2].company, "second");
    }

    #[test]
    fn resolve_distinguishes_empty_outcomes() {
        let ds = dataset(&[("1", "A", 2021), ("1", "A", 2020)]);
        assert_eq!(Query::new("2", 2000, 2030).resolve(&ds), QueryOutcome::UnknownCode);
        assert_eq!(Query::new("1", 2010, 2015).resolve(&ds), QueryOutcome::OutOfRange);
        match Query::new("000001", 2000, 2030).resolve(&ds) {
            QueryOutcome::Found(records) => assert_eq!(years(&records), vec![2020, 2021]),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(years(&Query::new("1", 2021, 2021).run(&ds)), vec![2021]);
    }

    #[test]
    fn code_input_validation() {
        assert_eq!(parse_code_input(" 1 "), Ok("000001".to_string()));
        assert_eq!(parse_code_input("600000.0"), Ok("600000".to_string()));
        assert_eq!(parse_code_input("  "), Err(QueryError::Empty));
        assert!(matches!(parse_code_input("SH600000"), Err(QueryError::NotNumeric(_))));
        assert!(matches!(parse_code_input("."), Err(QueryError::NotNumeric(_))));
    }

    #[test]
    fn comparisons_skip_main_and_duplicates() {
        let picks = ["000001", "2", "", "2.0", "3", "4", "5"];
        assert_eq!(comparison_codes("1", &picks, 3), vec!["000002", "000003", "000004"]);
        assert!(comparison_codes::<&str>("1", &[], 3).is_empty());
        let picks = ["SH600000", "sz2", "600519"];
        assert_eq!(comparison_codes("1", &picks, 3), vec!["600519"]);
    }

    #[test]
    fn directory_and_rankings() {
        let ds = dataset(&[
            ("2", "万科A", 2020),
            ("1", "深发展", 2019),
            ("1", "平安银行", 2020),
            ("600000", "浦发银行", 2020),
            ("2", "万科A", 2021),
        ]);
        let dir = CompanyDirectory::build(&ds);
        assert_eq!(dir.len(), 3);
        assert_eq!(dir.name("1"), Some("平安银行"));
        let hits: Vec<_> = dir.search("00000").map(|(c, _)| c).collect();
        assert_eq!(hits, vec!["000001", "000002", "600000"]);
        let hits: Vec<_> = dir.search("60").map(|(c, _)| c).collect();
        assert_eq!(hits, vec!["600000"]);
        assert_eq!(option_label("000002", "万科A"), "000002 - 万科A");

        let top = top_companies(&ds, 2);
        assert_eq!(top[0].code, "000002");
        assert_eq!(top[0].records, 2);
        assert_eq!(top[1].code, "000001");
        assert_eq!(top[1].company, "平安银行");

        let overview = DatasetOverview::of(&ds);
        assert_eq!(
            overview,
            DatasetOverview { records: 5, codes: 3, companies: 4, years: 3 }
        );
    }
}

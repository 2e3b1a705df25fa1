/// Data layer: raw loading, code normalization, cleaning, queries and
/// statistics.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable (untyped cells)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  clean    │  normalize codes, parse years → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────┐
///   │  query / stats    │  lookup, year range, summaries
///   └──────────────────┘
///        │
///        ▼
///   ui / export
/// ```

pub mod clean;
pub mod export;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod query;
pub mod stats;

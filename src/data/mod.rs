/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  https://… / .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  fetch / read → Vec<RawSale>   (SchemaError, LoadError)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  dates    │  parse Date, derive display column   (ParseError)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ SalesDataset  │  Vec<SalesRecord>, bounds, category index
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterState → filtered indices
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  six chart series over the filtered view
///   └───────────┘
/// ```

pub mod aggregate;
pub mod dates;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;

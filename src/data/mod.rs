/// Data layer: table types, loading, and schema alignment.
///
/// Architecture:
/// ```text
///  .csv / .csv.gz / .tar(.gz)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  strategy list → Table (raw cells)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  model    │  Table → Matrix, MarkerSchema, LabeledTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  align    │  test entry width vs. training schema
///   └──────────┘
/// ```

pub mod align;
pub mod loader;
pub mod model;

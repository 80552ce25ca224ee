/// Data layer: catalog ingestion, core types and angle helpers.
///
/// Architecture:
/// ```text
///  .csv / .txt / .dat  (+ ReadOptions)
///        │
///        ▼
///   ┌──────────┐
///   │  reader   │  strip comments → split → name → type
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  Vec<Column>, per-cell missing markers
///   └──────────┘
///        │
///        ├──▶ Column::filled / to_f64_vec     dense values
///        ├──▶ angle: sexagesimal → degrees, wrap
///        └──▶ export: Arrow RecordBatch for plotting
/// ```

pub mod angle;
pub mod error;
pub mod export;
pub mod model;
pub mod options;
pub mod reader;

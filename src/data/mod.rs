/// Data layer: core types and loading.
///
/// Architecture:
/// ```text
///  uploaded .csv bytes
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse header + rows → typed cells
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │   Dataset    │  Vec<Column>, each tagged Numeric | Categorical
///   └──────────────┘
/// ```

pub mod loader;
pub mod model;

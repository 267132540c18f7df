/// rainmon_service: UK rainfall telemetry normalisation and outlier correction.
///
/// # Module structure
///
/// ```text
/// rainmon_service
/// ├── model      — shared data types (Reading, Outlier, StationRecord, errors)
/// ├── config     — rainmon.toml loader and outlier engine tuning
/// ├── ingest
/// │   ├── ea     — Environment Agency readings: URL construction, CSV/JSON parsing
/// │   └── fixtures (test only) — representative API response payloads
/// ├── analysis
/// │   └── outliers — threshold detection + ordered correction strategies
/// ├── pipeline   — per-station processing and parallel batches
/// └── store      — one JSON document per station on disk
/// ```

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod model;
pub mod pipeline;
pub mod store;

/// Core data types for the rainfall telemetry service.
///
/// This module defines the shared domain model imported by all other modules:
/// the per-station reading shape that ends up in persisted JSON documents,
/// the outlier/correction audit types, and the error types. It contains no
/// I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// A single rainfall measurement for one station interval (nominally 15 min).
///
/// `timestamp` is the RFC 3339 string handed over by the ingest layer, kept
/// verbatim so a malformed value survives a round trip through the engine.
/// `rainfall_mm` is `None` when the source row had no usable number.
///
/// `corrected` and `original_rainfall_mm` are only present on readings the
/// outlier engine replaced, and always appear together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: String,
    #[serde(default)]
    pub rainfall_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_rainfall_mm: Option<f64>,
}

impl Reading {
    /// An unmodified reading as produced by a parser.
    pub fn new(timestamp: impl Into<String>, rainfall_mm: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            rainfall_mm: Some(rainfall_mm),
            corrected: None,
            original_rainfall_mm: None,
        }
    }

    /// A reading whose source row carried no usable value.
    pub fn missing(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            rainfall_mm: None,
            corrected: None,
            original_rainfall_mm: None,
        }
    }

    pub fn is_corrected(&self) -> bool {
        self.corrected == Some(true)
    }
}

// ---------------------------------------------------------------------------
// Outlier / correction audit types
// ---------------------------------------------------------------------------

/// One reading that exceeded the plausibility threshold.
///
/// `rainfall_mm` is always the pre-correction value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlier {
    pub index: usize,
    pub timestamp: String,
    pub rainfall_mm: f64,
    #[serde(rename = "exceedsBy")]
    pub exceeds_by: f64,
}

/// Replacement strategies, listed in the order they are attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionMethod {
    /// Median of valid readings within the window on either side.
    LocalMedian,
    /// Position-weighted line between the nearest valid reading on each side.
    LinearInterpolation,
    /// Copy of the nearest valid reading, previous preferred.
    AdjacentValue,
    /// No valid reading anywhere in the series.
    ZeroFallback,
}

impl std::fmt::Display for CorrectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorrectionMethod::LocalMedian => write!(f, "local_median"),
            CorrectionMethod::LinearInterpolation => write!(f, "linear_interpolation"),
            CorrectionMethod::AdjacentValue => write!(f, "adjacent_value"),
            CorrectionMethod::ZeroFallback => write!(f, "zero_fallback"),
        }
    }
}

/// A single applied correction: which reading changed and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub index: usize,
    pub method: CorrectionMethod,
    pub original_rainfall_mm: f64,
    pub corrected_rainfall_mm: f64,
}

/// Summary of one correction run, embedded in the station document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionMetadata {
    pub outliers_found: usize,
    pub corrections_applied: usize,
    pub methods_used: BTreeMap<CorrectionMethod, usize>,
    pub threshold_mm: f64,
    pub record_errors: usize,
    pub processed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Station document
// ---------------------------------------------------------------------------

/// The persisted per-station time series document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationRecord {
    pub station_id: String,
    pub source: String,
    pub updated_at: DateTime<Utc>,
    pub readings: Vec<Reading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction: Option<CorrectionMetadata>,
}

impl StationRecord {
    /// Readings currently carrying an engine replacement.
    pub fn corrected_readings(&self) -> usize {
        self.readings.iter().filter(|r| r.is_corrected()).count()
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Invalid engine or service configuration. Raised before any data is
/// touched.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("threshold must be a positive number of millimetres, got {0}")]
    InvalidThreshold(f64),

    #[error("window size must be at least 1, got {0}")]
    InvalidWindowSize(usize),

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

/// A single malformed reading. The reading is skipped by the engine; the
/// run continues.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordError {
    #[error("reading {index}: unparseable timestamp {timestamp:?}")]
    InvalidTimestamp { index: usize, timestamp: String },

    #[error("reading {index} at {timestamp}: missing rainfall value")]
    MissingValue { index: usize, timestamp: String },

    #[error("reading {index} at {timestamp}: invalid rainfall value {value}")]
    InvalidValue {
        index: usize,
        timestamp: String,
        value: f64,
    },
}

/// Rainfall outlier detection and correction.
///
/// `detect_and_correct` takes one station's readings in sequence order and:
///
/// 1. **Validates** every reading. A reading with an unparseable timestamp,
///    no value, or a negative / non-finite value becomes a `RecordError` and
///    is excluded from everything that follows (it is neither an outlier nor
///    a usable neighbour) but is passed through unchanged.
/// 2. **Detects** outliers with a plain point test: `rainfall_mm > threshold`.
///    No rate is derived from the gap between timestamps; neighbour windows
///    are counted in positions, not minutes.
/// 3. **Corrects** outliers left to right, trying each strategy in
///    `CORRECTION_ORDER` until one yields a value:
///    - local median of valid readings within `window_size` positions,
///    - linear interpolation between the nearest valid reading on each side,
///      weighted by sequence position (timestamps may be irregular),
///    - copy of the nearest valid reading, previous preferred,
///    - zero, when no valid reading exists at all.
///
///    A corrected value immediately becomes a valid neighbour for the
///    outliers after it.
///
/// Replacements are clamped to `[0, threshold]`, so a corrected series has
/// no outliers left and a second run over it changes nothing.
///
/// The function is pure: no I/O, no logging, no shared state. Everything the
/// caller needs for its audit trail is in the returned `CorrectionReport`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::OutlierConfig;
use crate::model::{
    ConfigError, Correction, CorrectionMetadata, CorrectionMethod, Outlier, Reading, RecordError,
};

/// Strategies in the order they are attempted for each outlier.
pub const CORRECTION_ORDER: [CorrectionMethod; 4] = [
    CorrectionMethod::LocalMedian,
    CorrectionMethod::LinearInterpolation,
    CorrectionMethod::AdjacentValue,
    CorrectionMethod::ZeroFallback,
];

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Result of one `detect_and_correct` run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionReport {
    /// Input series with outliers replaced. Identical to the input when
    /// `auto_correct` is off.
    pub corrected_data: Vec<Reading>,
    /// Every reading over the threshold, in index order, with its
    /// pre-correction value.
    pub outliers: Vec<Outlier>,
    pub had_outliers: bool,
    pub corrections_applied: usize,
    /// Which readings changed and which strategy produced the new value.
    pub corrections: Vec<Correction>,
    /// Malformed readings that were skipped.
    pub record_errors: Vec<RecordError>,
}

impl CorrectionReport {
    /// Number of corrections produced by each strategy.
    pub fn methods_used(&self) -> BTreeMap<CorrectionMethod, usize> {
        let mut counts = BTreeMap::new();
        for correction in &self.corrections {
            *counts.entry(correction.method).or_insert(0) += 1;
        }
        counts
    }
}

impl CorrectionMetadata {
    pub fn from_report(
        report: &CorrectionReport,
        threshold_mm: f64,
        processed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            outliers_found: report.outliers.len(),
            corrections_applied: report.corrections_applied,
            methods_used: report.methods_used(),
            threshold_mm,
            record_errors: report.record_errors.len(),
            processed_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Checks one reading and returns its value if it is usable at all.
pub fn validate_reading(index: usize, reading: &Reading) -> Result<f64, RecordError> {
    if DateTime::parse_from_rfc3339(&reading.timestamp).is_err() {
        return Err(RecordError::InvalidTimestamp {
            index,
            timestamp: reading.timestamp.clone(),
        });
    }

    match reading.rainfall_mm {
        None => Err(RecordError::MissingValue {
            index,
            timestamp: reading.timestamp.clone(),
        }),
        Some(value) if !value.is_finite() || value < 0.0 => Err(RecordError::InvalidValue {
            index,
            timestamp: reading.timestamp.clone(),
            value,
        }),
        Some(value) => Ok(value),
    }
}

/// Detects and (optionally) corrects outliers in one station's series.
///
/// # Errors
/// `ConfigError` if the threshold is not positive or the window is zero.
/// Nothing in the series itself can make this fail.
pub fn detect_and_correct(
    series: &[Reading],
    config: &OutlierConfig,
) -> Result<CorrectionReport, ConfigError> {
    config.validate()?;

    let mut outliers = Vec::new();
    let mut record_errors = Vec::new();

    // anchors[i] holds a value only while reading i may anchor a correction.
    let mut anchors: Vec<Option<f64>> = Vec::with_capacity(series.len());

    for (index, reading) in series.iter().enumerate() {
        match validate_reading(index, reading) {
            Err(err) => {
                record_errors.push(err);
                anchors.push(None);
            }
            Ok(value) if value > config.threshold => {
                outliers.push(Outlier {
                    index,
                    timestamp: reading.timestamp.clone(),
                    rainfall_mm: value,
                    exceeds_by: value - config.threshold,
                });
                anchors.push(None);
            }
            Ok(value) => anchors.push(Some(value)),
        }
    }

    let mut corrected_data = series.to_vec();
    let mut corrections = Vec::new();

    if config.auto_correct {
        for outlier in &outliers {
            let (method, estimate) = estimate(&anchors, outlier.index, config.window_size);
            let replacement = estimate.clamp(0.0, config.threshold);

            let reading = &mut corrected_data[outlier.index];
            if reading.original_rainfall_mm.is_none() {
                reading.original_rainfall_mm = Some(outlier.rainfall_mm);
            }
            reading.rainfall_mm = Some(replacement);
            reading.corrected = Some(true);

            anchors[outlier.index] = Some(replacement);

            corrections.push(Correction {
                index: outlier.index,
                method,
                original_rainfall_mm: outlier.rainfall_mm,
                corrected_rainfall_mm: replacement,
            });
        }
    }

    Ok(CorrectionReport {
        corrected_data,
        had_outliers: !outliers.is_empty(),
        corrections_applied: corrections.len(),
        outliers,
        corrections,
        record_errors,
    })
}

// ---------------------------------------------------------------------------
// Correction strategies
// ---------------------------------------------------------------------------

/// First strategy in `CORRECTION_ORDER` that produces a value.
fn estimate(anchors: &[Option<f64>], index: usize, window_size: usize) -> (CorrectionMethod, f64) {
    CORRECTION_ORDER
        .iter()
        .find_map(|&method| apply(method, anchors, index, window_size).map(|v| (method, v)))
        .unwrap_or((CorrectionMethod::ZeroFallback, 0.0))
}

fn apply(
    method: CorrectionMethod,
    anchors: &[Option<f64>],
    index: usize,
    window_size: usize,
) -> Option<f64> {
    match method {
        CorrectionMethod::LocalMedian => local_median(anchors, index, window_size),
        CorrectionMethod::LinearInterpolation => {
            let (before, value_before) = nearest_before(anchors, index)?;
            let (after, value_after) = nearest_after(anchors, index)?;
            let fraction = (index - before) as f64 / (after - before) as f64;
            Some(value_before + (value_after - value_before) * fraction)
        }
        CorrectionMethod::AdjacentValue => nearest_before(anchors, index)
            .or_else(|| nearest_after(anchors, index))
            .map(|(_, value)| value),
        CorrectionMethod::ZeroFallback => Some(0.0),
    }
}

/// Median of the valid values within `window_size` positions either side of
/// `index`. Even-sized samples take the lower middle value.
fn local_median(anchors: &[Option<f64>], index: usize, window_size: usize) -> Option<f64> {
    let start = index.saturating_sub(window_size);
    let end = index.saturating_add(window_size).min(anchors.len() - 1);

    let mut sample: Vec<f64> = (start..=end)
        .filter(|&j| j != index)
        .filter_map(|j| anchors[j])
        .collect();

    if sample.is_empty() {
        return None;
    }

    sample.sort_by(f64::total_cmp);
    Some(sample[(sample.len() - 1) / 2])
}

fn nearest_before(anchors: &[Option<f64>], index: usize) -> Option<(usize, f64)> {
    (0..index).rev().find_map(|j| anchors[j].map(|v| (j, v)))
}

fn nearest_after(anchors: &[Option<f64>], index: usize) -> Option<(usize, f64)> {
    (index + 1..anchors.len()).find_map(|j| anchors[j].map(|v| (j, v)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

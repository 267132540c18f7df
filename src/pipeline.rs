/// Station processing pipeline.
///
/// Sits between the ingest layer and storage:
/// 1. Runs the outlier engine over a station's freshly parsed readings
/// 2. Turns the engine's report into `CorrectionMetadata`
/// 3. Assembles the `StationRecord` to persist
/// 4. Logs a one-line summary per station (and details when anything was
///    corrected or skipped)
///
/// Stations are independent, so `process_batch` fans them out over a
/// thread pool.

use chrono::Utc;
use std::sync::mpsc;
use threadpool::ThreadPool;

use crate::analysis::outliers::{detect_and_correct, CorrectionReport};
use crate::config::OutlierConfig;
use crate::model::{ConfigError, CorrectionMetadata, Reading, StationRecord};

/// One station's raw input for `process_batch`.
#[derive(Debug, Clone)]
pub struct StationJob {
    pub station_id: String,
    pub source: String,
    pub readings: Vec<Reading>,
}

/// Output of processing one station: the document to persist and the full
/// engine report behind its metadata.
#[derive(Debug, Clone)]
pub struct ProcessedStation {
    pub record: StationRecord,
    pub report: CorrectionReport,
}

/// Runs the outlier engine for one station and builds its document.
///
/// # Errors
/// Only on invalid configuration; malformed readings are counted in the
/// report instead.
pub fn process_station(
    station_id: &str,
    source: &str,
    readings: &[Reading],
    config: &OutlierConfig,
) -> Result<ProcessedStation, ConfigError> {
    let report = detect_and_correct(readings, config)?;
    let now = Utc::now();

    let record = StationRecord {
        station_id: station_id.to_string(),
        source: source.to_string(),
        updated_at: now,
        readings: report.corrected_data.clone(),
        correction: Some(CorrectionMetadata::from_report(&report, config.threshold, now)),
    };

    log_summary(station_id, &report);

    Ok(ProcessedStation { record, report })
}

/// Result of `process_batch`.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Finished stations, in job order.
    pub processed: Vec<ProcessedStation>,
    /// Stations whose worker died before reporting a result.
    pub unfinished: Vec<String>,
}

/// Processes independent stations in parallel. Results come back in the
/// same order as `jobs`.
///
/// Configuration is validated once up front so a bad threshold fails the
/// whole batch before any station is touched.
pub fn process_batch(
    jobs: Vec<StationJob>,
    config: &OutlierConfig,
    workers: usize,
) -> Result<BatchOutcome, ConfigError> {
    run_batch(jobs, config, workers, process_job)
}

fn process_job(job: &StationJob, config: &OutlierConfig) -> Result<ProcessedStation, ConfigError> {
    process_station(&job.station_id, &job.source, &job.readings, config)
}

type StationFn = fn(&StationJob, &OutlierConfig) -> Result<ProcessedStation, ConfigError>;

fn run_batch(
    jobs: Vec<StationJob>,
    config: &OutlierConfig,
    workers: usize,
    process: StationFn,
) -> Result<BatchOutcome, ConfigError> {
    config.validate()?;

    let station_ids: Vec<String> = jobs.iter().map(|job| job.station_id.clone()).collect();
    let pool = ThreadPool::new(workers.max(1));
    let (tx, rx) = mpsc::channel();

    for (i, job) in jobs.into_iter().enumerate() {
        let tx = tx.clone();
        let config = config.clone();
        pool.execute(move || {
            let result = process(&job, &config);
            // Receiver outlives every job; a send failure means the caller is gone.
            let _ = tx.send((i, result));
        });
    }
    drop(tx);

    let mut slots: Vec<Option<ProcessedStation>> = station_ids.iter().map(|_| None).collect();
    for (i, result) in rx {
        slots[i] = Some(result?);
    }

    let mut outcome = BatchOutcome::default();
    for (station_id, slot) in station_ids.into_iter().zip(slots) {
        match slot {
            Some(station) => outcome.processed.push(station),
            None => {
                log::error!("[{}] worker exited without a result", station_id);
                outcome.unfinished.push(station_id);
            }
        }
    }

    Ok(outcome)
}

/// Logs the engine outcome for one station.
pub fn log_summary(station_id: &str, report: &CorrectionReport) {
    let readings = report.corrected_data.len();

    if !report.had_outliers && report.record_errors.is_empty() {
        log::info!("[{}] {} readings, no outliers", station_id, readings);
        return;
    }

    log::warn!(
        "[{}] {} readings, {} outliers, {} corrected, {} malformed",
        station_id,
        readings,
        report.outliers.len(),
        report.corrections_applied,
        report.record_errors.len()
    );

    for outlier in &report.outliers {
        let fix = report
            .corrections
            .iter()
            .find(|c| c.index == outlier.index)
            .map(|c| format!(" -> {:.2} mm ({})", c.corrected_rainfall_mm, c.method))
            .unwrap_or_default();
        log::warn!(
            "[{}]   {} {:.2} mm exceeds threshold by {:.2} mm{}",
            station_id,
            outlier.timestamp,
            outlier.rainfall_mm,
            outlier.exceeds_by,
            fix
        );
    }

    for err in &report.record_errors {
        log::warn!("[{}]   skipped {}", station_id, err);
    }
}

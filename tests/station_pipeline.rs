/// Integration tests for the station pipeline
///
/// These exercise the public API the way the binary does:
/// 1. Parse an Environment Agency export (CSV or JSON)
/// 2. Run the outlier engine and build the station document
/// 3. Persist it to a file store and read it back
///
/// Run with: cargo test --test station_pipeline

use rainmon_service::config::{parse_config, OutlierConfig};
use rainmon_service::ingest::ea::{parse_readings_csv, parse_readings_json};
use rainmon_service::model::{CorrectionMethod, RecordError};
use rainmon_service::pipeline::{process_batch, process_station, StationJob};
use rainmon_service::store::FileStore;

// Rain gauge export, oldest first: a 45 mm spike at 01:00, a blank value at
// 01:30 and a garbled timestamp on the last row.
const EXPORT_CSV: &str = "dateTime,measure,value
2024-05-01T00:00:00Z,http://environment.data.gov.uk/flood-monitoring/id/measures/E7050-rainfall-tipping_bucket_raingauge-t-15_min-mm,0.2
2024-05-01T00:15:00Z,http://environment.data.gov.uk/flood-monitoring/id/measures/E7050-rainfall-tipping_bucket_raingauge-t-15_min-mm,0.4
2024-05-01T00:30:00Z,http://environment.data.gov.uk/flood-monitoring/id/measures/E7050-rainfall-tipping_bucket_raingauge-t-15_min-mm,0.6
2024-05-01T00:45:00Z,http://environment.data.gov.uk/flood-monitoring/id/measures/E7050-rainfall-tipping_bucket_raingauge-t-15_min-mm,0.8
2024-05-01T01:00:00Z,http://environment.data.gov.uk/flood-monitoring/id/measures/E7050-rainfall-tipping_bucket_raingauge-t-15_min-mm,45.0
2024-05-01T01:15:00Z,http://environment.data.gov.uk/flood-monitoring/id/measures/E7050-rainfall-tipping_bucket_raingauge-t-15_min-mm,0.4
2024-05-01T01:30:00Z,http://environment.data.gov.uk/flood-monitoring/id/measures/E7050-rainfall-tipping_bucket_raingauge-t-15_min-mm,
2024-05-01T01:45:00Z,http://environment.data.gov.uk/flood-monitoring/id/measures/E7050-rainfall-tipping_bucket_raingauge-t-15_min-mm,0.2
2024-05-01 02:00,http://environment.data.gov.uk/flood-monitoring/id/measures/E7050-rainfall-tipping_bucket_raingauge-t-15_min-mm,0.0
";

#[test]
fn test_csv_export_is_corrected_and_persisted() {
    let readings = parse_readings_csv(EXPORT_CSV);
    assert_eq!(readings.len(), 9);

    let processed = process_station("E7050", "ea", &readings, &OutlierConfig::default())
        .expect("default config is valid");
    let report = &processed.report;

    assert_eq!(report.outliers.len(), 1);
    assert_eq!(report.outliers[0].timestamp, "2024-05-01T01:00:00Z");
    assert_eq!(report.outliers[0].exceeds_by, 20.0);
    assert_eq!(report.corrections[0].method, CorrectionMethod::LocalMedian);

    // Blank value and garbled timestamp are skipped, not fatal.
    assert_eq!(report.record_errors.len(), 2);
    assert!(report
        .record_errors
        .iter()
        .any(|e| matches!(e, RecordError::MissingValue { .. })));
    assert!(report
        .record_errors
        .iter()
        .any(|e| matches!(e, RecordError::InvalidTimestamp { .. })));

    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    store.save(&processed.record).unwrap();

    let loaded = store.load("E7050").unwrap().expect("record should be stored");
    assert_eq!(loaded, processed.record);

    let spike = loaded
        .readings
        .iter()
        .find(|r| r.timestamp == "2024-05-01T01:00:00Z")
        .unwrap();
    assert_eq!(spike.corrected, Some(true));
    assert_eq!(spike.original_rainfall_mm, Some(45.0));
    assert!(spike.rainfall_mm.unwrap() <= 25.0);

    let meta = loaded.correction.expect("metadata should round-trip");
    assert_eq!(meta.outliers_found, 1);
    assert_eq!(meta.corrections_applied, 1);
    assert_eq!(meta.record_errors, 2);
}

#[test]
fn test_stored_document_uses_expected_field_names() {
    let readings = parse_readings_csv(EXPORT_CSV);
    let processed = process_station("E7050", "ea", &readings, &OutlierConfig::default()).unwrap();

    let json = serde_json::to_value(&processed.record).unwrap();
    assert_eq!(json["stationId"], "E7050");
    assert_eq!(json["readings"][0]["rainfall_mm"], 0.2);
    assert!(json["readings"][0].get("corrected").is_none());
    assert_eq!(json["readings"][4]["corrected"], true);
    assert_eq!(json["readings"][4]["original_rainfall_mm"], 45.0);
    assert_eq!(json["correction"]["methodsUsed"]["local_median"], 1);

    let report = serde_json::to_value(&processed.report).unwrap();
    assert_eq!(report["hadOutliers"], true);
    assert_eq!(report["correctionsApplied"], 1);
    assert_eq!(report["outliers"][0]["exceedsBy"], 20.0);
    assert!(report["correctedData"].is_array());
}

#[test]
fn test_report_only_config_from_toml() {
    let cfg = parse_config("[outliers]\nauto_correct = false\n", "inline").unwrap();
    let readings = parse_readings_csv(EXPORT_CSV);

    let processed = process_station("E7050", "ea", &readings, &cfg.outliers).unwrap();

    assert!(processed.report.had_outliers);
    assert_eq!(processed.report.corrections_applied, 0);
    assert_eq!(processed.record.readings, readings);
}

#[test]
fn test_batch_of_json_payloads() {
    let spiky = r#"{"items": [
        {"dateTime": "2024-05-01T00:30:00Z", "value": 1.0},
        {"dateTime": "2024-05-01T00:15:00Z", "value": 30.5},
        {"dateTime": "2024-05-01T00:00:00Z", "value": 3.0}
    ]}"#;
    let clean = r#"{"items": [
        {"dateTime": "2024-05-01T00:15:00Z", "value": 0.0},
        {"dateTime": "2024-05-01T00:00:00Z", "value": 0.2}
    ]}"#;

    let jobs = vec![
        StationJob {
            station_id: "E1001".to_string(),
            source: "ea".to_string(),
            readings: parse_readings_json(spiky).unwrap(),
        },
        StationJob {
            station_id: "E1002".to_string(),
            source: "ea".to_string(),
            readings: parse_readings_json(clean).unwrap(),
        },
    ];

    let outcome = process_batch(jobs, &OutlierConfig::default(), 2).unwrap();
    assert!(outcome.unfinished.is_empty());
    let processed = outcome.processed;
    assert_eq!(processed.len(), 2);

    let first = &processed[0];
    assert_eq!(first.record.station_id, "E1001");
    // Lower median of [3.0, 1.0].
    assert_eq!(first.record.readings[1].rainfall_mm, Some(1.0));

    let second = &processed[1];
    assert!(!second.report.had_outliers);

    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    for station in &processed {
        store.save(&station.record).unwrap();
    }
    assert_eq!(store.list_stations().unwrap(), vec!["E1001", "E1002"]);
}

/// Environment Agency flood-monitoring API client (rainfall readings).
///
/// Handles URL construction and response parsing for the station readings
/// endpoint:
///   https://environment.data.gov.uk/flood-monitoring/id/stations/{id}/readings
///
/// The same readings are available as JSON (`readings`) and as CSV
/// (`readings.csv`). Both parsers produce `Reading`s in ascending time order
/// with the provider's timestamp string kept verbatim. A row whose value is
/// missing or non-numeric still yields a `Reading` (with no value) so that
/// the outlier engine can report it as a record error rather than it
/// silently disappearing. See `fixtures.rs` for sample payloads.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::Reading;

/// Upper bound on readings requested per call. 15-minute data for a week
/// is 672 rows.
const READINGS_LIMIT: usize = 10_000;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Non-2xx HTTP response from the EA API.
    #[error("HTTP error: {0}")]
    Http(u16),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The response body could not be interpreted.
    #[error("Parse error: {0}")]
    Parse(String),
}

// ---------------------------------------------------------------------------
// Serde structures for the JSON envelope
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ReadingsResponse {
    items: Vec<ReadingItem>,
}

#[derive(Deserialize)]
struct ReadingItem {
    #[serde(rename = "dateTime")]
    date_time: String,
    // Usually a number, occasionally an array or string on bad rows.
    #[serde(default)]
    value: serde_json::Value,
}

/// Response format for `build_readings_url`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Csv,
}

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

/// Builds the readings URL for one station, restricted to rainfall and to
/// readings at or after `since`.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use rainmon_service::ingest::ea::{build_readings_url, Format};
///
/// let since = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
/// let url = build_readings_url(
///     "https://environment.data.gov.uk/flood-monitoring",
///     "E7050",
///     since,
///     Format::Csv,
/// );
/// assert!(url.contains("/id/stations/E7050/readings.csv?"));
/// ```
pub fn build_readings_url(
    base_url: &str,
    station_id: &str,
    since: DateTime<Utc>,
    format: Format,
) -> String {
    let suffix = match format {
        Format::Json => "",
        Format::Csv => ".csv",
    };
    let since_param = since.format("%Y-%m-%dT%H:%M:%SZ").to_string();

    format!(
        "{}/id/stations/{}/readings{}?parameter=rainfall&_sorted&_limit={}&since={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(station_id),
        suffix,
        READINGS_LIMIT,
        urlencoding::encode(&since_param)
    )
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Parses a `readings.csv` body (`dateTime,measure,value`).
///
/// The header row is skipped. Rows with fewer than three columns are
/// dropped with a warning; rows with an empty or non-numeric value are kept
/// as missing readings.
pub fn parse_readings_csv(csv: &str) -> Vec<Reading> {
    let mut readings = Vec::new();

    for (i, line) in csv.lines().enumerate() {
        if i == 0 || line.trim().is_empty() {
            continue; // Skip header or empty lines
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < 3 {
            log::warn!("EA CSV line {}: expected 3 columns, got {}", i + 1, fields.len());
            continue;
        }

        let timestamp = fields[0];
        // The measure URI has no commas, so the value is always the last field.
        let value = fields[fields.len() - 1];

        match value.parse::<f64>() {
            Ok(v) => readings.push(Reading::new(timestamp, v)),
            Err(_) => {
                log::debug!("EA CSV line {}: no usable value {:?}", i + 1, value);
                readings.push(Reading::missing(timestamp));
            }
        }
    }

    sort_by_time(&mut readings);
    readings
}

/// Parses a JSON readings body (`{"items": [{"dateTime", "value"}, ...]}`).
///
/// # Errors
/// `IngestError::Parse` when the envelope itself is malformed.
pub fn parse_readings_json(json: &str) -> Result<Vec<Reading>, IngestError> {
    let response: ReadingsResponse = serde_json::from_str(json)
        .map_err(|e| IngestError::Parse(format!("JSON deserialization failed: {}", e)))?;

    let mut readings: Vec<Reading> = response
        .items
        .into_iter()
        .map(|item| match item.value.as_f64() {
            Some(v) => Reading::new(item.date_time, v),
            None => Reading::missing(item.date_time),
        })
        .collect();

    sort_by_time(&mut readings);
    Ok(readings)
}

/// Orders readings oldest first. The API returns newest first when
/// `_sorted` is set. Unparseable timestamps keep their relative order and
/// sort after everything else.
fn sort_by_time(readings: &mut [Reading]) {
    readings.sort_by_key(|r| {
        let parsed = DateTime::parse_from_rfc3339(&r.timestamp)
            .ok()
            .map(|dt| dt.with_timezone(&Utc));
        (parsed.is_none(), parsed)
    });
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// Fetches rainfall readings for a station since the given instant.
pub fn fetch_readings(
    client: &reqwest::blocking::Client,
    base_url: &str,
    station_id: &str,
    since: DateTime<Utc>,
) -> Result<Vec<Reading>, IngestError> {
    let url = build_readings_url(base_url, station_id, since, Format::Json);
    log::debug!("GET {}", url);

    let response = client
        .get(&url)
        .header("Accept", "application/json")
        .send()?;

    if !response.status().is_success() {
        return Err(IngestError::Http(response.status().as_u16()));
    }

    let body = response.text()?;
    parse_readings_json(&body)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// Test fixtures: representative payloads from the Environment Agency
/// flood-monitoring readings endpoint.
///
/// These are truncated to the minimum needed to exercise the parsers but
/// keep the real shapes:
///
/// CSV (`/id/stations/{id}/readings.csv`):
///   dateTime,measure,value
///   <RFC 3339 UTC>,<measure URI>,<mm in the 15-minute period>
///
/// JSON (`/id/stations/{id}/readings`):
///   { "@context": ..., "meta": {...}, "items": [
///       { "@id": ..., "dateTime": "...", "measure": "...", "value": 0.2 } ] }
///
/// With `_sorted` both come back newest first. Bad rows occasionally carry
/// an empty value (CSV) or an array instead of a number (JSON).

/// Rain gauge E7050, 12:00-13:00 on 2024-05-01, newest first. 12:30 holds a
/// 48.2 mm spike; 12:45 has no value.
#[cfg(test)]
pub(crate) fn fixture_ea_readings_csv() -> &'static str {
    "dateTime,measure,value
2024-05-01T13:00:00Z,http://environment.data.gov.uk/flood-monitoring/id/measures/E7050-rainfall-tipping_bucket_raingauge-t-15_min-mm,0.4
2024-05-01T12:45:00Z,http://environment.data.gov.uk/flood-monitoring/id/measures/E7050-rainfall-tipping_bucket_raingauge-t-15_min-mm,
2024-05-01T12:30:00Z,http://environment.data.gov.uk/flood-monitoring/id/measures/E7050-rainfall-tipping_bucket_raingauge-t-15_min-mm,48.2
2024-05-01T12:15:00Z,http://environment.data.gov.uk/flood-monitoring/id/measures/E7050-rainfall-tipping_bucket_raingauge-t-15_min-mm,0.6
2024-05-01T12:00:00Z,http://environment.data.gov.uk/flood-monitoring/id/measures/E7050-rainfall-tipping_bucket_raingauge-t-15_min-mm,0.2
"
}

/// Same gauge as JSON, four items, newest first. The 12:45 item carries an
/// array value, as the API does for rows it could not reconcile.
#[cfg(test)]
pub(crate) fn fixture_ea_readings_json() -> &'static str {
    r#"{
      "@context": "http://environment.data.gov.uk/flood-monitoring/meta/context.jsonld",
      "meta": {
        "publisher": "Environment Agency",
        "licence": "http://www.nationalarchives.gov.uk/doc/open-government-licence/version/3/",
        "version": "0.9",
        "limit": 10000,
        "hasFormat": []
      },
      "items": [
        {
          "@id": "http://environment.data.gov.uk/flood-monitoring/data/readings/E7050-rainfall-tipping_bucket_raingauge-t-15_min-mm/2024-05-01T12-45-00Z",
          "dateTime": "2024-05-01T12:45:00Z",
          "measure": "http://environment.data.gov.uk/flood-monitoring/id/measures/E7050-rainfall-tipping_bucket_raingauge-t-15_min-mm",
          "value": [0.0, 0.2]
        },
        {
          "@id": "http://environment.data.gov.uk/flood-monitoring/data/readings/E7050-rainfall-tipping_bucket_raingauge-t-15_min-mm/2024-05-01T12-30-00Z",
          "dateTime": "2024-05-01T12:30:00Z",
          "measure": "http://environment.data.gov.uk/flood-monitoring/id/measures/E7050-rainfall-tipping_bucket_raingauge-t-15_min-mm",
          "value": 48.2
        },
        {
          "@id": "http://environment.data.gov.uk/flood-monitoring/data/readings/E7050-rainfall-tipping_bucket_raingauge-t-15_min-mm/2024-05-01T12-15-00Z",
          "dateTime": "2024-05-01T12:15:00Z",
          "measure": "http://environment.data.gov.uk/flood-monitoring/id/measures/E7050-rainfall-tipping_bucket_raingauge-t-15_min-mm",
          "value": 0.6
        },
        {
          "@id": "http://environment.data.gov.uk/flood-monitoring/data/readings/E7050-rainfall-tipping_bucket_raingauge-t-15_min-mm/2024-05-01T12-00-00Z",
          "dateTime": "2024-05-01T12:00:00Z",
          "measure": "http://environment.data.gov.uk/flood-monitoring/id/measures/E7050-rainfall-tipping_bucket_raingauge-t-15_min-mm",
          "value": 0.2
        }
      ]
    }"#
}

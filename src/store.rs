/// Flat-file storage for per-station documents.
///
/// Each station's `StationRecord` lives in `<data_dir>/<station_id>.json`,
/// pretty-printed so it can be served or inspected as-is. Writes go to a
/// sibling `.tmp` file first and are renamed into place, so a reader never
/// sees a half-written document.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::model::StationRecord;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Station ids become file names, so only `[A-Za-z0-9_-]` is accepted.
    #[error("invalid station id {0:?}")]
    InvalidStationId(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed station document {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

pub fn is_valid_station_id(station_id: &str) -> bool {
    !station_id.is_empty()
        && station_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(io_error(&root))?;
        Ok(Self { root })
    }

    fn path_for(&self, station_id: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_station_id(station_id) {
            return Err(StoreError::InvalidStationId(station_id.to_string()));
        }
        Ok(self.root.join(format!("{}.json", station_id)))
    }

    /// Writes the record, replacing any previous document for the station.
    pub fn save(&self, record: &StationRecord) -> Result<PathBuf, StoreError> {
        let path = self.path_for(&record.station_id)?;
        let tmp = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(record).map_err(|source| StoreError::Json {
            path: path.display().to_string(),
            source,
        })?;

        fs::write(&tmp, json).map_err(io_error(&tmp))?;
        fs::rename(&tmp, &path).map_err(io_error(&path))?;

        log::debug!("saved {} readings to {}", record.readings.len(), path.display());
        Ok(path)
    }

    /// Reads a station's document, or `None` if it has never been saved.
    pub fn load(&self, station_id: &str) -> Result<Option<StationRecord>, StoreError> {
        let path = self.path_for(station_id)?;

        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path)(e)),
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| StoreError::Json {
                path: path.display().to_string(),
                source,
            })
    }

    /// Station ids with a stored document, sorted.
    pub fn list_stations(&self) -> Result<Vec<String>, StoreError> {
        let mut stations = Vec::new();

        for entry in fs::read_dir(&self.root).map_err(io_error(&self.root))? {
            let entry = entry.map_err(io_error(&self.root))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if is_valid_station_id(stem) {
                    stations.push(stem.to_string());
                }
            }
        }

        stations.sort();
        Ok(stations)
    }
}

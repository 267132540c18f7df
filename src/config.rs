/// Service configuration loader - parses rainmon.toml
///
/// Keeps the outlier engine's tuning (threshold, window size, whether to
/// correct at all) and the service's paths out of the code, so they can be
/// adjusted per deployment without recompiling.
///
/// ```toml
/// data_dir = "data"
/// lookback_hours = 24
///
/// [outliers]
/// threshold = 25.0
/// auto_correct = true
/// window_size = 5
/// ```

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::model::ConfigError;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "rainmon.toml";

/// Environment variable that overrides `DEFAULT_CONFIG_PATH`.
pub const CONFIG_PATH_ENV: &str = "RAINMON_CONFIG";

/// Environment Agency flood-monitoring API root.
pub const DEFAULT_EA_BASE_URL: &str = "https://environment.data.gov.uk/flood-monitoring";

// ---------------------------------------------------------------------------
// Outlier engine configuration
// ---------------------------------------------------------------------------

/// Tuning for `analysis::outliers::detect_and_correct`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Maximum plausible rainfall for a single reading interval, in mm.
    pub threshold: f64,
    /// When false, outliers are reported but the series is left untouched.
    pub auto_correct: bool,
    /// Positions on each side of an outlier considered for the local median.
    pub window_size: usize,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            threshold: 25.0,
            auto_correct: true,
            window_size: 5,
        }
    }
}

impl OutlierConfig {
    /// Rejects a threshold that is not a positive finite number and a zero
    /// window.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        if self.window_size < 1 {
            return Err(ConfigError::InvalidWindowSize(self.window_size));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Service configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Directory holding one `<station>.json` document per station.
    pub data_dir: PathBuf,
    pub ea_base_url: String,
    /// How far back `fetch` asks the EA API for readings.
    pub lookback_hours: i64,
    /// Worker threads used when processing several stations at once.
    pub workers: usize,
    pub outliers: OutlierConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            ea_base_url: DEFAULT_EA_BASE_URL.to_string(),
            lookback_hours: 24,
            workers: 4,
            outliers: OutlierConfig::default(),
        }
    }
}

/// Start of a fetch window `hours` before `now`.
///
/// `None` for a negative span or one chrono cannot represent.
pub fn lookback_start(now: DateTime<Utc>, hours: i64) -> Option<DateTime<Utc>> {
    if hours < 0 {
        return None;
    }
    now.checked_sub_signed(TimeDelta::try_hours(hours)?)
}

/// Parses a configuration document and validates the outlier section.
pub fn parse_config(contents: &str, origin: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = toml::from_str(contents).map_err(|e| ConfigError::Parse {
        path: origin.to_string(),
        message: e.to_string(),
    })?;
    config.outliers.validate()?;
    Ok(config)
}

/// Loads configuration from `path`.
///
/// A missing file is not an error: the service runs on defaults. Anything
/// else that stops the file being read or parsed is.
pub fn load_config_from(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let origin = path.display().to_string();
    match fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents, &origin),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("{} not found, using default configuration", origin);
            Ok(ServiceConfig::default())
        }
        Err(source) => Err(ConfigError::Read { path: origin, source }),
    }
}

/// Resolves the configuration path (explicit argument, then `RAINMON_CONFIG`
/// from the environment or `.env`, then `rainmon.toml`) and loads it.
pub fn load_config(explicit: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    dotenv::dotenv().ok();

    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH)),
    };

    load_config_from(&path)
}

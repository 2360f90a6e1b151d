//! Panel configuration.
//!
//! Settings come from `eclipse.toml` and are then overridden by environment
//! variables. Every section is optional.
//!
//! ```toml
//! [event]
//! date = "2024-04-08"
//!
//! [viewport]
//! threshold = { kind = "max-scale", value = 1000000.0 }
//! stationary_quiet_ms = 250
//! point_resolution = "first-feature"
//!
//! [dataset]
//! source = "data/city-times.json"
//!
//! [[layers]]
//! id = "penumbra"
//! title = "Penumbra"
//! kind = "geo-json"
//! source = { type = "file", path = "data/penumbra.geojson" }
//! ```

use chrono::FixedOffset;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::layers::catalog::default_specs;
use crate::layers::LayerSpec;
use crate::models::EventDate;
use crate::services::dataset::{DatasetSource, RetryPolicy};
use crate::services::display::PanelZone;
use crate::services::query::PointResolution;
use crate::services::viewport_cycle::DetailThreshold;

/// Config file name searched by [`PanelConfig::from_default_location`].
pub const CONFIG_FILE_NAME: &str = "eclipse.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("No eclipse.toml found in standard locations")]
    NotFound,

    #[error("Invalid value '{value}' for {key}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("UTC offset of {0} minutes is out of range")]
    OffsetOutOfRange(i32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    #[serde(default)]
    pub event: EventSettings,
    #[serde(default)]
    pub viewport: ViewportSettings,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default)]
    pub dataset: DatasetSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default = "default_specs")]
    pub layers: Vec<LayerSpec>,
    /// Directory relative file paths resolve against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventSettings {
    #[serde(default)]
    pub date: EventDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewportSettings {
    #[serde(default)]
    pub threshold: DetailThreshold,
    #[serde(default = "default_stationary_quiet_ms")]
    pub stationary_quiet_ms: u64,
    #[serde(default)]
    pub point_resolution: PointResolution,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplaySettings {
    /// IANA zone for read-outs, e.g. "America/Chicago"; host zone when unset.
    #[serde(default)]
    pub timezone: Option<String>,
    /// Fixed offset for read-outs; wins over `timezone`.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSettings {
    #[serde(default = "default_dataset_source")]
    pub source: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_timeout_sec")]
    pub timeout_sec: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_stationary_quiet_ms() -> u64 {
    250
}

fn default_dataset_source() -> String {
    "data/city-times.json".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    100
}

fn default_timeout_sec() -> u64 {
    20
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            threshold: DetailThreshold::default(),
            stationary_quiet_ms: default_stationary_quiet_ms(),
            point_resolution: PointResolution::default(),
        }
    }
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            source: default_dataset_source(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_sec: default_timeout_sec(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            event: EventSettings::default(),
            viewport: ViewportSettings::default(),
            display: DisplaySettings::default(),
            dataset: DatasetSettings::default(),
            server: ServerSettings::default(),
            layers: default_specs(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl PanelConfig {
    /// Load configuration from a TOML file. Relative paths in it resolve
    /// against the file's directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config: PanelConfig = toml::from_str(&content)?;
        config.base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(config)
    }

    /// Search `eclipse.toml` in the current directory, `backend/`, then the parent.
    pub fn from_default_location() -> Result<Self, ConfigError> {
        let search_paths = [
            PathBuf::from(CONFIG_FILE_NAME),
            Path::new("backend").join(CONFIG_FILE_NAME),
            Path::new("..").join(CONFIG_FILE_NAME),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }
        Err(ConfigError::NotFound)
    }

    /// Default-location file (or built-in defaults), then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::from_default_location() {
            Ok(config) => config,
            Err(ConfigError::NotFound) => {
                log::info!("No {} found, using defaults", CONFIG_FILE_NAME);
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Apply environment overrides.
    ///
    /// # Environment Variables
    /// - `ECLIPSE_DATE`: Event date, `YYYY-MM-DD`
    /// - `ECLIPSE_DATASET`: Dataset URL or path
    /// - `ECLIPSE_MAX_SCALE`: Detail threshold as a maximum scale denominator
    /// - `ECLIPSE_MIN_ZOOM`: Detail threshold as a minimum zoom level (wins over max scale)
    /// - `ECLIPSE_TIMEZONE`: Read-out IANA timezone
    /// - `ECLIPSE_UTC_OFFSET_MINUTES`: Read-out fixed offset (wins over the timezone)
    /// - `HOST`, `PORT`: Server bind address
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(date) = env_parse("ECLIPSE_DATE")? {
            self.event.date = date;
        }
        if let Ok(source) = env::var("ECLIPSE_DATASET") {
            self.dataset.source = source;
        }
        if let Some(scale) = env_parse("ECLIPSE_MAX_SCALE")? {
            self.viewport.threshold = DetailThreshold::MaxScale(scale);
        }
        if let Some(zoom) = env_parse("ECLIPSE_MIN_ZOOM")? {
            self.viewport.threshold = DetailThreshold::MinZoom(zoom);
        }
        if let Ok(timezone) = env::var("ECLIPSE_TIMEZONE") {
            self.display.timezone = Some(timezone);
        }
        if let Some(minutes) = env_parse("ECLIPSE_UTC_OFFSET_MINUTES")? {
            self.display.utc_offset_minutes = Some(minutes);
        }
        if let Ok(host) = env::var("HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_parse("PORT")? {
            self.server.port = port;
        }
        Ok(())
    }

    /// Timezone read-outs are rendered in: the fixed offset, else the named
    /// zone, else the host zone.
    pub fn panel_zone(&self) -> Result<PanelZone, ConfigError> {
        if let Some(minutes) = self.display.utc_offset_minutes {
            return FixedOffset::east_opt(minutes.saturating_mul(60))
                .map(PanelZone::Fixed)
                .ok_or(ConfigError::OffsetOutOfRange(minutes));
        }
        match &self.display.timezone {
            Some(name) => name
                .trim()
                .parse::<Tz>()
                .map(PanelZone::Named)
                .map_err(|_| ConfigError::UnknownTimezone(name.clone())),
            None => Ok(PanelZone::host()),
        }
    }

    pub fn dataset_source(&self) -> DatasetSource {
        match self.dataset.source.parse() {
            Ok(source) => source,
            Err(never) => match never {},
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.dataset.max_retries,
            initial_delay: Duration::from_millis(self.dataset.retry_delay_ms),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.dataset.timeout_sec)
    }

    pub fn stationary_quiet(&self) -> Duration {
        Duration::from_millis(self.viewport.stationary_quiet_ms)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn env_parse<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { key, value }),
        Err(_) => Ok(None),
    }
}

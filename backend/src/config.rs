//! Service configuration.
//!
//! Settings come from an optional `lifeflight.toml` file, then environment
//! variables override individual values:
//!
//! - `HOST`, `PORT`: bind address (default `0.0.0.0:5000`)
//! - `MISSION_LOG_PATH`: mission log CSV (default `data/data.csv`)
//! - `CITY_COORDINATES_PATH`: coordinate JSON (default `data/city_coordinates.json`)
//! - `CLOSURE_EVENTS_PATH`: hospital-closure catalog CSV (optional)
//! - `WEATHER_PATH`: monthly weather CSV (optional)
//! - `APP_ENV` (or `FLASK_ENV`): `development` | `production` | `testing`

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Configuration loading failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Deployment profile, selecting defaults such as log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Testing,
}

impl Environment {
    /// Default `tracing` filter directive for this profile.
    pub fn default_log_filter(self) -> &'static str {
        match self {
            Environment::Development | Environment::Testing => "debug",
            Environment::Production => "info",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" | "default" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            "testing" | "test" => Ok(Environment::Testing),
            other => Err(format!(
                "unknown environment '{}'. Use development, production or testing.",
                other
            )),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Testing => "testing",
        };
        f.write_str(name)
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub data: DataSources,
    #[serde(default)]
    pub heatmap: HeatmapSettings,
}

/// HTTP bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

/// Locations of the input files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSources {
    #[serde(default = "default_mission_log")]
    pub mission_log: PathBuf,
    #[serde(default = "default_city_coordinates")]
    pub city_coordinates: PathBuf,
    /// Hospital-closure catalog for the event-impact view.
    #[serde(default)]
    pub closure_events: Option<PathBuf>,
    /// Monthly weather table for the weather-risk view.
    #[serde(default)]
    pub weather: Option<PathBuf>,
}

impl Default for DataSources {
    fn default() -> Self {
        Self::new(default_mission_log(), default_city_coordinates())
    }
}

impl DataSources {
    /// The two required files, without closure events or weather.
    pub fn new(mission_log: impl Into<PathBuf>, city_coordinates: impl Into<PathBuf>) -> Self {
        Self {
            mission_log: mission_log.into(),
            city_coordinates: city_coordinates.into(),
            closure_events: None,
            weather: None,
        }
    }

    pub fn with_closure_events(mut self, path: impl Into<PathBuf>) -> Self {
        self.closure_events = Some(path.into());
        self
    }

    pub fn with_weather(mut self, path: impl Into<PathBuf>) -> Self {
        self.weather = Some(path.into());
        self
    }

    /// Resolve relative paths against `base` (typically the config file's
    /// directory).
    pub fn relative_to(mut self, base: &Path) -> Self {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        resolve(&mut self.mission_log);
        resolve(&mut self.city_coordinates);
        self.closure_events.iter_mut().for_each(resolve);
        self.weather.iter_mut().for_each(resolve);
        self
    }
}

fn default_mission_log() -> PathBuf {
    PathBuf::from("data/data.csv")
}

fn default_city_coordinates() -> PathBuf {
    PathBuf::from("data/city_coordinates.json")
}

/// Rendering defaults for the HTML heatmap document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapSettings {
    #[serde(default = "default_zoom_start")]
    pub zoom_start: u8,
    #[serde(default = "default_radius")]
    pub radius: u32,
    /// Map centre used when there are no points to average.
    #[serde(default = "default_center")]
    pub default_center: [f64; 2],
}

impl Default for HeatmapSettings {
    fn default() -> Self {
        Self {
            zoom_start: default_zoom_start(),
            radius: default_radius(),
            default_center: default_center(),
        }
    }
}

fn default_zoom_start() -> u8 {
    6
}

fn default_radius() -> u32 {
    10
}

fn default_center() -> [f64; 2] {
    [45.25, -69.0]
}

impl AppConfig {
    /// Load configuration from a TOML file. Relative data paths are resolved
    /// against the file's directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config: AppConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            config.data = config.data.relative_to(base);
        }
        Ok(config)
    }

    /// Load configuration from the first `lifeflight.toml` found in the
    /// standard locations, or defaults when there is none.
    ///
    /// Searches, in order:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, ConfigError> {
        let search_paths = [
            PathBuf::from("lifeflight.toml"),
            PathBuf::from("backend/lifeflight.toml"),
            PathBuf::from("../lifeflight.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Apply environment variable overrides.
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(host) = env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".to_string(),
                message: format!("'{}' is not a valid port number", port),
            })?;
        }
        if let Ok(path) = env::var("MISSION_LOG_PATH") {
            self.data.mission_log = PathBuf::from(path);
        }
        if let Ok(path) = env::var("CITY_COORDINATES_PATH") {
            self.data.city_coordinates = PathBuf::from(path);
        }
        if let Ok(path) = env::var("CLOSURE_EVENTS_PATH") {
            self.data.closure_events = Some(PathBuf::from(path));
        }
        if let Ok(path) = env::var("WEATHER_PATH") {
            self.data.weather = Some(PathBuf::from(path));
        }

        let profile = env::var("APP_ENV").or_else(|_| env::var("FLASK_ENV"));
        if let Ok(profile) = profile {
            self.environment = profile
                .parse()
                .map_err(|message| ConfigError::InvalidValue {
                    key: "APP_ENV".to_string(),
                    message,
                })?;
        }

        Ok(self)
    }

    /// Default-location file plus environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_default_location()?.apply_env()
    }
}

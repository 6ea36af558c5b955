use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::spots::SpotNames;
use crate::types::Spot;

pub const SURFLINE_API_URL: &str = "https://services.surfline.com";

/// Attempts per spot before its outcome is reported as a failure.
pub const MAX_FETCH_ATTEMPTS: u32 = 3;

/// Fixed pause between attempts for the same spot (seconds).
pub const RETRY_DELAY_SECS: u64 = 5;

/// Lookahead window requested from the provider (days).
pub const DEFAULT_FORECAST_DAYS: u32 = 5;

/// Sampling interval requested from the provider (hours).
pub const DEFAULT_INTERVAL_HOURS: u32 = 1;

/// Timeout applied to every forecast provider request.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

pub const CONFIG_FILE_NAME: &str = "config.yaml";
pub const SECRETS_FILE_NAME: &str = "secrets.txt";

#[derive(Debug, Clone, Deserialize)]
pub struct InfluxConfig {
    pub url: String,
    pub org: String,
    pub bucket: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    pub days: u32,
    pub interval_hours: u32,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            days: DEFAULT_FORECAST_DAYS,
            interval_hours: DEFAULT_INTERVAL_HOURS,
        }
    }
}

/// On-disk layout of `config.yaml`.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    influxdb: InfluxConfig,
    /// User-facing label -> provider spot id.
    spots: BTreeMap<String, String>,
    /// Optional spot id -> display name overrides.
    #[serde(default)]
    names: HashMap<String, String>,
    #[serde(default)]
    forecast: ForecastSettings,
}

#[derive(Clone)]
pub struct Config {
    pub influxdb: InfluxConfig,
    /// Write token, read from the secrets file. Never logged.
    pub influx_token: String,
    pub surfline_api_url: String,
    pub log_level: String,
    pub forecast: ForecastSettings,
    /// Distinct spots to poll, ordered by id, names already resolved.
    pub spots: Vec<Spot>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("influxdb", &self.influxdb)
            .field("influx_token", &"<redacted>")
            .field("surfline_api_url", &self.surfline_api_url)
            .field("log_level", &self.log_level)
            .field("forecast", &self.forecast)
            .field("spots", &self.spots)
            .finish()
    }
}

impl Config {
    /// Load `config.yaml` and `secrets.txt`, by default from the executable's directory.
    /// CONFIG_PATH and SECRETS_PATH override the file locations.
    pub fn from_env() -> Result<Self> {
        let config_path = env_path("CONFIG_PATH", CONFIG_FILE_NAME)?;
        let secrets_path = env_path("SECRETS_PATH", SECRETS_FILE_NAME)?;

        let yaml = read_file(&config_path, "config")?;
        let token = read_file(&secrets_path, "secrets")?;

        let mut cfg = Self::from_parts(&yaml, &token)?;
        if let Ok(url) = std::env::var("SURFLINE_API_URL") {
            cfg.surfline_api_url = url;
        }
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            cfg.log_level = level;
        }
        Ok(cfg)
    }

    /// Build a config from the YAML document and the raw credential file contents.
    pub fn from_parts(yaml: &str, token: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(yaml)?;

        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::Config("secrets file is empty".to_string()));
        }
        for (key, value) in [
            ("influxdb.url", &file.influxdb.url),
            ("influxdb.org", &file.influxdb.org),
            ("influxdb.bucket", &file.influxdb.bucket),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Config(format!("{key} must not be empty")));
            }
        }
        if file.forecast.days == 0 || file.forecast.interval_hours == 0 {
            return Err(AppError::Config(
                "forecast.days and forecast.interval_hours must be at least 1".to_string(),
            ));
        }
        if file.spots.is_empty() {
            return Err(AppError::Config("no spots configured".to_string()));
        }
        if let Some((label, _)) = file.spots.iter().find(|(_, id)| id.trim().is_empty()) {
            return Err(AppError::Config(format!("spot '{label}' has an empty id")));
        }

        // Explicit names win; otherwise the first label (in label order) names the spot.
        let mut names = file.names;
        for (label, id) in &file.spots {
            names.entry(id.trim().to_string()).or_insert_with(|| label.clone());
        }
        let spot_names = SpotNames::new(names);

        let ids: BTreeSet<&str> = file.spots.values().map(|id| id.trim()).collect();
        let spots = ids.into_iter().map(|id| spot_names.spot(id)).collect();

        Ok(Self {
            influxdb: file.influxdb,
            influx_token: token.to_string(),
            surfline_api_url: SURFLINE_API_URL.to_string(),
            log_level: "info".to_string(),
            forecast: file.forecast,
            spots,
        })
    }
}

fn env_path(var: &str, file_name: &str) -> Result<PathBuf> {
    if let Ok(path) = std::env::var(var) {
        return Ok(PathBuf::from(path));
    }
    let exe = std::env::current_exe()?;
    let dir = exe
        .parent()
        .ok_or_else(|| AppError::Config(format!("cannot resolve directory of {}", exe.display())))?;
    Ok(dir.join(file_name))
}

fn read_file(path: &Path, what: &str) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        AppError::Config(format!("failed to read {what} file {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
influxdb:
  url: http://localhost:8086
  org: surf
  bucket: forecasts
spots:
  pacific_beach: 5842041f4e65fad6a7708841
  windansea: 5842041f4e65fad6a770883c
"#;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let cfg = Config::from_parts(YAML, "tok\n").unwrap();
        assert_eq!(cfg.influxdb.url, "http://localhost:8086");
        assert_eq!(cfg.influxdb.org, "surf");
        assert_eq!(cfg.influxdb.bucket, "forecasts");
        assert_eq!(cfg.influx_token, "tok");
        assert_eq!(cfg.forecast.days, DEFAULT_FORECAST_DAYS);
        assert_eq!(cfg.forecast.interval_hours, DEFAULT_INTERVAL_HOURS);
        assert_eq!(cfg.surfline_api_url, SURFLINE_API_URL);
        assert_eq!(cfg.spots.len(), 2);
    }

    fn name_of<'a>(cfg: &'a Config, id: &str) -> &'a str {
        cfg.spots.iter().find(|s| s.id == id).map(|s| s.name.as_str()).unwrap()
    }

    #[test]
    fn labels_name_spots_unless_overridden() {
        let yaml = format!("{YAML}names:\n  5842041f4e65fad6a7708841: Pacific Beach\n");
        let cfg = Config::from_parts(&yaml, "tok").unwrap();
        assert_eq!(name_of(&cfg, "5842041f4e65fad6a7708841"), "Pacific Beach");
        assert_eq!(name_of(&cfg, "5842041f4e65fad6a770883c"), "windansea");
    }

    #[test]
    fn duplicate_spot_ids_are_polled_once() {
        let yaml = format!("{YAML}  pb_again: 5842041f4e65fad6a7708841\n");
        let cfg = Config::from_parts(&yaml, "tok").unwrap();
        assert_eq!(cfg.spots.len(), 2);
        assert_eq!(name_of(&cfg, "5842041f4e65fad6a7708841"), "pacific_beach");
    }

    #[test]
    fn forecast_settings_override_defaults() {
        let yaml = format!("{YAML}forecast:\n  days: 3\n");
        let cfg = Config::from_parts(&yaml, "tok").unwrap();
        assert_eq!(cfg.forecast.days, 3);
        assert_eq!(cfg.forecast.interval_hours, DEFAULT_INTERVAL_HOURS);
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(matches!(Config::from_parts(YAML, "  \n"), Err(AppError::Config(_))));
    }

    #[test]
    fn missing_influx_section_is_rejected() {
        let yaml = "spots:\n  pb: abc\n";
        assert!(matches!(Config::from_parts(yaml, "tok"), Err(AppError::Yaml(_))));
    }

    #[test]
    fn no_spots_is_rejected() {
        let yaml = "influxdb:\n  url: u\n  org: o\n  bucket: b\nspots: {}\n";
        assert!(matches!(Config::from_parts(yaml, "tok"), Err(AppError::Config(_))));
    }

    #[test]
    fn debug_output_redacts_token() {
        let cfg = Config::from_parts(YAML, "super-secret").unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("super-secret"));
    }
}

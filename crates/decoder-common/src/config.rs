//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Shared primitives and utilities for the DECODER tools."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds, DurationSeconds};
use tracing::debug;
use url::Url;

use crate::console::ColorMode;
use crate::logging::LogFormat;

fn default_base_url() -> String {
    "http://localhost:8080".to_owned()
}

fn default_health_timeout() -> Duration {
    Duration::from_secs(2)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_readings_per_sensor() -> usize {
    10
}

fn default_submit_delay() -> Duration {
    Duration::from_millis(100)
}

fn default_base_min() -> f64 {
    40.0
}

fn default_base_max() -> f64 {
    80.0
}

fn default_variance() -> f64 {
    15.0
}

fn default_trend() -> f64 {
    1.0
}

fn default_window_minutes() -> u32 {
    60
}

fn default_alert_threshold() -> f64 {
    100.0
}

fn default_seed_pause() -> Duration {
    Duration::from_millis(500)
}

fn default_run_all_pause() -> Duration {
    Duration::from_secs(1)
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

/// Built-in building/sensor registry used when the configuration does not
/// provide one.
pub fn default_registry() -> Vec<BuildingSpec> {
    vec![
        BuildingSpec::new(1, "Building A", &["sensor-001", "sensor-002", "sensor-003"]),
        BuildingSpec::new(2, "Building B", &["sensor-004", "sensor-005"]),
        BuildingSpec::new(3, "Building C", &["sensor-006", "sensor-007", "sensor-008"]),
    ]
}

/// Primary configuration object shared by the generator and the harness.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub harness: HarnessConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata describing where a [`ToolConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedToolConfig {
    pub config: ToolConfig,
    /// `None` when no file was found and built-in defaults are in effect.
    pub source: Option<PathBuf>,
}

impl ToolConfig {
    pub const ENV_CONFIG_PATH: &'static str = "DECODER_CONFIG";
    /// Files probed, in order, when no explicit path is given.
    pub const DEFAULT_CANDIDATES: [&'static str; 2] = ["configs/decoder.toml", "decoder.toml"];

    /// Load for a command line tool. `DECODER_CONFIG` wins; otherwise an
    /// explicit `--config` path must exist, and without one the default
    /// candidates are probed.
    pub fn load_for_cli(explicit: Option<&Path>) -> Result<LoadedToolConfig> {
        let env_path = std::env::var(Self::ENV_CONFIG_PATH).ok();
        Self::load_for_cli_with_env(explicit, env_path.as_deref())
    }

    fn load_for_cli_with_env(
        explicit: Option<&Path>,
        env_path: Option<&str>,
    ) -> Result<LoadedToolConfig> {
        if let Some(env_path) = env_path.filter(|path| !path.trim().is_empty()) {
            let path = PathBuf::from(env_path);
            let config = Self::from_path(&path)?;
            return Ok(LoadedToolConfig {
                config,
                source: Some(path),
            });
        }
        match explicit {
            Some(path) if !path.exists() => {
                Err(anyhow!("config file {} does not exist", path.display()))
            }
            Some(path) => Self::load_with_source(&[path]),
            None => Self::load_with_source(&Self::DEFAULT_CANDIDATES),
        }
    }

    /// Load configuration together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedToolConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedToolConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(&path)?;
                return Ok(LoadedToolConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        debug!("no configuration file found, using built-in defaults");
        Ok(LoadedToolConfig {
            config: ToolConfig::default(),
            source: None,
        })
    }

    fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<ToolConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.api.validate()?;
        self.generator.validate()?;
        self.harness.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for ToolConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: ToolConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// Target API location and per-call timeouts.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_health_timeout")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub health_timeout: Duration,
    #[serde(default = "default_request_timeout")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            health_timeout: default_health_timeout(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    /// Parse the configured base URL.
    pub fn url(&self) -> Result<Url> {
        let url = Url::parse(self.base_url.trim())
            .with_context(|| format!("invalid api base_url '{}'", self.base_url))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(anyhow!(
                "api base_url must use http or https, got '{}'",
                other
            )),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.url()?;
        if self.health_timeout.is_zero() || self.request_timeout.is_zero() {
            return Err(anyhow!("api timeouts must be greater than zero"));
        }
        Ok(())
    }
}

/// One entry of the building/sensor registry driving the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingSpec {
    pub id: i64,
    pub name: String,
    pub sensors: Vec<String>,
}

impl BuildingSpec {
    pub fn new(id: i64, name: &str, sensors: &[&str]) -> Self {
        Self {
            id,
            name: name.to_owned(),
            sensors: sensors.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_readings_per_sensor")]
    pub readings_per_sensor: usize,
    #[serde(default = "default_submit_delay")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub submit_delay: Duration,
    #[serde(default = "default_base_min")]
    pub base_min: f64,
    #[serde(default = "default_base_max")]
    pub base_max: f64,
    #[serde(default = "default_variance")]
    pub variance: f64,
    /// Half-width of the per-reading trend range.
    #[serde(default = "default_trend")]
    pub trend: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_registry")]
    pub buildings: Vec<BuildingSpec>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            readings_per_sensor: default_readings_per_sensor(),
            submit_delay: default_submit_delay(),
            base_min: default_base_min(),
            base_max: default_base_max(),
            variance: default_variance(),
            trend: default_trend(),
            seed: None,
            buildings: default_registry(),
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.readings_per_sensor == 0 {
            return Err(anyhow!("generator readings_per_sensor must be greater than zero"));
        }
        if !(self.base_min.is_finite() && self.base_max.is_finite()) || self.base_min > self.base_max
        {
            return Err(anyhow!(
                "generator base range [{}, {}] is invalid",
                self.base_min,
                self.base_max
            ));
        }
        if !self.variance.is_finite() || self.variance < 0.0 {
            return Err(anyhow!("generator variance must be a non-negative number"));
        }
        if !self.trend.is_finite() || self.trend < 0.0 {
            return Err(anyhow!("generator trend must be a non-negative number"));
        }
        for building in &self.buildings {
            if building.sensors.is_empty() {
                return Err(anyhow!(
                    "building {} ('{}') must declare at least one sensor",
                    building.id,
                    building.name
                ));
            }
        }
        Ok(())
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Window passed as `minutes` to the last-readings and forecast endpoints.
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u32,
    /// Alert threshold the API is expected to apply; used for local reporting.
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: f64,
    #[serde(default)]
    pub color: ColorMode,
    #[serde(default = "default_seed_pause")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub seed_pause: Duration,
    #[serde(default = "default_run_all_pause")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub run_all_pause: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            window_minutes: default_window_minutes(),
            alert_threshold: default_alert_threshold(),
            color: ColorMode::default(),
            seed_pause: default_seed_pause(),
            run_all_pause: default_run_all_pause(),
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window_minutes == 0 {
            return Err(anyhow!("harness window_minutes must be greater than zero"));
        }
        if !self.alert_threshold.is_finite() {
            return Err(anyhow!("harness alert_threshold must be a finite number"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for rolling JSON log files; stderr only when unset.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_document_yields_defaults() {
        let config: ToolConfig = "".parse().unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.api.health_timeout, Duration::from_secs(2));
        assert_eq!(config.api.request_timeout, Duration::from_secs(5));
        assert_eq!(config.generator.readings_per_sensor, 10);
        assert_eq!(config.generator.submit_delay, Duration::from_millis(100));
        assert_eq!(config.generator.buildings, default_registry());
        assert_eq!(config.harness.window_minutes, 60);
        assert_eq!(config.harness.color, ColorMode::Auto);
    }

    #[test]
    fn default_registry_matches_fixed_buildings() {
        let registry = default_registry();
        let ids: Vec<i64> = registry.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        let sensors: usize = registry.iter().map(|b| b.sensors.len()).sum();
        assert_eq!(sensors, 8);
        assert_eq!(registry[1].sensors, vec!["sensor-004", "sensor-005"]);
    }

    #[test]
    fn parses_sections_and_custom_registry() {
        let config: ToolConfig = r#"
            [api]
            base_url = "https://decoder.example:9443"
            request_timeout = 10

            [generator]
            readings_per_sensor = 3
            submit_delay = 0
            seed = 7

            [[generator.buildings]]
            id = 42
            name = "Depot"
            sensors = ["sensor-x"]

            [harness]
            color = "never"
            alert_threshold = 250.0
        "#
        .parse()
        .unwrap();
        assert_eq!(config.api.url().unwrap().host_str(), Some("decoder.example"));
        assert_eq!(config.api.request_timeout, Duration::from_secs(10));
        assert_eq!(config.generator.readings_per_sensor, 3);
        assert!(config.generator.submit_delay.is_zero());
        assert_eq!(config.generator.seed, Some(7));
        assert_eq!(config.generator.buildings.len(), 1);
        assert_eq!(config.generator.buildings[0].name, "Depot");
        assert_eq!(config.harness.color, ColorMode::Never);
        assert_eq!(config.harness.alert_threshold, 250.0);
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = "[api]\nbase_url = \"ftp://localhost\"\n"
            .parse::<ToolConfig>()
            .unwrap_err();
        assert!(err.to_string().contains("http"));
    }

    #[test]
    fn rejects_inverted_base_range() {
        let err = "[generator]\nbase_min = 90.0\nbase_max = 10.0\n"
            .parse::<ToolConfig>()
            .unwrap_err();
        assert!(err.to_string().contains("base range"));
    }

    #[test]
    fn rejects_building_without_sensors() {
        let err = "[[generator.buildings]]\nid = 1\nname = \"Empty\"\nsensors = []\n"
            .parse::<ToolConfig>()
            .unwrap_err();
        assert!(err.to_string().contains("at least one sensor"));
    }

    #[test]
    fn load_prefers_first_existing_candidate() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nbase_url = \"http://10.0.0.5:8080\"").unwrap();
        let missing = PathBuf::from("definitely/not/here.toml");
        let loaded =
            ToolConfig::load_with_source(&[missing, file.path().to_path_buf()]).unwrap();
        assert_eq!(loaded.source.as_deref(), Some(file.path()));
        assert_eq!(loaded.config.api.base_url, "http://10.0.0.5:8080");
    }

    #[test]
    fn load_without_candidates_uses_defaults() {
        let loaded = ToolConfig::load_with_source(&["definitely/not/here.toml"]).unwrap();
        assert!(loaded.source.is_none());
        assert_eq!(loaded.config.api.base_url, default_base_url());
    }

    #[test]
    fn explicit_cli_path_must_exist() {
        let err = ToolConfig::load_for_cli_with_env(Some(Path::new("missing/decoder.toml")), None)
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn env_config_wins_over_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nbase_url = \"http://10.0.0.9:8080\"").unwrap();
        let env_path = file.path().to_string_lossy().into_owned();

        let loaded = ToolConfig::load_for_cli_with_env(
            Some(Path::new("missing/decoder.toml")),
            Some(&env_path),
        )
        .unwrap();
        assert_eq!(loaded.source.as_deref(), Some(file.path()));
        assert_eq!(loaded.config.api.base_url, "http://10.0.0.9:8080");

        let blank = ToolConfig::load_for_cli_with_env(Some(Path::new("missing/decoder.toml")), Some("  "));
        assert!(blank.is_err());
    }

    #[test]
    fn shipped_config_parses() {
        let config: ToolConfig = include_str!("../../../configs/decoder.toml").parse().unwrap();
        assert_eq!(config.generator.buildings, default_registry());
        assert_eq!(config.harness.run_all_pause, Duration::from_secs(1));
    }
}

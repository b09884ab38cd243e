//! Configuration management for pv-dashboard.
//!
//! The configuration is a YAML file with two sections: `viewer` (HTTP
//! server, charts, log files, telemetry source) and `ahoy` (the inverter
//! stack: radio, message bus, time-series sink, inverter list and polling
//! interval). Unlike most settings a missing or malformed file is fatal.

use crate::cli::{Args, ConfigFormat};
use crate::record::ValueField;
use crate::store::LogNaming;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

// Default configuration constants
pub const DEFAULT_CONFIG_PATH: &str = "ahoy.yml";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5006;
pub const DEFAULT_INTERVAL_SECONDS: u64 = 1;
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Where samples come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// System CPU busy percentage (placeholder telemetry).
    #[default]
    Cpu,
    /// Inverter records replayed from an NDJSON file.
    Replay,
}

/// Dashboard and log-file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of samples in the "now" chart (default: 20)
    #[serde(default = "default_rollover_limit")]
    pub rollover_limit: usize,

    /// Directory holding the daily files (default: current directory)
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    #[serde(default = "default_log_base")]
    pub log_base: String,

    #[serde(default = "default_log_extension")]
    pub log_extension: String,

    /// Write the human-readable full log next to the summary log
    #[serde(default)]
    pub full_log: bool,

    #[serde(default = "default_full_log_base")]
    pub full_log_base: String,

    #[serde(default)]
    pub source: SourceKind,

    /// NDJSON file of inverter records, required for `source: replay`
    #[serde(default)]
    pub replay_file: Option<PathBuf>,

    #[serde(default)]
    pub value_field: ValueField,
}

fn default_bind() -> String {
    DEFAULT_BIND_ADDR.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_rollover_limit() -> usize {
    crate::rolling::DEFAULT_ROLLOVER_LIMIT
}
fn default_log_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_log_base() -> String {
    "power_".to_string()
}
fn default_log_extension() -> String {
    ".txt".to_string()
}
fn default_full_log_base() -> String {
    "full_".to_string()
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            rollover_limit: default_rollover_limit(),
            log_dir: default_log_dir(),
            log_base: default_log_base(),
            log_extension: default_log_extension(),
            full_log: false,
            full_log_base: default_full_log_base(),
            source: SourceKind::default(),
            replay_file: None,
            value_field: ValueField::default(),
        }
    }
}

impl ViewerConfig {
    /// Naming of the summary stream.
    pub fn summary_naming(&self) -> LogNaming {
        LogNaming::new(&self.log_dir, &self.log_base, &self.log_extension)
    }

    /// Naming of the full stream, if enabled.
    pub fn full_naming(&self) -> Option<LogNaming> {
        self.full_log
            .then(|| LogNaming::new(&self.log_dir, &self.full_log_base, &self.log_extension))
    }
}

/// One nRF24 radio.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RadioConfig {
    #[serde(default)]
    pub ce_pin: Option<u8>,
    #[serde(default)]
    pub cs_pin: Option<u8>,
    #[serde(default)]
    pub txpower: Option<String>,
}

/// Message bus connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    #[serde(default)]
    pub disabled: bool,
    #[serde(default = "default_mqtt_host")]
    pub host: String,
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn default_mqtt_host() -> String {
    "127.0.0.1".to_string()
}
fn default_mqtt_port() -> u16 {
    DEFAULT_MQTT_PORT
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            disabled: true,
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            user: None,
            password: None,
        }
    }
}

/// Time-series database sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfluxConfig {
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub org: String,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default = "default_measurement")]
    pub measurement: String,
}

fn default_measurement() -> String {
    "hoymiles".to_string()
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            disabled: true,
            url: None,
            token: None,
            org: String::new(),
            bucket: None,
            measurement: default_measurement(),
        }
    }
}

/// Per-inverter message bus options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InverterMqttConfig {
    #[serde(default)]
    pub send_raw_enabled: bool,
    #[serde(default)]
    pub topic: Option<String>,
}

/// One inverter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InverterConfig {
    pub serial: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mqtt: InverterMqttConfig,
}

impl InverterConfig {
    /// Topic the inverter publishes on.
    pub fn topic(&self) -> String {
        self.mqtt
            .topic
            .clone()
            .unwrap_or_else(|| format!("hoymiles/{}", self.serial))
    }
}

/// A command-relay subscription: inverter serial and command topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSubscription {
    pub serial: String,
    pub topic: String,
}

/// Inverter stack settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AhoyConfig {
    /// Seconds between samples (default: 1)
    #[serde(default = "default_interval")]
    pub interval: u64,
    #[serde(default)]
    pub nrf: Vec<RadioConfig>,
    /// Absent means disabled.
    #[serde(default)]
    pub mqtt: Option<MqttConfig>,
    /// Absent means disabled.
    #[serde(default, alias = "influx")]
    pub influxdb: Option<InfluxConfig>,
    #[serde(default)]
    pub inverters: Vec<InverterConfig>,
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECONDS
}

impl Default for AhoyConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            nrf: vec![RadioConfig::default()],
            mqtt: None,
            influxdb: None,
            inverters: Vec::new(),
        }
    }
}

impl AhoyConfig {
    pub fn mqtt_enabled(&self) -> bool {
        self.mqtt.as_ref().is_some_and(|m| !m.disabled)
    }

    pub fn influx_enabled(&self) -> bool {
        self.influxdb.as_ref().is_some_and(|i| !i.disabled)
    }

    /// Command topics to subscribe, one per inverter with raw sending
    /// enabled. Empty when the message bus is disabled.
    pub fn command_subscriptions(&self) -> Vec<CommandSubscription> {
        if !self.mqtt_enabled() {
            return Vec::new();
        }
        self.inverters
            .iter()
            .filter(|inv| inv.mqtt.send_raw_enabled)
            .map(|inv| CommandSubscription {
                serial: inv.serial.clone(),
                topic: format!("{}/command", inv.topic()),
            })
            .collect()
    }
}

/// Complete configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub ahoy: AhoyConfig,
}

impl Config {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.ahoy.interval)
    }

    /// Copy with passwords and tokens replaced, for display.
    pub fn redacted(&self) -> Config {
        let mut copy = self.clone();
        if let Some(mqtt) = copy.ahoy.mqtt.as_mut() {
            if mqtt.password.is_some() {
                mqtt.password = Some("***".to_string());
            }
        }
        if let Some(influx) = copy.ahoy.influxdb.as_mut() {
            if influx.token.is_some() {
                influx.token = Some("***".to_string());
            }
        }
        copy
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.ahoy.interval == 0 {
        return Err(ConfigError::Invalid("ahoy.interval must be at least 1 second".into()));
    }

    if cfg.viewer.rollover_limit == 0 {
        return Err(ConfigError::Invalid("viewer.rollover_limit must be at least 1".into()));
    }

    if cfg.viewer.log_base.contains(['/', '\\']) || cfg.viewer.full_log_base.contains(['/', '\\']) {
        return Err(ConfigError::Invalid(
            "log_base and full_log_base must not contain path separators (use log_dir)".into(),
        ));
    }

    if cfg.viewer.full_log && cfg.viewer.full_log_base == cfg.viewer.log_base {
        return Err(ConfigError::Invalid(
            "full_log_base must differ from log_base when full_log is enabled".into(),
        ));
    }

    if cfg.viewer.source == SourceKind::Replay && cfg.viewer.replay_file.is_none() {
        return Err(ConfigError::Invalid(
            "viewer.source is 'replay' but viewer.replay_file is not set".into(),
        ));
    }

    if let Some(mqtt) = cfg.ahoy.mqtt.as_ref().filter(|m| !m.disabled) {
        if mqtt.host.trim().is_empty() {
            return Err(ConfigError::Invalid("ahoy.mqtt is enabled but host is empty".into()));
        }
    }

    if let Some(influx) = cfg.ahoy.influxdb.as_ref().filter(|i| !i.disabled) {
        if influx.url.as_deref().map_or(true, |u| u.trim().is_empty()) {
            return Err(ConfigError::Invalid("ahoy.influxdb is enabled but url is not set".into()));
        }
    }

    let mut seen = HashSet::new();
    for inverter in &cfg.ahoy.inverters {
        if inverter.serial.trim().is_empty() {
            return Err(ConfigError::Invalid("inverter serial must not be empty".into()));
        }
        if !seen.insert(inverter.serial.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "duplicate inverter serial '{}'",
                inverter.serial
            )));
        }
    }

    Ok(())
}

/// Parses configuration text.
pub fn parse_config(content: &str, path: &Path) -> Result<Config, ConfigError> {
    // An empty YAML document deserializes as unit, not as an empty map.
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads the configuration file. A missing file is an error.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&content, path)?;
    info!("Loaded YAML configuration from: {}", path.display());
    Ok(config)
}

/// Resolves configuration from CLI args and the config file.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, ConfigError> {
    let path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = load_config(&path)?;

    if let Some(bind_ip) = args.bind {
        config.viewer.bind = bind_ip.to_string();
    }
    if let Some(port) = args.port {
        config.viewer.port = port;
    }
    if let Some(log_dir) = &args.log_dir {
        config.viewer.log_dir = log_dir.clone();
    }

    Ok(config)
}

/// Renders configuration in the requested format.
pub fn render_config(config: &Config, format: ConfigFormat) -> Result<String, Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Config, ConfigError> {
        parse_config(text, Path::new("test.yml"))
    }

    #[test]
    fn test_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.ahoy.interval, 1);
        assert_eq!(cfg.viewer.rollover_limit, 20);
        assert_eq!(cfg.viewer.port, DEFAULT_PORT);
        assert_eq!(cfg.viewer.source, SourceKind::Cpu);
        assert!(!cfg.ahoy.mqtt_enabled());
        assert!(!cfg.ahoy.influx_enabled());
        assert!(validate_effective_config(&cfg).is_ok());
    }

    #[test]
    fn test_full_file() {
        let cfg = parse(
            r#"
viewer:
  port: 8080
  rollover_limit: 30
  log_dir: /var/lib/pv
  full_log: true
  source: replay
  replay_file: records.ndjson
  value_field: ac_power
ahoy:
  interval: 5
  nrf:
    - ce_pin: 22
      cs_pin: 0
      txpower: low
  mqtt:
    host: broker.local
    user: pv
    password: secret
  influxdb:
    url: http://influx:8086
    token: abc
    bucket: solar
  inverters:
    - serial: "114172220003"
      mqtt:
        send_raw_enabled: true
    - serial: "114172220004"
      mqtt:
        send_raw_enabled: true
        topic: garage/inverter
    - serial: "114172220005"
"#,
        )
        .unwrap();

        assert_eq!(cfg.viewer.port, 8080);
        assert_eq!(cfg.viewer.value_field, ValueField::AcPower);
        assert_eq!(cfg.interval(), Duration::from_secs(5));
        assert!(cfg.ahoy.mqtt_enabled());
        assert!(cfg.ahoy.influx_enabled());
        assert_eq!(cfg.ahoy.mqtt.as_ref().unwrap().port, 1883);
        assert_eq!(cfg.ahoy.nrf[0].ce_pin, Some(22));
        assert!(validate_effective_config(&cfg).is_ok());

        let subs = cfg.ahoy.command_subscriptions();
        assert_eq!(
            subs,
            vec![
                CommandSubscription {
                    serial: "114172220003".into(),
                    topic: "hoymiles/114172220003/command".into(),
                },
                CommandSubscription {
                    serial: "114172220004".into(),
                    topic: "garage/inverter/command".into(),
                },
            ]
        );

        let naming = cfg.viewer.full_naming().unwrap();
        assert_eq!(naming.base, "full_");
        assert_eq!(naming.dir, PathBuf::from("/var/lib/pv"));
    }

    #[test]
    fn test_disabled_mqtt_has_no_subscriptions() {
        let cfg = parse(
            r#"
ahoy:
  mqtt:
    disabled: true
  inverters:
    - serial: "1"
      mqtt: { send_raw_enabled: true }
"#,
        )
        .unwrap();
        assert!(cfg.ahoy.command_subscriptions().is_empty());
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let err = parse("viewer: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let err = parse("ahoy:\n  interval: soon\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = load_config(Path::new("/nonexistent/ahoy.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_validation_failures() {
        let mut cfg = Config::default();
        cfg.ahoy.interval = 0;
        assert!(validate_effective_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.viewer.source = SourceKind::Replay;
        assert!(validate_effective_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.ahoy.influxdb = Some(InfluxConfig {
            disabled: false,
            ..Default::default()
        });
        assert!(validate_effective_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.ahoy.inverters = vec![
            InverterConfig {
                serial: "42".into(),
                ..Default::default()
            },
            InverterConfig {
                serial: "42".into(),
                ..Default::default()
            },
        ];
        let err = validate_effective_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("duplicate inverter serial '42'"));

        let mut cfg = Config::default();
        cfg.viewer.log_base = "logs/power_".into();
        assert!(validate_effective_config(&cfg).is_err());
    }

    #[test]
    fn test_redacted_hides_secrets() {
        let mut cfg = Config::default();
        cfg.ahoy.mqtt = Some(MqttConfig {
            disabled: false,
            password: Some("hunter2".into()),
            ..Default::default()
        });
        let shown = render_config(&cfg.redacted(), ConfigFormat::Yaml).unwrap();
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("***"));
    }
}

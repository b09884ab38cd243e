//! Config command implementation.
//!
//! Generates a commented configuration file.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::config::{
    AhoyConfig, Config, InfluxConfig, InverterConfig, MqttConfig, DEFAULT_CONFIG_PATH,
};

/// Configuration written by `pv-dashboard config`: the defaults plus one
/// example inverter and the (disabled) message bus and database sections.
pub fn template_config() -> Config {
    Config {
        ahoy: AhoyConfig {
            mqtt: Some(MqttConfig::default()),
            influxdb: Some(InfluxConfig::default()),
            inverters: vec![InverterConfig {
                serial: "114172220003".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Renders the template as commented YAML.
pub fn render_template() -> Result<String> {
    let yaml = serde_yaml::to_string(&template_config())
        .context("failed to serialize default configuration")?;
    Ok(add_config_comments(yaml))
}

/// Generates configuration files.
pub fn command_config(output: Option<PathBuf>) -> Result<()> {
    let output = output.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let content = render_template()?;

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)
            .with_context(|| format!("failed to write {}", output.display()))?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# PV Dashboard Configuration
# ==========================
#
# Viewer
# ------
# bind: "0.0.0.0"              # HTTP bind address
# port: 5006                   # HTTP port
# rollover_limit: 20           # Samples kept in the "now" chart
# log_dir: "."                 # Directory for the daily log files
# log_base: "power_"           # Summary file prefix (power_YYYY-MM-DD.txt)
# log_extension: ".txt"
# full_log: false              # Also write the human-readable full log
# full_log_base: "full_"       # Full log file prefix
# source: cpu                  # cpu | replay
# replay_file: null            # NDJSON inverter records for source=replay
# value_field: power           # power | ac_power | dc_power
#
# Inverter stack (ahoy)
# ---------------------
# interval: 1                  # Seconds between samples
# nrf: radio wiring (ce_pin, cs_pin, txpower)
# mqtt: message bus; command topics are derived for every inverter
#       with mqtt.send_raw_enabled ("<topic>/command")
# influxdb: time-series sink (url, token, org, bucket, measurement)
# inverters: serial (unique), optional name and mqtt topic
"#;

    format!("{comments}\n{yaml}")
}

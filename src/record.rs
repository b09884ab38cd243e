//! Typed telemetry records.
//!
//! Inverter status records arrive as JSON objects whose fields vary between
//! inverter models and firmware. Every field is optional; a record that
//! lacks the configured value field still decodes and simply yields no
//! value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// AC output of one grid phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseReading {
    #[serde(default)]
    pub voltage: Option<f64>,
    #[serde(default)]
    pub current: Option<f64>,
    #[serde(default)]
    pub power: Option<f64>,
    #[serde(default)]
    pub reactive_power: Option<f64>,
    #[serde(default)]
    pub frequency: Option<f64>,
}

/// DC input of one panel string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StringReading {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub voltage: Option<f64>,
    #[serde(default)]
    pub current: Option<f64>,
    #[serde(default)]
    pub power: Option<f64>,
    #[serde(default)]
    pub energy_daily: Option<f64>,
    #[serde(default)]
    pub energy_total: Option<f64>,
    #[serde(default)]
    pub irradiation: Option<f64>,
}

/// One status record from a telemetry source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    #[serde(default, alias = "inverter_ser")]
    pub device: Option<String>,
    #[serde(default, alias = "inverter_name")]
    pub name: Option<String>,
    #[serde(default)]
    pub power: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub frequency: Option<f64>,
    #[serde(default)]
    pub powerfactor: Option<f64>,
    #[serde(default)]
    pub yield_today: Option<f64>,
    #[serde(default)]
    pub yield_total: Option<f64>,
    #[serde(default)]
    pub event_count: Option<u64>,
    #[serde(default)]
    pub phases: Vec<PhaseReading>,
    #[serde(default)]
    pub strings: Vec<StringReading>,
}

/// Which measurement of a record feeds the charts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueField {
    /// Top-level `power` field.
    #[default]
    Power,
    /// Sum of phase powers.
    AcPower,
    /// Sum of string powers.
    DcPower,
}

impl TelemetryRecord {
    /// Record carrying only a device label and a power value.
    pub fn with_power(device: &str, power: f64) -> Self {
        Self {
            device: Some(device.to_string()),
            power: Some(power),
            ..Default::default()
        }
    }

    /// Decodes one JSON object.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Extracts the charted value. `None` when the field is absent or not a
    /// finite number.
    pub fn value(&self, field: ValueField) -> Option<f64> {
        let v = match field {
            ValueField::Power => self.power,
            ValueField::AcPower => sum_present(self.phases.iter().map(|p| p.power)),
            ValueField::DcPower => sum_present(self.strings.iter().map(|s| s.power)),
        }?;
        v.is_finite().then_some(v)
    }
}

/// Sums the present values; `None` if none are present.
fn sum_present(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    values.flatten().fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

fn opt(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}

/// Human-readable one-line rendering used by the full log stream.
impl fmt::Display for TelemetryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device={}", self.device.as_deref().unwrap_or("-"))?;
        if let Some(name) = &self.name {
            write!(f, " name={name}")?;
        }
        write!(f, " power={}W", opt(self.power))?;
        if self.temperature.is_some() {
            write!(f, " temp={}C", opt(self.temperature))?;
        }
        if self.frequency.is_some() {
            write!(f, " freq={}Hz", opt(self.frequency))?;
        }
        if self.powerfactor.is_some() {
            write!(f, " pf={}", opt(self.powerfactor))?;
        }
        if self.yield_today.is_some() || self.yield_total.is_some() {
            write!(
                f,
                " yield={}Wh/{}Wh",
                opt(self.yield_today),
                opt(self.yield_total)
            )?;
        }
        for (i, p) in self.phases.iter().enumerate() {
            write!(
                f,
                " phase{i}=[{}V {}A {}W]",
                opt(p.voltage),
                opt(p.current),
                opt(p.power)
            )?;
        }
        for (i, s) in self.strings.iter().enumerate() {
            let label = s.name.clone().unwrap_or_else(|| format!("string{i}"));
            write!(
                f,
                " {label}=[{}V {}A {}W {}Wh]",
                opt(s.voltage),
                opt(s.current),
                opt(s.power),
                opt(s.energy_daily)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HM600: &str = r#"{
        "inverter_ser": "114172220003",
        "inverter_name": "roof",
        "phases": [{"voltage": 231.2, "current": 1.5, "power": 346.8, "frequency": 50.01}],
        "strings": [
            {"name": "east", "voltage": 31.2, "current": 5.5, "power": 171.6, "energy_daily": 880},
            {"name": "west", "voltage": 32.0, "current": 5.6, "power": 179.2, "energy_daily": 901}
        ],
        "temperature": 32.1,
        "yield_today": 1781
    }"#;

    #[test]
    fn test_decode_inverter_record_aliases() {
        let record = TelemetryRecord::from_json(HM600).unwrap();
        assert_eq!(record.device.as_deref(), Some("114172220003"));
        assert_eq!(record.name.as_deref(), Some("roof"));
        assert_eq!(record.phases.len(), 1);
        assert_eq!(record.strings.len(), 2);
        assert!(record.power.is_none());
    }

    #[test]
    fn test_missing_power_is_absent_not_error() {
        let record = TelemetryRecord::from_json(HM600).unwrap();
        assert_eq!(record.value(ValueField::Power), None);
        assert_eq!(record.value(ValueField::AcPower), Some(346.8));

        let dc = record.value(ValueField::DcPower).unwrap();
        assert!((dc - 350.8).abs() < 1e-9);
    }

    #[test]
    fn test_empty_object_decodes() {
        let record = TelemetryRecord::from_json("{}").unwrap();
        assert_eq!(record, TelemetryRecord::default());
        assert_eq!(record.value(ValueField::AcPower), None);
        assert_eq!(record.value(ValueField::DcPower), None);
    }

    #[test]
    fn test_value_field_names() {
        let field: ValueField = serde_yaml::from_str("ac_power").unwrap();
        assert_eq!(field, ValueField::AcPower);
        assert_eq!(ValueField::default(), ValueField::Power);
    }

    #[test]
    fn test_display_includes_sub_measurements() {
        let record = TelemetryRecord::from_json(HM600).unwrap();
        let line = record.to_string();
        assert!(line.starts_with("device=114172220003 name=roof power=-W"));
        assert!(line.contains("phase0=[231.20V 1.50A 346.80W]"));
        assert!(line.contains("east=[31.20V 5.50A 171.60W 880.00Wh]"));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_with_power() {
        let record = TelemetryRecord::with_power("cpu", 12.5);
        assert_eq!(record.value(ValueField::Power), Some(12.5));
        assert_eq!(record.to_string(), "device=cpu power=12.50W");
    }
}

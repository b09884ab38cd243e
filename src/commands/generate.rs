//! Generate replay command implementation.
//!
//! Writes a synthetic NDJSON capture of inverter status records for
//! `source: replay`. Power follows a daylight curve with noise; some records
//! deliberately lack `power` to exercise sentinel handling.

use anyhow::{Context, Result};
use rand::Rng;
use std::f64::consts::PI;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::debug;

use crate::record::{PhaseReading, StringReading, TelemetryRecord};

// Inverter model for generated records: one phase, two panel strings.
const PEAK_POWER_W: f64 = 600.0;
const GRID_VOLTAGE_V: f64 = 230.0;
const GRID_FREQUENCY_HZ: f64 = 50.0;
const STRING_VOLTAGE_V: f64 = 31.0;
const DC_EFFICIENCY: f64 = 0.96;

/// One in this many records is written without `power`.
const MISSING_POWER_EVERY: usize = 25;

/// Builds `count` records tracing one day of production.
pub fn generate_records(rng: &mut impl Rng, count: usize, serial: &str) -> Vec<TelemetryRecord> {
    let mut yield_today = 0.0;
    let mut records = Vec::with_capacity(count);

    for i in 0..count {
        let t = if count > 1 { i as f64 / (count - 1) as f64 } else { 0.5 };
        let daylight = (PI * t).sin().max(0.0);
        let noise: f64 = rng.gen_range(0.9..1.1);
        let ac_power = (PEAK_POWER_W * daylight * noise).max(0.0);
        let dc_power = ac_power / DC_EFFICIENCY;
        yield_today += ac_power / 3600.0;

        let strings = ["east", "west"]
            .iter()
            .map(|name| {
                let share: f64 = rng.gen_range(0.45..0.55);
                let power = dc_power * share;
                StringReading {
                    name: Some(name.to_string()),
                    voltage: Some(STRING_VOLTAGE_V * (0.9 + 0.1 * daylight)),
                    current: Some(power / STRING_VOLTAGE_V),
                    power: Some(power),
                    ..Default::default()
                }
            })
            .collect();

        let missing = (i + 1) % MISSING_POWER_EVERY == 0;
        records.push(TelemetryRecord {
            device: Some(serial.to_string()),
            power: (!missing).then_some(ac_power),
            temperature: Some(15.0 + 25.0 * daylight + rng.gen_range(-0.5..0.5)),
            frequency: Some(GRID_FREQUENCY_HZ + rng.gen_range(-0.05..0.05)),
            yield_today: Some(yield_today),
            phases: vec![PhaseReading {
                voltage: Some(GRID_VOLTAGE_V + rng.gen_range(-3.0..3.0)),
                current: Some(ac_power / GRID_VOLTAGE_V),
                power: Some(ac_power),
                ..Default::default()
            }],
            strings,
            ..Default::default()
        });
    }

    records
}

/// Writes a synthetic replay file.
pub fn command_generate_replay(output: PathBuf, count: usize, serial: &str) -> Result<()> {
    debug!(
        "Generating replay data: count={}, serial={}, output={}",
        count,
        serial,
        output.display()
    );

    let records = generate_records(&mut rand::thread_rng(), count, serial);

    let file = File::create(&output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let mut writer = BufWriter::new(file);
    for record in &records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    println!(
        "✅ Generated replay data: {} records in {}",
        records.len(),
        output.display()
    );

    Ok(())
}

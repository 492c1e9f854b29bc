//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Reading generator run loop: health check, submissions and tally."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
//! Run loop behind the `decoder-simgen` binary.
//!
//! The loop is strictly sequential: each reading is submitted and awaited
//! before the next one is generated, with a fixed pause in between.
use std::time::Duration;

use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use decoder_client::{display_value, ApiClient, ApiError, SensorReading};
use decoder_common::config::BuildingSpec;
use decoder_common::{Console, PromptError, Prompter};
use decoder_logging::{decoder_info, log_system_event, LogContext, SystemEventOutcome};
use decoder_sim::ReadingGenerator;

const RULE_WIDTH: usize = 60;

/// Running success/failure counts for one generator run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub total: usize,
    pub succeeded: usize,
}

impl Tally {
    pub fn record(&mut self, success: bool) {
        self.total += 1;
        if success {
            self.succeeded += 1;
        }
    }

    pub fn failed(&self) -> usize {
        self.total - self.succeeded
    }
}

/// Result of the pre-run health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preflight {
    Available,
    /// Unreachable, but the operator chose to continue.
    Continue,
    Declined,
}

pub fn print_banner(console: &Console, target: &str, buildings: usize) {
    console.line("=".repeat(RULE_WIDTH));
    console.line("DECODER API - Sensor Data Generator");
    console.line("=".repeat(RULE_WIDTH));
    console.blank();
    console.line(format!(
        "Generating realistic sensor data for {} buildings...",
        buildings
    ));
    console.line(format!("Target API: {}", target));
    console.blank();
}

/// Probe the API and ask whether to continue when it does not answer.
pub async fn preflight(
    client: &ApiClient,
    console: &Console,
    prompter: &mut dyn Prompter,
) -> Result<Preflight> {
    if client.is_available().await {
        console.line("[OK] API is available");
        console.blank();
        return Ok(Preflight::Available);
    }

    console.line(format!(
        "[WARN] Warning: API at {} is not available.",
        client.display_base()
    ));
    console.line("  Make sure the API is running before generating data.");
    console.blank();
    let answer = match prompter.read_line("Continue anyway? (y/n): ").await {
        Ok(answer) => answer,
        Err(PromptError::Closed) => String::new(),
        Err(err) => return Err(err.into()),
    };
    if answer.eq_ignore_ascii_case("y") {
        Ok(Preflight::Continue)
    } else {
        Ok(Preflight::Declined)
    }
}

/// Generate the whole registry without submitting anything.
pub fn plan(
    generator: &mut ReadingGenerator,
    buildings: &[BuildingSpec],
    readings_per_sensor: usize,
    end: NaiveDateTime,
) -> Vec<SensorReading> {
    let mut readings = Vec::new();
    for building in buildings {
        for sensor in &building.sensors {
            readings.extend(generator.series(building.id, sensor, readings_per_sensor, end));
        }
    }
    readings
}

/// Submit one reading and print its outcome line.
pub async fn submit(client: &ApiClient, console: &Console, reading: &SensorReading) -> bool {
    match client.ingest(reading).await {
        Ok(()) => {
            console.line(format!(
                "[OK] Sent reading: Building {}, Sensor {}, Value: {}",
                reading.building_id,
                reading.sensor_id,
                display_value(reading.value)
            ));
            true
        }
        Err(ApiError::UnexpectedStatus { status, body }) => {
            console.line(format!(
                "[FAIL] Failed to send reading: {} - {}",
                status.as_u16(),
                body
            ));
            false
        }
        Err(err) => {
            console.line(format!("[FAIL] Error sending reading: {}", err));
            false
        }
    }
}

/// Generate and submit readings for every building and sensor.
pub async fn run(
    client: &ApiClient,
    console: &Console,
    generator: &mut ReadingGenerator,
    buildings: &[BuildingSpec],
    readings_per_sensor: usize,
    delay: Duration,
) -> Tally {
    let mut tally = Tally::default();
    for building in buildings {
        console.blank();
        console.line(format!(
            "Generating data for {} (ID: {})",
            building.name, building.id
        ));
        console.line(format!("   Sensors: {}", building.sensors.join(", ")));

        for sensor in &building.sensors {
            let series = generator.series(
                building.id,
                sensor,
                readings_per_sensor,
                Local::now().naive_local(),
            );
            for reading in &series {
                tally.record(submit(client, console, reading).await);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            let ctx = LogContext::new()
                .with_building(building.id)
                .with_sensor(sensor);
            decoder_info!(context = ctx, "sensor series submitted");
        }
    }

    let outcome = SystemEventOutcome::from_passed(tally.failed() == 0);
    log_system_event(
        None,
        "generator.run",
        &format!("{} of {} readings accepted", tally.succeeded, tally.total),
        outcome,
    );
    tally
}

pub fn print_summary(console: &Console, tally: &Tally) {
    console.blank();
    console.line("=".repeat(RULE_WIDTH));
    console.line("Generation complete!");
    console.line(format!("Total readings generated: {}", tally.total));
    console.line(format!("Successfully sent: {}", tally.succeeded));
    console.line(format!("Failed: {}", tally.failed()));
    console.line("=".repeat(RULE_WIDTH));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use decoder_common::config::default_registry;
    use decoder_common::{Palette, ScriptedPrompter};
    use decoder_sim::ValueModel;
    use std::net::TcpListener;

    fn unreachable_client() -> ApiClient {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        ApiClient::new(
            format!("http://{addr}").parse().unwrap(),
            Duration::from_millis(500),
            Duration::from_millis(500),
        )
        .unwrap()
    }

    #[test]
    fn tally_counts_failures() {
        let mut tally = Tally::default();
        tally.record(true);
        tally.record(false);
        tally.record(true);
        assert_eq!(tally.total, 3);
        assert_eq!(tally.succeeded, 2);
        assert_eq!(tally.failed(), 1);
    }

    #[test]
    fn plan_covers_every_sensor_of_the_registry() {
        let end = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let mut generator = ReadingGenerator::new(ValueModel::default(), Some(9));
        let readings = plan(&mut generator, &default_registry(), 10, end);
        assert_eq!(readings.len(), 80);
        assert_eq!(readings[0].sensor_id, "sensor-001");
        assert_eq!(readings[79].building_id, 3);
        assert_eq!(readings[79].sensor_id, "sensor-008");
        assert!(readings.iter().all(|r| r.value >= 0.0));
    }

    #[tokio::test]
    async fn preflight_declines_unless_operator_types_y() {
        let client = unreachable_client();
        let (console, output) = Console::capture(Palette::plain());

        let mut prompter = ScriptedPrompter::new(["n"]);
        let outcome = preflight(&client, &console, &mut prompter).await.unwrap();
        assert_eq!(outcome, Preflight::Declined);
        assert_eq!(prompter.prompts(), ["Continue anyway? (y/n): "]);
        assert!(output.contents().contains("is not available."));

        let mut prompter = ScriptedPrompter::new(["Y"]);
        let outcome = preflight(&client, &console, &mut prompter).await.unwrap();
        assert_eq!(outcome, Preflight::Continue);

        let mut closed = ScriptedPrompter::new(Vec::<String>::new());
        let outcome = preflight(&client, &console, &mut closed).await.unwrap();
        assert_eq!(outcome, Preflight::Declined);
    }

    #[tokio::test]
    async fn run_counts_network_failures() {
        let client = unreachable_client();
        let (console, output) = Console::capture(Palette::plain());
        let mut generator = ReadingGenerator::new(ValueModel::default(), Some(1));
        let registry = vec![BuildingSpec::new(7, "Annex", &["sensor-x"])];
        let tally = run(&client, &console, &mut generator, &registry, 2, Duration::ZERO).await;
        assert_eq!(tally.total, 2);
        assert_eq!(tally.failed(), 2);
        let text = output.contents();
        assert!(text.contains("Generating data for Annex (ID: 7)"));
        assert!(text.contains("   Sensors: sensor-x"));
        assert_eq!(text.matches("[FAIL] Error sending reading:").count(), 2);
    }
}

//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "01-bootstrap"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Reading generator CLI entrypoint."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use decoder_client::ApiClient;
use decoder_common::{
    init_tracing, AutoPrompter, Console, Palette, Prompter, StdinPrompter, ToolConfig,
};
use decoder_simgen::{plan, preflight, print_banner, print_summary, run, Preflight};
use decoder_sim::{ReadingGenerator, ValueModel};
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Post synthetic sensor readings to the DECODER ingest endpoint",
    long_about = None
)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Base URL of the DECODER API
    #[arg(long, env = "DECODER_BASE_URL")]
    base_url: Option<String>,

    /// Readings generated per sensor
    #[arg(long)]
    readings: Option<usize>,

    /// Pause between submissions in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Random seed for reproducible values
    #[arg(long)]
    seed: Option<u64>,

    /// Continue without asking when the health check fails
    #[arg(long)]
    assume_yes: bool,

    /// Print the generated readings as JSON instead of submitting them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing("decoder-simgen", &config.logging)?;

    let model = ValueModel::from(&config.generator);
    let mut generator = ReadingGenerator::new(model, config.generator.seed);

    if cli.dry_run {
        let readings = plan(
            &mut generator,
            &config.generator.buildings,
            config.generator.readings_per_sensor,
            Local::now().naive_local(),
        );
        let mut stdout = io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, &readings)?;
        stdout.write_all(b"\n")?;
        return Ok(ExitCode::SUCCESS);
    }

    let console = Console::stdout(Palette::plain());
    let client = ApiClient::from_config(&config.api)?;
    print_banner(
        &console,
        &client.display_base(),
        config.generator.buildings.len(),
    );

    let mut prompter: Box<dyn Prompter> = if cli.assume_yes {
        Box::new(AutoPrompter::new("y"))
    } else {
        Box::new(StdinPrompter::new(console.clone()))
    };
    if preflight(&client, &console, prompter.as_mut()).await? == Preflight::Declined {
        info!("operator declined to continue without a reachable api");
        return Ok(ExitCode::from(1));
    }

    let tally = run(
        &client,
        &console,
        &mut generator,
        &config.generator.buildings,
        config.generator.readings_per_sensor,
        config.generator.submit_delay,
    )
    .await;
    print_summary(&console, &tally);
    Ok(ExitCode::SUCCESS)
}

fn load_config(cli: &Cli) -> Result<ToolConfig> {
    let mut config = ToolConfig::load_for_cli(cli.config.as_deref())?.config;
    apply_overrides(cli, &mut config);
    config
        .validate()
        .context("invalid generator settings after applying command line overrides")?;
    Ok(config)
}

fn apply_overrides(cli: &Cli, config: &mut ToolConfig) {
    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }
    if let Some(readings) = cli.readings {
        config.generator.readings_per_sensor = readings;
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.generator.submit_delay = Duration::from_millis(delay_ms);
    }
    if cli.seed.is_some() {
        config.generator.seed = cli.seed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn base_cli() -> Cli {
        Cli {
            config: None,
            base_url: None,
            readings: None,
            delay_ms: None,
            seed: None,
            assume_yes: false,
            dry_run: false,
        }
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut cli = base_cli();
        cli.base_url = Some("http://api.internal:9090".into());
        cli.readings = Some(3);
        cli.delay_ms = Some(0);
        cli.seed = Some(17);
        let mut config = ToolConfig::default();
        apply_overrides(&cli, &mut config);
        assert_eq!(config.api.base_url, "http://api.internal:9090");
        assert_eq!(config.generator.readings_per_sensor, 3);
        assert!(config.generator.submit_delay.is_zero());
        assert_eq!(config.generator.seed, Some(17));
    }

    #[test]
    fn absent_overrides_keep_defaults() {
        let mut config = ToolConfig::default();
        apply_overrides(&base_cli(), &mut config);
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.generator.readings_per_sensor, 10);
        assert_eq!(config.generator.submit_delay, Duration::from_millis(100));
    }

    #[test]
    fn zero_readings_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("decoder.toml");
        std::fs::write(&path, "[generator]\nreadings_per_sensor = 4\n").unwrap();
        let mut cli = base_cli();
        cli.config = Some(path);
        cli.readings = Some(0);
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let mut cli = base_cli();
        cli.config = Some(PathBuf::from("/nonexistent/decoder.toml"));
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "decoder-simgen",
            "--readings",
            "2",
            "--seed",
            "5",
            "--assume-yes",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.readings, Some(2));
        assert_eq!(cli.seed, Some(5));
        assert!(cli.assume_yes && cli.dry_run);
    }
}

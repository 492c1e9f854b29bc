//! ---
//! ems_section: "05-networking-external-interfaces"
//! ems_subsection: "binary"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Manual test harness CLI for operators exercising the DECODER API."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use decoder_client::ApiClient;
use decoder_common::{
    init_tracing, AutoPrompter, ColorMode, Console, HarnessConfig, Palette, StdinPrompter,
    ToolConfig,
};
use decoder_testharness::Harness;
use tokio::runtime::Builder;
use tokio::signal;
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Interactive checks for DECODER authentication, RBAC and forecasting",
    long_about = None
)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Base URL of the DECODER API
    #[arg(long, env = "DECODER_BASE_URL")]
    base_url: Option<String>,

    /// Run every check once without menu or pauses; exit 1 if any fails
    #[arg(long)]
    non_interactive: bool,

    /// Colour output
    #[arg(long, value_enum, ignore_case = true)]
    color: Option<ColorMode>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing("decoder-harness", &config.logging)?;

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let code = runtime.block_on(run(cli, config));
    // A pending stdin read parks a blocking thread; do not wait for it.
    runtime.shutdown_background();
    code
}

async fn run(cli: Cli, config: ToolConfig) -> Result<ExitCode> {
    let mode = cli.color.unwrap_or(config.harness.color);
    let console = Console::stdout(Palette::resolve(mode));
    let client = ApiClient::from_config(&config.api)?;

    tokio::select! {
        code = session(cli.non_interactive, client, console.clone(), config.harness) => code,
        Ok(()) = signal::ctrl_c() => {
            let p = console.palette();
            console.blank();
            console.line(console.paint(p.yellow, "Test suite interrupted by user"));
            info!("session interrupted by operator");
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn session(
    non_interactive: bool,
    client: ApiClient,
    console: Console,
    config: HarnessConfig,
) -> Result<ExitCode> {
    if non_interactive {
        let mut harness = Harness::new(client, console, config, AutoPrompter::new(""));
        if !harness.preflight().await {
            return Ok(ExitCode::from(1));
        }
        let passed = harness.run_all().await?;
        return Ok(if passed {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(1)
        });
    }

    let prompter = StdinPrompter::new(console.clone());
    let mut harness = Harness::new(client, console, config, prompter);
    if !harness.preflight().await {
        return Ok(ExitCode::from(1));
    }
    harness.run().await?;
    Ok(ExitCode::SUCCESS)
}

fn load_config(cli: &Cli) -> Result<ToolConfig> {
    let mut config = ToolConfig::load_for_cli(cli.config.as_deref())?.config;
    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }
    config
        .validate()
        .context("invalid harness settings after applying command line overrides")?;
    Ok(config)
}

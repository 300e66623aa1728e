/*
* Command line
* ------------
* @project: metrics-orchestrator
*
* metrics-orchestrator [--config FILE]
* ├── serve [--port]     run the dashboard API
* ├── init [--force]     write config/default.toml with the built-in defaults
* └── probe              one fetch + check cycle against the configured
*                        providers, printed for humans
*
* ```bash
* metrics-orchestrator serve --port 9000
* ORCH_UPSTREAM__METRICS_URL=http://10.0.0.5:8000/metrics metrics-orchestrator probe
* ```
*/

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::api::AppState;
use crate::config::Settings;
use crate::dashboard::DashboardOutcome;

#[derive(Parser)]
#[command(name = "metrics-orchestrator")]
#[command(about = "Hardware metrics + anomaly dashboard orchestrator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Generate default configuration
    Init {
        #[arg(short, long)]
        force: bool,
    },
    /// Run a single aggregation cycle and print the result
    Probe,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            let settings = load_settings(cli.config.as_deref())?;
            let server_port = port.unwrap_or(settings.server.port);
            info!("Starting server on port {}", server_port);
            crate::run_server(settings, server_port).await?;
        }
        Commands::Init { force } => handle_init_command(force)?,
        Commands::Probe => {
            let settings = load_settings(cli.config.as_deref())?;
            handle_probe_command(&settings).await?;
        }
    }

    Ok(())
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let settings = match path {
        Some(path) => Settings::new_from_file(path)?,
        None => Settings::new()?,
    };
    Ok(settings)
}

async fn handle_probe_command(settings: &Settings) -> anyhow::Result<()> {
    let state = AppState::from_settings(settings)?;

    let outcome = state
        .aggregator
        .aggregate()
        .await
        .with_context(|| {
            format!(
                "metrics provider at {} is unavailable",
                settings.upstream.metrics_url
            )
        })?;

    let samples = state.aggregator.history().await.len();
    let response = outcome.response();
    let metrics = &response.current_metrics;

    println!("{} {}", "Host:".bold(), metrics.hostname);
    println!("  uptime   {}s", metrics.uptime);
    match metrics.mean_cpu_usage() {
        Some(cpu) => println!("  cpu      {:.1}% across {} cores", cpu, metrics.cpus.len()),
        None => println!("  cpu      {}", "no readings".yellow()),
    }
    println!("  memory   {:.1}%", metrics.memory.percent_used);
    for disk in &metrics.disks {
        println!("  disk     {} {:.1}%", disk.name, disk.percent_used);
    }

    let flag = |anomaly: bool| if anomaly { "ANOMALY".red() } else { "ok".green() };
    println!("{}", "Anomalies:".bold());
    println!("  cpu      {}", flag(response.anomalies.cpu_anomaly));
    println!("  memory   {}", flag(response.anomalies.memory_anomaly));

    match outcome {
        DashboardOutcome::Fresh(_) if samples < settings.history.warmup_samples => println!(
            "{} history has {}/{} samples, detector not consulted yet",
            "note:".yellow(),
            samples,
            settings.history.warmup_samples
        ),
        DashboardOutcome::AnomaliesUnavailable(_) => println!(
            "{} anomaly provider at {} failed, verdict is neutral",
            "warning:".yellow(),
            settings.upstream.anomaly_url
        ),
        _ => {}
    }

    Ok(())
}

fn handle_init_command(force: bool) -> anyhow::Result<()> {
    let config_dir = PathBuf::from("config");
    let target = config_dir.join("default.toml");
    if target.exists() && !force {
        error!("Configuration file {} already exists. Use --force to overwrite.", target.display());
        return Ok(());
    }

    std::fs::create_dir_all(&config_dir)?;
    let default_config = crate::config::generate_default_config();
    let config_str = toml::to_string_pretty(&default_config)?;
    std::fs::write(&target, config_str)?;

    println!("{} Default configuration generated at {}", "✓".green(), target.display());
    Ok(())
}

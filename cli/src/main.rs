use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use framepulse::{default_producers, EngineConfig, LoggingConfig, TelemetryEngine};

#[derive(Parser)]
#[command(name = "framepulse")]
#[command(about = "Framepulse CLI - performance telemetry and alerting for the launcher")]
#[command(version)]
#[command(long_about = "
Framepulse samples system, disk, and network metrics, evaluates them
against a threshold table, and tracks a 0-100 health score over a
bounded history.

Examples:
  framepulse score                         # One sample, print the health score
  framepulse watch --interval 2 --count 30 # Sample every 2s for a minute
  framepulse report --ticks 10             # Sample 10 times and export JSON
  framepulse config init                   # Write the default config file
  framepulse thresholds                    # Show the active threshold table
")]
struct Cli {
    /// Configuration file path
    #[arg(long, global = true, env = "FRAMEPULSE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take one sample and print the health score
    Score {
        /// Label to attribute the sample to
        #[arg(long, default_value = "cli")]
        label: String,
    },

    /// Sample continuously and print score and alerts per tick
    Watch {
        /// Seconds between samples
        #[arg(long, default_value_t = 2)]
        interval: u64,

        /// Number of samples to take (0 = run until interrupted)
        #[arg(long, default_value_t = 0)]
        count: u64,

        /// Label to attribute samples to
        #[arg(long, default_value = "watch")]
        label: String,
    },

    /// Sample a number of times, then export the full report as JSON
    Report {
        /// Number of samples to take before exporting
        #[arg(long, default_value_t = 5)]
        ticks: u64,

        /// Seconds between samples
        #[arg(long, default_value_t = 1)]
        interval: u64,

        /// Write the report to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show the active threshold table
    Thresholds,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default configuration to the config path
    Init,

    /// Print the resolved configuration as TOML
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(&cli, &config.logging);

    let config_path = cli.config.clone();
    match cli.command {
        Commands::Score { label } => {
            let engine = TelemetryEngine::new(config, default_producers())?;
            engine.sample_now(&label).await?;
            println!("{}", engine.current_score());
        }
        Commands::Watch {
            interval,
            count,
            label,
        } => {
            let engine = TelemetryEngine::new(config, default_producers())?;
            watch(&engine, interval, count, &label).await?;
        }
        Commands::Report {
            ticks,
            interval,
            output,
        } => {
            let engine = TelemetryEngine::new(config, default_producers())?;
            let mut timer = tokio::time::interval(Duration::from_secs(interval.max(1)));
            for i in 0..ticks {
                timer.tick().await;
                engine.sample_now(&format!("report-{}", i)).await?;
            }

            let json = engine.export_report().to_json()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("writing report to {}", path.display()))?;
                    info!(path = %path.display(), "report written");
                }
                None => println!("{}", json),
            }
        }
        Commands::Config { action } => run_config(action, config_path, &config)?,
        Commands::Thresholds => {
            println!(
                "{:<24} {:<18} {:>12}  {:<12} {:<8} {:>7}",
                "METRIC", "CATEGORY", "LIMIT", "DIRECTION", "SEV", "PENALTY"
            );
            for spec in config.thresholds.specs() {
                println!(
                    "{:<24} {:<18} {:>12}  {:<12} {:<8} {:>7}",
                    spec.metric,
                    spec.category.to_string(),
                    spec.limit,
                    format!("{:?}", spec.direction),
                    format!("{:?}", spec.severity),
                    spec.penalty
                );
            }
        }
    }

    Ok(())
}

async fn watch(engine: &TelemetryEngine, interval: u64, count: u64, label: &str) -> anyhow::Result<()> {
    let mut timer = tokio::time::interval(Duration::from_secs(interval.max(1)));
    let window = Duration::from_secs(interval.max(1));
    let mut taken = 0u64;

    loop {
        timer.tick().await;
        let snapshot = engine.sample_now(label).await?;
        let score = engine.current_score();

        println!(
            "{}  score={:>3}  categories={}",
            snapshot.timestamp.format("%H:%M:%S"),
            score,
            snapshot.readings.len()
        );
        for alert in engine.active_alerts(window) {
            println!(
                "  [{:?}] {} ({})",
                alert.severity, alert.message, alert.recommendation
            );
        }

        taken += 1;
        if count > 0 && taken >= count {
            break;
        }
    }

    Ok(())
}

fn run_config(
    action: ConfigAction,
    config_path: Option<PathBuf>,
    config: &EngineConfig,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let path = match config_path {
                Some(path) => path,
                None => EngineConfig::default_config_path()?,
            };
            EngineConfig::default().save_to_file(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
        ConfigAction::Show => {
            print!("{}", toml::to_string_pretty(config).context("serializing configuration")?);
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => EngineConfig::default_config_path().ok(),
    };
    Ok(EngineConfig::load_with_fallback(path)?)
}

fn init_logging(cli: &Cli, logging: &LoggingConfig) {
    // CLI flags win over the config file's logging section.
    let log_level = if cli.debug {
        "debug".to_string()
    } else if cli.verbose {
        "info".to_string()
    } else if cli.quiet {
        "error".to_string()
    } else {
        logging.level.clone()
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("framepulse={}", log_level).into());

    if logging.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert()
    }
}

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};

use rewards_quality::domain::Dataset;
use rewards_quality::logging;
use rewards_quality::metrics;
use rewards_quality::pipeline::processing::quality_gate::CheckKind;
use rewards_quality::{Config, QualityPipeline};

#[derive(Parser)]
#[command(name = "rewards-quality")]
#[command(about = "Data quality checks for receipts, brands and users exports")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, normalize and check the three exports
    Check {
        #[command(flatten)]
        sources: SourceArgs,
        /// Reference time for the future-date check ("YYYY-MM-DD HH:MM:SS", UTC). Defaults to now.
        #[arg(long)]
        reference_time: Option<String>,
        /// Checks whose violations fail the run (comma-separated), e.g. duplicate_keys,referential_integrity.
        /// Profile-only checks (shape, distinct_values, deduplication) are rejected.
        #[arg(long)]
        fatal: Option<String>,
        /// Report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
        /// Write a Prometheus text snapshot of run metrics to this file
        #[arg(long)]
        metrics_out: Option<PathBuf>,
    },
    /// Print the effective configuration as TOML
    Config {
        #[command(flatten)]
        sources: SourceArgs,
    },
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Configuration file (defaults to ./quality.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding receipts.json, brands.json and users.json
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[arg(long)]
    receipts: Option<PathBuf>,
    #[arg(long)]
    brands: Option<PathBuf>,
    #[arg(long)]
    users: Option<PathBuf>,
    /// Leading lines of the users export to discard
    #[arg(long)]
    users_skip: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

impl SourceArgs {
    fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_or_default(self.config.as_deref())
            .context("Failed to load configuration")?;

        if let Some(dir) = &self.data_dir {
            config.datasets.data_dir = dir.clone();
        }
        let paths = [
            (Dataset::Receipts, &self.receipts),
            (Dataset::Brands, &self.brands),
            (Dataset::Users, &self.users),
        ];
        for (dataset, path) in paths {
            if let Some(path) = path {
                config.datasets.source_mut(dataset).path = Some(path.clone());
            }
        }
        if let Some(skip) = self.users_skip {
            config.datasets.source_mut(Dataset::Users).skip_lines = Some(skip);
        }
        Ok(config)
    }
}

fn parse_fatal(list: &str) -> Result<Vec<CheckKind>> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| match CheckKind::from_name(name) {
            Some(kind) if kind.can_flag() => Ok(kind),
            Some(_) => Err(anyhow!("Check '{}' only profiles the data and cannot be fatal", name)),
            None => {
                let known: Vec<&str> = CheckKind::all()
                    .iter()
                    .filter(|k| k.can_flag())
                    .map(|k| k.name())
                    .collect();
                Err(anyhow!("Unknown check '{}'. Available: {}", name, known.join(", ")))
            }
        })
        .collect()
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            sources,
            reference_time,
            fatal,
            format,
            metrics_out,
        } => {
            let mut config = sources.load_config()?;
            if let Some(ts) = reference_time {
                config.checks.reference_time = Some(ts);
            }
            if let Some(list) = fatal {
                config.checks.fatal = parse_fatal(&list)?;
            }
            config.validate().context("Invalid configuration")?;

            let _guard = logging::init_logging(&config.logging);
            let metrics_handle = match &metrics_out {
                Some(_) => Some(metrics::init_metrics().context("Failed to initialize metrics")?),
                None => None,
            };

            info!("🔍 Running quality checks");
            let report = match QualityPipeline::new(config).run() {
                Ok(report) => report,
                Err(e) => {
                    error!("Quality run failed: {}", e);
                    return Err(e).context("Quality run failed");
                }
            };

            match format {
                ReportFormat::Text => print!("{}", report.render_text()),
                ReportFormat::Json => {
                    println!("{}", report.to_json().context("Failed to serialize report")?)
                }
            }

            if let (Some(handle), Some(path)) = (&metrics_handle, &metrics_out) {
                metrics::write_snapshot(handle, path)
                    .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
            }

            if report.is_failure() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Config { sources } => {
            let config = sources.load_config()?;
            print!("{}", config.to_toml().context("Failed to render configuration")?);
        }
    }
    Ok(ExitCode::SUCCESS)
}

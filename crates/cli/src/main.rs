//! API log analyzer CLI
//!
//! A command-line tool for analyzing batches of API access logs: summaries,
//! performance issues, costs, anomalies and caching opportunities.

mod commands;
mod config;
mod output;

use std::path::PathBuf;

use analyzer_lib::AnalyzerMetrics;
use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{analyze, anomalies, caching, costs};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// API log analyzer CLI
#[derive(Parser)]
#[command(name = "apilog")]
#[command(author, version, about = "Analyze API access logs", long_about = None)]
pub struct Cli {
    /// Analyzer config file (defaults to ~/.config/apilog/config.toml when present)
    #[arg(long, global = true, env = "APILOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose (debug) logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Print Prometheus metrics to stderr when done
    #[arg(long, global = true)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze one or more log files and write full reports
    Analyze {
        /// JSON files, each holding an array of log records
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Report file for a single input, or directory for several
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Show the cost breakdown of a log file
    Costs {
        /// JSON file holding an array of log records
        input: PathBuf,
    },

    /// Show anomalies detected in a log file
    Anomalies {
        /// JSON file holding an array of log records
        input: PathBuf,
    },

    /// Show caching opportunities for a log file
    Caching {
        /// JSON file holding an array of log records
        input: PathBuf,
    },

    /// Print the effective analyzer configuration
    Config,
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    let analyzer_config = config::load(cli.config.as_deref())?;
    let metrics = if cli.metrics {
        Some(AnalyzerMetrics::new()?)
    } else {
        None
    };

    let result = match cli.command {
        Commands::Analyze { inputs, output } => {
            analyze::run(inputs, output, &analyzer_config, metrics.clone(), cli.format).await
        }
        Commands::Costs { input } => {
            costs::show_costs(input, &analyzer_config, metrics.clone(), cli.format).await
        }
        Commands::Anomalies { input } => {
            anomalies::show_anomalies(input, &analyzer_config, metrics.clone(), cli.format).await
        }
        Commands::Caching { input } => {
            caching::show_caching(input, &analyzer_config, metrics.clone(), cli.format).await
        }
        Commands::Config => config::show(&analyzer_config),
    };

    if let Some(metrics) = &metrics {
        eprint!("{}", metrics.encode()?);
    }

    result
}

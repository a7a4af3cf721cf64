//! CLI subcommands

pub mod analyze;
pub mod anomalies;
pub mod caching;
pub mod costs;

use std::path::{Path, PathBuf};
use std::time::Instant;

use analyzer_lib::{analyze_value, AnalyzerConfig, AnalyzerMetrics, Report, StructuredLogger};
use anyhow::{Context, Result};
use serde_json::Value;

/// Read, parse and analyze one log file
pub fn analyze_file(
    path: &Path,
    config: &AnalyzerConfig,
    metrics: Option<&AnalyzerMetrics>,
) -> Result<Report> {
    let logger = StructuredLogger::new(path.display().to_string());

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {} as JSON", path.display()))?;
    if let Value::Array(entries) = &value {
        logger.log_batch_loaded(entries.len());
    }

    let started = Instant::now();
    let report = match analyze_value(&value, config) {
        Ok(report) => report,
        Err(e) => {
            logger.log_failure(&e);
            return Err(e).with_context(|| format!("Failed to analyze {}", path.display()));
        }
    };
    let elapsed = started.elapsed().as_secs_f64();

    logger.log_report(&report, elapsed);
    if let Some(metrics) = metrics {
        metrics.observe_report(&report, elapsed);
    }
    Ok(report)
}

/// Analyze a file on the blocking pool
pub async fn analyze_in_background(
    path: PathBuf,
    config: AnalyzerConfig,
    metrics: Option<AnalyzerMetrics>,
) -> Result<Report> {
    let display = path.display().to_string();
    tokio::task::spawn_blocking(move || analyze_file(&path, &config, metrics.as_ref()))
        .await
        .with_context(|| format!("Analysis task for {} did not complete", display))?
}

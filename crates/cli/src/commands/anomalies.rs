//! Anomaly listing

use std::path::PathBuf;

use analyzer_lib::anomaly::Anomaly;
use analyzer_lib::{AnalyzerConfig, AnalyzerMetrics};
use anyhow::Result;
use chrono::{DateTime, Utc};
use tabled::Tabled;

use super::analyze_in_background;
use crate::output::{color_severity, format_ms, print_heading, print_json, print_table, OutputFormat};

#[derive(Tabled)]
struct AnomalyRow {
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "Window")]
    window: String,
    #[tabled(rename = "Details")]
    details: String,
    #[tabled(rename = "Severity")]
    severity: String,
}

fn format_window(start: &DateTime<Utc>) -> String {
    start.format("%Y-%m-%d %H:%M").to_string()
}

impl From<&Anomaly> for AnomalyRow {
    fn from(anomaly: &Anomaly) -> Self {
        let (window, details) = match anomaly {
            Anomaly::RequestSpike {
                window_start,
                normal_rate,
                actual_rate,
                ratio,
                ..
            } => (
                format_window(window_start),
                format!("{actual_rate} req vs {normal_rate:.1} normal ({ratio:.1}x)"),
            ),
            Anomaly::ResponseTimeDegradation {
                window_start,
                expected_response_time_ms,
                actual_response_time_ms,
                ratio,
                ..
            } => (
                format_window(window_start),
                format!(
                    "{} vs {} avg ({ratio:.1}x)",
                    format_ms(*actual_response_time_ms),
                    format_ms(*expected_response_time_ms)
                ),
            ),
            Anomaly::ErrorCluster {
                window_start,
                error_count,
                threshold,
                ..
            } => (
                format_window(window_start),
                format!("{error_count} errors (threshold {threshold})"),
            ),
            Anomaly::UserDominance {
                request_count,
                request_percentage,
                ..
            } => (
                "-".to_string(),
                format!("{request_count} requests ({request_percentage:.1}% of batch)"),
            ),
        };

        Self {
            kind: anomaly.anomaly_type().to_string(),
            subject: anomaly.subject().to_string(),
            window,
            details,
            severity: color_severity(anomaly.severity()),
        }
    }
}

/// Show anomalies detected in one log file
pub async fn show_anomalies(
    input: PathBuf,
    config: &AnalyzerConfig,
    metrics: Option<AnalyzerMetrics>,
    format: OutputFormat,
) -> Result<()> {
    let report = analyze_in_background(input, config.clone(), metrics).await?;

    match format {
        OutputFormat::Json => print_json(&report.anomalies)?,
        OutputFormat::Table => {
            print_heading("Anomalies");
            for (kind, count) in report.anomaly_counts() {
                println!("{:<28}{}", format!("{kind}:"), count);
            }
            if !report.anomalies.is_empty() {
                println!();
            }
            print_table(
                report.anomalies.iter().map(AnomalyRow::from).collect(),
                "No anomalies detected",
            );
        }
    }

    Ok(())
}

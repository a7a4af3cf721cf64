//! Full analysis of one or more log files

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use analyzer_lib::{AnalyzerConfig, AnalyzerMetrics, Report};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use tabled::Tabled;

use super::analyze_in_background;
use crate::output::{
    format_usd, print_error, print_json, print_success, print_table, print_warning, OutputFormat,
};

/// Report file used when a single input is analyzed without `--output`
pub const DEFAULT_OUTPUT: &str = "analysis_result.json";

/// Per-batch outcome shown after the run
#[derive(Debug, Serialize)]
struct BatchSummary {
    input: String,
    report: String,
    total_requests: u64,
    invalid_entries: usize,
    performance_issues: usize,
    anomalies: usize,
    #[serde(serialize_with = "analyzer_lib::rounding::two_places")]
    total_cost_usd: f64,
}

#[derive(Tabled)]
struct BatchRow {
    #[tabled(rename = "Input")]
    input: String,
    #[tabled(rename = "Requests")]
    requests: u64,
    #[tabled(rename = "Invalid")]
    invalid: usize,
    #[tabled(rename = "Issues")]
    issues: usize,
    #[tabled(rename = "Anomalies")]
    anomalies: usize,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Report")]
    report: String,
}

impl From<&BatchSummary> for BatchRow {
    fn from(summary: &BatchSummary) -> Self {
        Self {
            input: summary.input.clone(),
            requests: summary.total_requests,
            invalid: summary.invalid_entries,
            issues: summary.performance_issues,
            anomalies: summary.anomalies,
            cost: format_usd(summary.total_cost_usd),
            report: summary.report.clone(),
        }
    }
}

/// Where each input's report is written
///
/// Inputs sharing a file stem get `-2`, `-3`, ... suffixes so no report
/// overwrites another.
fn report_paths(inputs: &[PathBuf], output: Option<PathBuf>) -> Vec<PathBuf> {
    if inputs.len() == 1 {
        return vec![output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))];
    }

    let dir = output.unwrap_or_else(|| PathBuf::from("."));
    let mut taken = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "batch".to_string());
            let mut name = format!("{stem}.analysis.json");
            let mut n = 2;
            while !taken.insert(name.clone()) {
                name = format!("{stem}-{n}.analysis.json");
                n += 1;
            }
            dir.join(name)
        })
        .collect()
}

fn write_report(report: &Report, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = report.to_json_pretty()?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// Analyze every input concurrently and write one report per input
pub async fn run(
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    config: &AnalyzerConfig,
    metrics: Option<AnalyzerMetrics>,
    format: OutputFormat,
) -> Result<()> {
    let targets = report_paths(&inputs, output);

    let handles: Vec<_> = inputs
        .iter()
        .map(|input| {
            tokio::spawn(analyze_in_background(
                input.clone(),
                config.clone(),
                metrics.clone(),
            ))
        })
        .collect();

    let mut summaries = Vec::new();
    let mut failures = 0;
    for ((input, target), handle) in inputs.iter().zip(&targets).zip(handles) {
        let outcome = match handle.await {
            Ok(result) => result,
            Err(e) => Err(anyhow::Error::new(e).context("Analysis task panicked")),
        }
        .and_then(|report| write_report(&report, target).map(|_| report));

        match outcome {
            Ok(report) => {
                if report.metadata.invalid_entries > 0 && format == OutputFormat::Table {
                    print_warning(&format!(
                        "{}: skipped {} invalid entries",
                        input.display(),
                        report.metadata.invalid_entries
                    ));
                }
                summaries.push(BatchSummary {
                    input: input.display().to_string(),
                    report: target.display().to_string(),
                    total_requests: report.summary.total_requests,
                    invalid_entries: report.metadata.invalid_entries,
                    performance_issues: report.performance_issues.len(),
                    anomalies: report.anomalies.len(),
                    total_cost_usd: report.cost_analysis.total_cost_usd,
                });
            }
            Err(e) => {
                failures += 1;
                print_error(&format!("{:#}", e));
            }
        }
    }

    match format {
        OutputFormat::Json => print_json(&summaries)?,
        OutputFormat::Table => {
            if !summaries.is_empty() {
                print_table(
                    summaries.iter().map(BatchRow::from).collect(),
                    "No batches analyzed",
                );
                print_success(&format!("Wrote {} report(s)", summaries.len()));
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} batches failed", failures, inputs.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_input_uses_output_file() {
        let inputs = vec![PathBuf::from("logs/day1.json")];
        assert_eq!(
            report_paths(&inputs, None),
            vec![PathBuf::from(DEFAULT_OUTPUT)]
        );
        assert_eq!(
            report_paths(&inputs, Some(PathBuf::from("out.json"))),
            vec![PathBuf::from("out.json")]
        );
    }

    #[test]
    fn test_several_inputs_write_into_directory() {
        let inputs = vec![
            PathBuf::from("logs/day1.json"),
            PathBuf::from("logs/day2.json"),
        ];
        assert_eq!(
            report_paths(&inputs, Some(PathBuf::from("reports"))),
            vec![
                PathBuf::from("reports/day1.analysis.json"),
                PathBuf::from("reports/day2.analysis.json"),
            ]
        );
    }

    #[test]
    fn test_shared_stems_get_distinct_reports() {
        let inputs = vec![
            PathBuf::from("a/day.json"),
            PathBuf::from("b/day.json"),
            PathBuf::from("c/day.log"),
            PathBuf::from("day-2.json"),
        ];
        assert_eq!(
            report_paths(&inputs, Some(PathBuf::from("reports"))),
            vec![
                PathBuf::from("reports/day.analysis.json"),
                PathBuf::from("reports/day-2.analysis.json"),
                PathBuf::from("reports/day-3.analysis.json"),
                PathBuf::from("reports/day-2-2.analysis.json"),
            ]
        );
    }

    #[test]
    fn test_summary_cost_is_rounded() {
        let summary = BatchSummary {
            input: "logs.json".to_string(),
            report: "out.json".to_string(),
            total_requests: 3,
            invalid_entries: 0,
            performance_issues: 0,
            anomalies: 0,
            total_cost_usd: 0.006999999999999999,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["total_cost_usd"], 0.01);
    }
}

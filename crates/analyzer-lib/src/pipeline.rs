//! Batch analysis pipeline
//!
//! Stages run in a fixed order over one batch:
//! validate config, normalize, sort, aggregate, detect performance issues,
//! estimate cost, detect anomalies, find caching candidates, and finally
//! derive recommendations. Nothing is shared between calls.

use serde_json::Value;
use tracing::{debug, info};

use crate::aggregate::{aggregate, sort_by_timestamp};
use crate::anomaly::AnomalyDetector;
use crate::caching::CachingAnalyzer;
use crate::config::AnalyzerConfig;
use crate::cost::CostEstimator;
use crate::error::{AnalyzerError, Result};
use crate::performance::PerformanceDetector;
use crate::recommendations;
use crate::report::{InputMetadata, Report};
use crate::validation::normalize;

/// Analyze a batch of raw log values
///
/// Malformed records are dropped and counted in the report metadata; only an
/// invalid configuration fails the call.
pub fn analyze(records: &[Value], config: &AnalyzerConfig) -> Result<Report> {
    config.validate()?;

    let outcome = normalize(records);
    let metadata = InputMetadata {
        total_log_entries: records.len(),
        valid_entries: outcome.records.len(),
        invalid_entries: outcome.rejected,
        rejections_by_reason: outcome.rejections_by_reason,
        notice: if records.is_empty() {
            Some(InputMetadata::NO_LOGS.to_string())
        } else if outcome.records.is_empty() {
            Some(InputMetadata::NO_VALID_ENTRIES.to_string())
        } else {
            None
        },
    };

    let mut valid = outcome.records;
    sort_by_timestamp(&mut valid);

    let aggregates = aggregate(&valid, config.top_users_limit);
    debug!(
        endpoints = aggregates.endpoint_stats.len(),
        users = aggregates.top_users.len(),
        "Aggregated batch"
    );

    let performance_issues =
        PerformanceDetector::new(config.response_time, config.error_rate)
            .detect(&aggregates.endpoint_stats);

    let cost_analysis = CostEstimator::new(config.cost).estimate(
        &valid,
        &aggregates.endpoint_stats,
        &performance_issues,
    );

    let anomalies = AnomalyDetector::new(&config.anomaly, config.window_size_secs)
        .detect(&valid, &aggregates.endpoint_stats);

    let caching = CachingAnalyzer::new(config.caching)
        .analyze(&aggregates.endpoint_stats, &cost_analysis);

    let recommendations = recommendations::generate(
        &performance_issues,
        &caching.caching_opportunities,
        &anomalies,
        config.max_recommendations,
    );

    info!(
        event = "analysis_completed",
        total_log_entries = metadata.total_log_entries,
        valid_entries = metadata.valid_entries,
        performance_issues = performance_issues.len(),
        anomalies = anomalies.len(),
        caching_opportunities = caching.caching_opportunities.len(),
        "Analysis completed"
    );

    Ok(Report {
        summary: aggregates.summary,
        endpoint_stats: aggregates.endpoint_stats,
        performance_issues,
        recommendations,
        hourly_distribution: aggregates.hourly_distribution,
        top_users_by_requests: aggregates.top_users,
        cost_analysis,
        anomalies,
        caching_opportunities: caching,
        metadata,
    })
}

/// Analyze a JSON value that must be an array of records
pub fn analyze_value(input: &Value, config: &AnalyzerConfig) -> Result<Report> {
    match input {
        Value::Array(records) => analyze(records, config),
        other => Err(AnalyzerError::InvalidInput(format!(
            "expected an array of log records, got {}",
            json_kind(other)
        ))),
    }
}

/// Parse a JSON document and analyze it
pub fn analyze_str(input: &str, config: &AnalyzerConfig) -> Result<Report> {
    let value: Value = serde_json::from_str(input)?;
    analyze_value(&value, config)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

//! Observability for batch analysis
//!
//! Provides:
//! - Prometheus metrics kept in a private registry (batches, records, anomalies, latency)
//! - Structured event logging with tracing

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use tracing::{info, warn};

use crate::anomaly::Anomaly;
use crate::models::Severity;
use crate::report::Report;

/// Histogram buckets for analysis latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
];

/// Analyzer metrics for Prometheus exposition
///
/// Each instance owns its registry, so several analyzers (or tests) in one
/// process never collide on metric names.
#[derive(Clone)]
pub struct AnalyzerMetrics {
    registry: Registry,
    batches_analyzed: IntCounter,
    records_processed: IntCounter,
    records_rejected: IntCounter,
    anomalies_detected: IntCounterVec,
    performance_issues: IntCounter,
    analysis_latency_seconds: Histogram,
}

impl AnalyzerMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let batches_analyzed = IntCounter::new(
            "apilog_batches_analyzed_total",
            "Number of log batches analyzed",
        )?;
        let records_processed = IntCounter::new(
            "apilog_records_processed_total",
            "Valid log records that went through analysis",
        )?;
        let records_rejected = IntCounter::new(
            "apilog_records_rejected_total",
            "Log records dropped by validation",
        )?;
        let anomalies_detected = IntCounterVec::new(
            Opts::new("apilog_anomalies_detected_total", "Anomalies detected by type"),
            &["type"],
        )?;
        let performance_issues = IntCounter::new(
            "apilog_performance_issues_total",
            "Performance issues detected",
        )?;
        let analysis_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "apilog_analysis_latency_seconds",
                "Time spent analyzing one batch",
            )
            .buckets(LATENCY_BUCKETS.to_vec()),
        )?;

        registry.register(Box::new(batches_analyzed.clone()))?;
        registry.register(Box::new(records_processed.clone()))?;
        registry.register(Box::new(records_rejected.clone()))?;
        registry.register(Box::new(anomalies_detected.clone()))?;
        registry.register(Box::new(performance_issues.clone()))?;
        registry.register(Box::new(analysis_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            batches_analyzed,
            records_processed,
            records_rejected,
            anomalies_detected,
            performance_issues,
            analysis_latency_seconds,
        })
    }

    /// Record one finished batch
    pub fn observe_report(&self, report: &Report, duration_secs: f64) {
        self.batches_analyzed.inc();
        self.records_processed
            .inc_by(report.metadata.valid_entries as u64);
        self.records_rejected
            .inc_by(report.metadata.invalid_entries as u64);
        self.performance_issues
            .inc_by(report.performance_issues.len() as u64);
        for (anomaly_type, count) in report.anomaly_counts() {
            self.anomalies_detected
                .with_label_values(&[anomaly_type])
                .inc_by(count as u64);
        }
        self.analysis_latency_seconds.observe(duration_secs);
    }

    /// Text exposition of every metric in the registry
    pub fn encode(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Structured logger for batch events
///
/// Every event carries the batch source (usually the input path).
#[derive(Clone)]
pub struct StructuredLogger {
    source: String,
}

impl StructuredLogger {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn log_batch_loaded(&self, entries: usize) {
        info!(
            event = "batch_loaded",
            source = %self.source,
            entries = entries,
            "Loaded log batch"
        );
    }

    /// Log validation drops, one event per reason
    pub fn log_rejections(&self, report: &Report) {
        if report.metadata.invalid_entries == 0 {
            return;
        }
        for (reason, count) in &report.metadata.rejections_by_reason {
            warn!(
                event = "records_rejected",
                source = %self.source,
                reason = %reason,
                count = *count,
                "Dropped invalid log records"
            );
        }
    }

    pub fn log_anomaly(&self, anomaly: &Anomaly) {
        let severity = anomaly.severity();
        if severity == Severity::Critical {
            warn!(
                event = "anomaly_detected",
                source = %self.source,
                anomaly_type = anomaly.anomaly_type(),
                subject = %anomaly.subject(),
                severity = %severity,
                "Critical anomaly detected"
            );
        } else {
            info!(
                event = "anomaly_detected",
                source = %self.source,
                anomaly_type = anomaly.anomaly_type(),
                subject = %anomaly.subject(),
                severity = %severity,
                "Anomaly detected"
            );
        }
    }

    pub fn log_completed(&self, report: &Report, duration_secs: f64) {
        info!(
            event = "batch_analyzed",
            source = %self.source,
            total_requests = report.summary.total_requests,
            invalid_entries = report.metadata.invalid_entries,
            anomalies = report.anomalies.len(),
            total_cost_usd = report.cost_analysis.total_cost_usd,
            duration_secs = duration_secs,
            "Batch analysis finished"
        );
    }

    pub fn log_failure(&self, error: &dyn std::fmt::Display) {
        warn!(
            event = "batch_failed",
            source = %self.source,
            error = %error,
            "Batch analysis failed"
        );
    }

    /// Log everything notable about a finished report
    pub fn log_report(&self, report: &Report, duration_secs: f64) {
        self.log_rejections(report);
        for anomaly in &report.anomalies {
            self.log_anomaly(anomaly);
        }
        self.log_completed(report, duration_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use crate::pipeline::analyze;
    use serde_json::json;

    fn report() -> Report {
        let mut records: Vec<_> = (0..100)
            .map(|i| {
                json!({
                    "endpoint": "/api/users",
                    "timestamp": format!("2025-01-15T10:{:02}:00Z", i % 60),
                    "status_code": 200,
                    "response_time_ms": 50,
                    "response_size_bytes": 200,
                    "user_id": if i < 60 { "bot" } else { "human" },
                    "method": "GET"
                })
            })
            .collect();
        records.push(json!({"endpoint": "/api/users"}));
        analyze(&records, &AnalyzerConfig::default()).unwrap()
    }

    #[test]
    fn test_registries_are_independent() {
        // Two instances in one process must both register cleanly
        let first = AnalyzerMetrics::new().unwrap();
        let second = AnalyzerMetrics::new().unwrap();
        first.observe_report(&report(), 0.01);
        assert!(second
            .encode()
            .unwrap()
            .contains("apilog_batches_analyzed_total 0"));
    }

    #[test]
    fn test_observe_report_counts_records_and_anomalies() {
        let metrics = AnalyzerMetrics::new().unwrap();
        metrics.observe_report(&report(), 0.02);

        let text = metrics.encode().unwrap();
        assert!(text.contains("apilog_batches_analyzed_total 1"));
        assert!(text.contains("apilog_records_processed_total 100"));
        assert!(text.contains("apilog_records_rejected_total 1"));
        assert!(text.contains("apilog_anomalies_detected_total{type=\"user_dominance\"} 1"));
        assert!(text.contains("apilog_analysis_latency_seconds_count 1"));
    }

    #[test]
    fn test_structured_logger_source() {
        let logger = StructuredLogger::new("logs/day1.json");
        assert_eq!(logger.source(), "logs/day1.json");
        logger.log_report(&report(), 0.01);
    }
}

//! Anomaly detection over time-windowed traffic
//!
//! This module provides detection for:
//! - Request spikes (window volume far above the endpoint's usual volume)
//! - Response-time degradation (window latency far above the endpoint average)
//! - Error clusters (too many errors inside one window)
//! - User dominance (one user issuing most of the batch)
//!
//! Checks run independently and their results are concatenated in that order.

mod degradation;
mod error_cluster;
mod spike_detector;
mod user_dominance;

pub use degradation::DegradationDetector;
pub use error_cluster::ErrorClusterDetector;
pub use spike_detector::SpikeDetector;
pub use user_dominance::UserDominanceDetector;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::aggregate::EndpointStat;
use crate::config::AnomalyConfig;
use crate::models::{LogRecord, Severity};
use crate::rounding::two_places;
use crate::window::WindowGrouper;

/// A detected anomaly
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Anomaly {
    RequestSpike {
        endpoint: String,
        window_start: DateTime<Utc>,
        /// Mean requests per non-empty window for the endpoint
        #[serde(serialize_with = "two_places")]
        normal_rate: f64,
        actual_rate: u64,
        #[serde(serialize_with = "two_places")]
        ratio: f64,
        severity: Severity,
    },
    ResponseTimeDegradation {
        endpoint: String,
        window_start: DateTime<Utc>,
        #[serde(serialize_with = "two_places")]
        expected_response_time_ms: f64,
        #[serde(serialize_with = "two_places")]
        actual_response_time_ms: f64,
        #[serde(serialize_with = "two_places")]
        ratio: f64,
        severity: Severity,
    },
    ErrorCluster {
        endpoint: String,
        window_start: DateTime<Utc>,
        error_count: u64,
        threshold: u64,
        severity: Severity,
    },
    UserDominance {
        user_id: String,
        request_count: u64,
        #[serde(serialize_with = "two_places")]
        request_percentage: f64,
        #[serde(serialize_with = "two_places")]
        threshold_percentage: f64,
        severity: Severity,
    },
}

impl Anomaly {
    pub fn anomaly_type(&self) -> &'static str {
        match self {
            Anomaly::RequestSpike { .. } => "request_spike",
            Anomaly::ResponseTimeDegradation { .. } => "response_time_degradation",
            Anomaly::ErrorCluster { .. } => "error_cluster",
            Anomaly::UserDominance { .. } => "user_dominance",
        }
    }

    /// Endpoint or user the anomaly is about
    pub fn subject(&self) -> &str {
        match self {
            Anomaly::RequestSpike { endpoint, .. }
            | Anomaly::ResponseTimeDegradation { endpoint, .. }
            | Anomaly::ErrorCluster { endpoint, .. } => endpoint,
            Anomaly::UserDominance { user_id, .. } => user_id,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Anomaly::RequestSpike { severity, .. }
            | Anomaly::ResponseTimeDegradation { severity, .. }
            | Anomaly::ErrorCluster { severity, .. }
            | Anomaly::UserDominance { severity, .. } => *severity,
        }
    }
}

/// Severity for "observed / expected" ratios (spikes, degradation)
pub fn severity_for_ratio(ratio: f64) -> Severity {
    if ratio >= 5.0 {
        Severity::Critical
    } else if ratio >= 3.0 {
        Severity::High
    } else {
        Severity::Medium
    }
}

/// Runs all four checks over one batch
#[derive(Debug, Clone, Copy)]
pub struct AnomalyDetector {
    grouper: WindowGrouper,
    spikes: SpikeDetector,
    degradation: DegradationDetector,
    error_clusters: ErrorClusterDetector,
    user_dominance: UserDominanceDetector,
}

impl AnomalyDetector {
    pub fn new(config: &AnomalyConfig, window_secs: u64) -> Self {
        Self {
            grouper: WindowGrouper::new(window_secs),
            spikes: SpikeDetector::new(config.request_spike_multiplier),
            degradation: DegradationDetector::new(config.response_time_degradation_multiplier),
            error_clusters: ErrorClusterDetector::new(config.error_cluster_threshold),
            user_dominance: UserDominanceDetector::new(config.user_dominance_percentage),
        }
    }

    /// Detect anomalies: spikes, then degradation, clusters and dominance
    ///
    /// Within each check endpoints follow `stats` order and windows are
    /// chronological.
    pub fn detect(&self, records: &[LogRecord], stats: &[EndpointStat]) -> Vec<Anomaly> {
        let windows = self.grouper.group_by_endpoint(records);
        let series: Vec<_> = stats
            .iter()
            .filter_map(|stat| {
                windows
                    .get(stat.endpoint.as_str())
                    .map(|endpoint_windows| (stat, endpoint_windows))
            })
            .collect();

        let mut anomalies = Vec::new();
        for (stat, endpoint_windows) in &series {
            anomalies.extend(self.spikes.detect(&stat.endpoint, endpoint_windows));
        }
        for (stat, endpoint_windows) in &series {
            anomalies.extend(self.degradation.detect(
                &stat.endpoint,
                stat.avg_response_time_ms,
                endpoint_windows,
            ));
        }
        for (stat, endpoint_windows) in &series {
            anomalies.extend(self.error_clusters.detect(&stat.endpoint, endpoint_windows));
        }
        anomalies.extend(self.user_dominance.detect(records));

        debug!(
            anomalies = anomalies.len(),
            endpoints = series.len(),
            window_secs = self.grouper.window_secs(),
            "Anomaly detection finished"
        );
        anomalies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::models::HttpMethod;
    use chrono::{Duration, TimeZone};

    fn record(endpoint: &str, user: &str, offset_secs: i64, status: u16, rt: f64) -> LogRecord {
        LogRecord {
            endpoint: endpoint.to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap()
                + Duration::seconds(offset_secs),
            status_code: status,
            response_time_ms: rt,
            response_size_bytes: 100,
            user_id: user.to_string(),
            method: HttpMethod::Get,
        }
    }

    #[test]
    fn test_severity_for_ratio_is_monotonic() {
        assert_eq!(severity_for_ratio(2.1), Severity::Medium);
        assert_eq!(severity_for_ratio(3.0), Severity::High);
        assert_eq!(severity_for_ratio(4.9), Severity::High);
        assert_eq!(severity_for_ratio(5.0), Severity::Critical);
    }

    #[test]
    fn test_quiet_batch_has_no_anomalies() {
        let records: Vec<_> = (0..40)
            .map(|i| record("/a", &format!("user_{}", i % 4), i * 60, 200, 100.0))
            .collect();
        let stats = aggregate(&records, 5).endpoint_stats;
        let detector = AnomalyDetector::new(&AnomalyConfig::default(), 300);
        assert!(detector.detect(&records, &stats).is_empty());
    }

    #[test]
    fn test_detection_order_is_fixed() {
        // Quiet single-request windows, then one window with 11 slow errors
        let mut records: Vec<_> = (0..30)
            .map(|i| record("/a", &format!("user_{i}"), i * 300, 200, 10.0))
            .collect();
        records.extend((0..11).map(|i| record("/a", "heavy", 30 * 300 + i, 500, 900.0)));
        records.extend((0..40).map(|i| record("/b", "heavy", 30 * 300 + i, 200, 10.0)));

        let stats = aggregate(&records, 5).endpoint_stats;
        let anomalies = AnomalyDetector::new(&AnomalyConfig::default(), 300).detect(&records, &stats);
        let kinds: Vec<_> = anomalies.iter().map(Anomaly::anomaly_type).collect();
        assert_eq!(
            kinds,
            vec![
                "request_spike",
                "response_time_degradation",
                "error_cluster",
                "user_dominance"
            ]
        );
        assert_eq!(anomalies[0].subject(), "/a");
        assert_eq!(anomalies[3].subject(), "heavy");
    }

    #[test]
    fn test_serialized_tag_and_timestamp() {
        let anomaly = Anomaly::ErrorCluster {
            endpoint: "/a".to_string(),
            window_start: Utc.with_ymd_and_hms(2025, 1, 15, 10, 5, 0).unwrap(),
            error_count: 11,
            threshold: 10,
            severity: Severity::High,
        };
        let json = serde_json::to_value(&anomaly).unwrap();
        assert_eq!(json["type"], "error_cluster");
        assert_eq!(json["window_start"], "2025-01-15T10:05:00Z");
        assert_eq!(json["severity"], "high");
    }
}

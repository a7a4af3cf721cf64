//! Performance issue detection
//!
//! Applies the configured latency and error-rate tiers to endpoint stats.
//! An endpoint can produce one latency issue and one error-rate issue.

use serde::Serialize;

use crate::aggregate::EndpointStat;
use crate::config::TierThresholds;
use crate::models::Severity;
use crate::rounding::two_places;

/// A threshold breach on one endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PerformanceIssue {
    SlowEndpoint {
        endpoint: String,
        #[serde(serialize_with = "two_places")]
        avg_response_time_ms: f64,
        #[serde(serialize_with = "two_places")]
        threshold_ms: f64,
        severity: Severity,
    },
    HighErrorRate {
        endpoint: String,
        #[serde(serialize_with = "two_places")]
        error_rate_percentage: f64,
        #[serde(serialize_with = "two_places")]
        threshold_percentage: f64,
        severity: Severity,
    },
}

impl PerformanceIssue {
    pub fn endpoint(&self) -> &str {
        match self {
            PerformanceIssue::SlowEndpoint { endpoint, .. }
            | PerformanceIssue::HighErrorRate { endpoint, .. } => endpoint,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            PerformanceIssue::SlowEndpoint { severity, .. }
            | PerformanceIssue::HighErrorRate { severity, .. } => *severity,
        }
    }

    pub fn is_slow_endpoint(&self) -> bool {
        matches!(self, PerformanceIssue::SlowEndpoint { .. })
    }
}

/// Flags endpoints whose latency or error rate reaches a configured tier
#[derive(Debug, Clone, Copy)]
pub struct PerformanceDetector {
    response_time: TierThresholds,
    error_rate: TierThresholds,
}

impl PerformanceDetector {
    pub fn new(response_time: TierThresholds, error_rate: TierThresholds) -> Self {
        Self {
            response_time,
            error_rate,
        }
    }

    /// Issues for all endpoints, latency before error rate for each endpoint
    pub fn detect(&self, stats: &[EndpointStat]) -> Vec<PerformanceIssue> {
        stats.iter().flat_map(|stat| self.detect_endpoint(stat)).collect()
    }

    fn detect_endpoint(&self, stat: &EndpointStat) -> Vec<PerformanceIssue> {
        let mut issues = Vec::new();

        if let Some(severity) = self.response_time.classify(stat.avg_response_time_ms) {
            issues.push(PerformanceIssue::SlowEndpoint {
                endpoint: stat.endpoint.clone(),
                avg_response_time_ms: stat.avg_response_time_ms,
                threshold_ms: self.response_time.medium,
                severity,
            });
        }

        if stat.request_count > 0 {
            let error_rate = stat.error_rate_percentage();
            if let Some(severity) = self.error_rate.classify(error_rate) {
                issues.push(PerformanceIssue::HighErrorRate {
                    endpoint: stat.endpoint.clone(),
                    error_rate_percentage: error_rate,
                    threshold_percentage: self.error_rate.medium,
                    severity,
                });
            }
        }

        issues
    }
}

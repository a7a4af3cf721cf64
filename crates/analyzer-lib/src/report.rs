//! The assembled analysis report

use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregate::{EndpointStat, HourlyDistribution, Summary, UserRequests};
use crate::anomaly::Anomaly;
use crate::caching::CachingAnalysis;
use crate::cost::CostAnalysis;
use crate::performance::PerformanceIssue;

/// Counts describing the raw input batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InputMetadata {
    pub total_log_entries: usize,
    pub valid_entries: usize,
    pub invalid_entries: usize,
    /// Rejection reason key to count
    pub rejections_by_reason: BTreeMap<String, usize>,
    /// Why a report is empty, when it is
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl InputMetadata {
    pub const NO_LOGS: &'static str = "No logs provided";
    pub const NO_VALID_ENTRIES: &'static str = "No valid log entries found";
}

/// Complete result of one `analyze` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub summary: Summary,
    pub endpoint_stats: Vec<EndpointStat>,
    pub performance_issues: Vec<PerformanceIssue>,
    pub recommendations: Vec<String>,
    pub hourly_distribution: HourlyDistribution,
    pub top_users_by_requests: Vec<UserRequests>,
    pub cost_analysis: CostAnalysis,
    pub anomalies: Vec<Anomaly>,
    pub caching_opportunities: CachingAnalysis,
    pub metadata: InputMetadata,
}

impl Report {
    /// Anomaly counts keyed by anomaly type
    pub fn anomaly_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for anomaly in &self.anomalies {
            *counts.entry(anomaly.anomaly_type()).or_insert(0) += 1;
        }
        counts
    }

    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

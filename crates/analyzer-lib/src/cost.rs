//! Cost estimation
//!
//! Every record costs a flat per-request rate, a per-millisecond execution
//! rate, and a memory rate picked from the response-size tier. Figures are
//! exact in memory; serialization rounds totals to cents and per-request
//! costs to four places.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::aggregate::EndpointStat;
use crate::config::CostConfig;
use crate::models::LogRecord;
use crate::performance::PerformanceIssue;
use crate::rounding::{four_places, two_places};

/// The three additive cost components
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostBreakdown {
    #[serde(serialize_with = "two_places")]
    pub request_costs: f64,
    #[serde(serialize_with = "two_places")]
    pub execution_costs: f64,
    #[serde(serialize_with = "two_places")]
    pub memory_costs: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.request_costs + self.execution_costs + self.memory_costs
    }
}

/// Cost attributed to one endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointCost {
    pub endpoint: String,
    pub request_count: u64,
    #[serde(serialize_with = "two_places")]
    pub total_cost: f64,
    #[serde(serialize_with = "four_places")]
    pub cost_per_request: f64,
}

/// Cost section of the report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostAnalysis {
    #[serde(serialize_with = "two_places")]
    pub total_cost_usd: f64,
    pub cost_breakdown: CostBreakdown,
    /// Most expensive endpoint first
    pub cost_by_endpoint: Vec<EndpointCost>,
    #[serde(serialize_with = "two_places")]
    pub optimization_potential_usd: f64,
}

impl CostAnalysis {
    pub fn empty() -> Self {
        Self {
            total_cost_usd: 0.0,
            cost_breakdown: CostBreakdown::default(),
            cost_by_endpoint: Vec::new(),
            optimization_potential_usd: 0.0,
        }
    }

    pub fn endpoint(&self, endpoint: &str) -> Option<&EndpointCost> {
        self.cost_by_endpoint.iter().find(|c| c.endpoint == endpoint)
    }
}

/// Applies the tiered cost model to a batch
#[derive(Debug, Clone, Copy)]
pub struct CostEstimator {
    config: CostConfig,
}

impl CostEstimator {
    pub fn new(config: CostConfig) -> Self {
        Self { config }
    }

    /// Components charged for a single record
    pub fn record_cost(&self, record: &LogRecord) -> CostBreakdown {
        CostBreakdown {
            request_costs: self.config.per_request,
            execution_costs: record.response_time_ms * self.config.per_millisecond,
            memory_costs: self.config.memory_tiers.rate_for(record.response_size_bytes),
        }
    }

    /// Estimate batch, per-endpoint and recoverable costs
    ///
    /// # Arguments
    /// * `records` - Validated records of the batch
    /// * `stats` - Endpoint stats from the same records (fixes endpoint order)
    /// * `issues` - Performance issues; `slow_endpoint` entries drive the
    ///   optimization potential
    pub fn estimate(
        &self,
        records: &[LogRecord],
        stats: &[EndpointStat],
        issues: &[PerformanceIssue],
    ) -> CostAnalysis {
        if records.is_empty() {
            return CostAnalysis::empty();
        }

        let total_execution_ms: f64 = records.iter().map(|r| r.response_time_ms).sum();
        let breakdown = CostBreakdown {
            request_costs: records.len() as f64 * self.config.per_request,
            execution_costs: total_execution_ms * self.config.per_millisecond,
            memory_costs: records
                .iter()
                .map(|r| self.config.memory_tiers.rate_for(r.response_size_bytes))
                .sum(),
        };

        let mut per_endpoint: HashMap<&str, f64> = HashMap::new();
        for record in records {
            *per_endpoint.entry(record.endpoint.as_str()).or_insert(0.0) +=
                self.record_cost(record).total();
        }

        let mut cost_by_endpoint: Vec<EndpointCost> = stats
            .iter()
            .map(|stat| {
                let total_cost = per_endpoint
                    .get(stat.endpoint.as_str())
                    .copied()
                    .unwrap_or(0.0);
                EndpointCost {
                    endpoint: stat.endpoint.clone(),
                    request_count: stat.request_count,
                    total_cost,
                    cost_per_request: if stat.request_count == 0 {
                        0.0
                    } else {
                        total_cost / stat.request_count as f64
                    },
                }
            })
            .collect();
        // Stable: equal costs keep first-seen order
        cost_by_endpoint.sort_by(|a, b| {
            b.total_cost
                .partial_cmp(&a.total_cost)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let slow: HashSet<&str> = issues
            .iter()
            .filter(|issue| issue.is_slow_endpoint())
            .map(PerformanceIssue::endpoint)
            .collect();
        let slow_cost: f64 = cost_by_endpoint
            .iter()
            .filter(|cost| slow.contains(cost.endpoint.as_str()))
            .map(|cost| cost.total_cost)
            .sum();

        let analysis = CostAnalysis {
            total_cost_usd: breakdown.total(),
            cost_breakdown: breakdown,
            cost_by_endpoint,
            optimization_potential_usd: slow_cost * self.config.optimization_fraction,
        };

        debug!(
            total_cost_usd = analysis.total_cost_usd,
            slow_endpoints = slow.len(),
            "Estimated batch cost"
        );
        analysis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::models::{HttpMethod, Severity};
    use chrono::{Duration, TimeZone, Utc};

    fn record(endpoint: &str, rt: f64, size: u64) -> LogRecord {
        LogRecord {
            endpoint: endpoint.to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap() + Duration::seconds(1),
            status_code: 200,
            response_time_ms: rt,
            response_size_bytes: size,
            user_id: "u1".to_string(),
            method: HttpMethod::Get,
        }
    }

    fn estimate(records: &[LogRecord], issues: &[PerformanceIssue]) -> CostAnalysis {
        let stats = aggregate(records, 5).endpoint_stats;
        CostEstimator::new(CostConfig::default()).estimate(records, &stats, issues)
    }

    #[test]
    fn test_empty_batch_costs_nothing() {
        let analysis = estimate(&[], &[]);
        assert_eq!(analysis.total_cost_usd, 0.0);
        assert!(analysis.cost_by_endpoint.is_empty());
    }

    #[test]
    fn test_small_responses_use_first_tier() {
        let records = vec![
            record("/a", 100.0, 200),
            record("/a", 200.0, 512),
            record("/a", 300.0, 1024),
        ];
        let analysis = estimate(&records, &[]);
        let config = CostConfig::default();

        let breakdown = analysis.cost_breakdown;
        assert!((breakdown.memory_costs - 3.0 * config.memory_tiers.small_rate).abs() < 1e-12);
        assert!((breakdown.request_costs - 3.0 * config.per_request).abs() < 1e-12);
        assert!((breakdown.execution_costs - 600.0 * config.per_millisecond).abs() < 1e-12);
    }

    #[test]
    fn test_components_add_up() {
        let records = vec![
            record("/a", 1500.0, 50_000),
            record("/b", 20.0, 4096),
            record("/c", 0.0, 0),
        ];
        let analysis = estimate(&records, &[]);
        assert!((analysis.cost_breakdown.total() - analysis.total_cost_usd).abs() < 1e-12);

        let endpoint_sum: f64 = analysis.cost_by_endpoint.iter().map(|c| c.total_cost).sum();
        assert!((endpoint_sum - analysis.total_cost_usd).abs() < 1e-12);
    }

    #[test]
    fn test_endpoints_sorted_by_cost() {
        let records = vec![
            record("/cheap", 1.0, 10),
            record("/pricey", 5000.0, 20_000),
            record("/pricey", 5000.0, 20_000),
        ];
        let analysis = estimate(&records, &[]);
        assert_eq!(analysis.cost_by_endpoint[0].endpoint, "/pricey");
        let pricey = analysis.endpoint("/pricey").unwrap();
        assert!((pricey.cost_per_request - pricey.total_cost / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_optimization_potential_covers_slow_endpoints_only() {
        let records = vec![record("/slow", 3000.0, 100), record("/fast", 10.0, 100)];
        let issues = vec![PerformanceIssue::SlowEndpoint {
            endpoint: "/slow".to_string(),
            avg_response_time_ms: 3000.0,
            threshold_ms: 500.0,
            severity: Severity::Critical,
        }];

        let analysis = estimate(&records, &issues);
        let slow_cost = analysis.endpoint("/slow").unwrap().total_cost;
        assert!((analysis.optimization_potential_usd - slow_cost * 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_error_rate_issue_does_not_count_as_slow() {
        let records = vec![record("/flaky", 10.0, 100)];
        let issues = vec![PerformanceIssue::HighErrorRate {
            endpoint: "/flaky".to_string(),
            error_rate_percentage: 50.0,
            threshold_percentage: 5.0,
            severity: Severity::Critical,
        }];
        assert_eq!(estimate(&records, &issues).optimization_potential_usd, 0.0);
    }
}

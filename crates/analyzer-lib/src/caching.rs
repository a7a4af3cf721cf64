//! Caching opportunity analysis
//!
//! An endpoint is worth caching when it sees enough traffic and that traffic
//! is mostly GET requests. The expected hit rate scales with the GET share
//! and shrinks with the error rate, and savings are priced with the
//! endpoint's own per-request cost.

use serde::Serialize;
use tracing::debug;

use crate::aggregate::EndpointStat;
use crate::config::CachingConfig;
use crate::cost::CostAnalysis;
use crate::rounding::two_places;

/// GET share from which an error-free endpoint earns high confidence
const HIGH_CONFIDENCE_GET_SHARE: f64 = 0.95;

/// Confidence attached to a caching recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

/// Caching recommendation for one endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachingOpportunity {
    pub endpoint: String,
    /// Expected hit rate in percent
    #[serde(serialize_with = "two_places")]
    pub potential_cache_hit_rate: f64,
    pub current_requests: u64,
    pub potential_requests_saved: u64,
    #[serde(serialize_with = "two_places")]
    pub estimated_cost_savings_usd: f64,
    #[serde(serialize_with = "two_places")]
    pub estimated_time_saved_ms: f64,
    pub recommended_ttl_minutes: u64,
    pub recommendation_confidence: Confidence,
}

/// Totals across all recommended endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PotentialSavings {
    pub requests_eliminated: u64,
    #[serde(serialize_with = "two_places")]
    pub cost_savings_usd: f64,
    #[serde(serialize_with = "two_places")]
    pub performance_improvement_ms: f64,
}

/// Caching section of the report
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CachingAnalysis {
    /// Highest savings first
    pub caching_opportunities: Vec<CachingOpportunity>,
    pub total_potential_savings: PotentialSavings,
}

/// Derives cache-worthiness from endpoint stats and costs
#[derive(Debug, Clone, Copy)]
pub struct CachingAnalyzer {
    config: CachingConfig,
}

impl CachingAnalyzer {
    pub fn new(config: CachingConfig) -> Self {
        Self { config }
    }

    /// Expected fraction (0..=1) of requests served from cache
    pub fn hit_rate(&self, stat: &EndpointStat) -> f64 {
        let error_rate = stat.error_rate_percentage() / 100.0;
        (stat.get_share() * self.config.max_hit_rate * (1.0 - error_rate)).clamp(0.0, 1.0)
    }

    pub fn confidence(&self, stat: &EndpointStat) -> Confidence {
        let error_rate = stat.error_rate_percentage() / 100.0;
        if error_rate > self.config.max_error_rate {
            Confidence::Low
        } else if stat.get_share() >= HIGH_CONFIDENCE_GET_SHARE && stat.error_count == 0 {
            Confidence::High
        } else {
            Confidence::Medium
        }
    }

    fn is_candidate(&self, stat: &EndpointStat) -> bool {
        stat.request_count > 0
            && stat.request_count >= self.config.min_request_frequency
            && stat.get_share() >= self.config.min_get_share
    }

    pub fn analyze(&self, stats: &[EndpointStat], costs: &CostAnalysis) -> CachingAnalysis {
        let mut opportunities: Vec<CachingOpportunity> = stats
            .iter()
            .filter(|stat| self.is_candidate(stat))
            .map(|stat| {
                let hit_rate = self.hit_rate(stat);
                let saved = (hit_rate * stat.request_count as f64).floor() as u64;
                let cost_per_request = costs
                    .endpoint(&stat.endpoint)
                    .map(|c| c.cost_per_request)
                    .unwrap_or(0.0);

                CachingOpportunity {
                    endpoint: stat.endpoint.clone(),
                    potential_cache_hit_rate: hit_rate * 100.0,
                    current_requests: stat.request_count,
                    potential_requests_saved: saved,
                    estimated_cost_savings_usd: saved as f64 * cost_per_request,
                    estimated_time_saved_ms: saved as f64 * stat.avg_response_time_ms,
                    recommended_ttl_minutes: self.config.default_ttl_minutes,
                    recommendation_confidence: self.confidence(stat),
                }
            })
            .collect();

        opportunities.sort_by(|a, b| {
            b.estimated_cost_savings_usd
                .partial_cmp(&a.estimated_cost_savings_usd)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let total_potential_savings = opportunities.iter().fold(
            PotentialSavings::default(),
            |mut totals, opportunity| {
                totals.requests_eliminated += opportunity.potential_requests_saved;
                totals.cost_savings_usd += opportunity.estimated_cost_savings_usd;
                totals.performance_improvement_ms += opportunity.estimated_time_saved_ms;
                totals
            },
        );

        debug!(
            opportunities = opportunities.len(),
            requests_eliminated = total_potential_savings.requests_eliminated,
            "Caching analysis finished"
        );

        CachingAnalysis {
            caching_opportunities: opportunities,
            total_potential_savings,
        }
    }
}

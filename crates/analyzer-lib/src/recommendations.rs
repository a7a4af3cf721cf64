//! Human-readable recommendations
//!
//! Pure mapping from detector output to text. Order: performance issues,
//! caching opportunities, then anomalies, truncated to the configured limit.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::anomaly::Anomaly;
use crate::caching::CachingOpportunity;
use crate::models::Severity;
use crate::performance::PerformanceIssue;

/// Build the recommendation list
pub fn generate(
    issues: &[PerformanceIssue],
    opportunities: &[CachingOpportunity],
    anomalies: &[Anomaly],
    limit: usize,
) -> Vec<String> {
    issues
        .iter()
        .map(describe_issue)
        .chain(opportunities.iter().map(describe_opportunity))
        .chain(anomalies.iter().map(describe_anomaly))
        .take(limit)
        .collect()
}

pub fn describe_issue(issue: &PerformanceIssue) -> String {
    match issue {
        PerformanceIssue::SlowEndpoint {
            endpoint,
            avg_response_time_ms,
            threshold_ms,
            ..
        } => format!(
            "Investigate {endpoint} performance (avg {avg_response_time_ms:.2}ms exceeds {threshold_ms}ms threshold)"
        ),
        PerformanceIssue::HighErrorRate {
            endpoint,
            error_rate_percentage,
            severity,
            ..
        } => {
            let alert = format!("Alert: {endpoint} has {error_rate_percentage:.2}% error rate");
            if *severity == Severity::Critical {
                format!("CRITICAL: {alert}")
            } else {
                alert
            }
        }
    }
}

pub fn describe_opportunity(opportunity: &CachingOpportunity) -> String {
    format!(
        "Consider caching for {} ({} requests, {:.0}% cache-hit potential, TTL {} minutes)",
        opportunity.endpoint,
        opportunity.current_requests,
        opportunity.potential_cache_hit_rate,
        opportunity.recommended_ttl_minutes
    )
}

pub fn describe_anomaly(anomaly: &Anomaly) -> String {
    match anomaly {
        Anomaly::RequestSpike {
            endpoint,
            window_start,
            normal_rate,
            actual_rate,
            ..
        } => format!(
            "Request spike on {endpoint} at {}: {actual_rate} requests vs {normal_rate:.1} normally; review rate limits",
            window_label(window_start)
        ),
        Anomaly::ResponseTimeDegradation {
            endpoint,
            window_start,
            actual_response_time_ms,
            ratio,
            ..
        } => format!(
            "Response time on {endpoint} degraded to {actual_response_time_ms:.0}ms at {} ({ratio:.1}x its average)",
            window_label(window_start)
        ),
        Anomaly::ErrorCluster {
            endpoint,
            window_start,
            error_count,
            ..
        } => format!(
            "Error cluster on {endpoint} at {}: {error_count} errors in one window",
            window_label(window_start)
        ),
        Anomaly::UserDominance {
            user_id,
            request_percentage,
            ..
        } => format!(
            "User {user_id} issued {request_percentage:.1}% of all requests; consider per-user rate limiting"
        ),
    }
}

fn window_label(start: &DateTime<Utc>) -> String {
    start.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caching::Confidence;
    use chrono::TimeZone;

    fn slow(endpoint: &str) -> PerformanceIssue {
        PerformanceIssue::SlowEndpoint {
            endpoint: endpoint.to_string(),
            avg_response_time_ms: 1234.5,
            threshold_ms: 500.0,
            severity: Severity::High,
        }
    }

    fn opportunity() -> CachingOpportunity {
        CachingOpportunity {
            endpoint: "/api/products".to_string(),
            potential_cache_hit_rate: 88.2,
            current_requests: 250,
            potential_requests_saved: 220,
            estimated_cost_savings_usd: 0.05,
            estimated_time_saved_ms: 1000.0,
            recommended_ttl_minutes: 15,
            recommendation_confidence: Confidence::High,
        }
    }

    #[test]
    fn test_slow_endpoint_text() {
        assert_eq!(
            describe_issue(&slow("/api/search")),
            "Investigate /api/search performance (avg 1234.50ms exceeds 500ms threshold)"
        );
    }

    #[test]
    fn test_critical_error_rate_prefix() {
        let issue = PerformanceIssue::HighErrorRate {
            endpoint: "/api/pay".to_string(),
            error_rate_percentage: 22.5,
            threshold_percentage: 5.0,
            severity: Severity::Critical,
        };
        assert_eq!(
            describe_issue(&issue),
            "CRITICAL: Alert: /api/pay has 22.50% error rate"
        );
    }

    #[test]
    fn test_order_and_limit() {
        let anomaly = Anomaly::ErrorCluster {
            endpoint: "/api/pay".to_string(),
            window_start: Utc.with_ymd_and_hms(2025, 1, 15, 10, 5, 0).unwrap(),
            error_count: 12,
            threshold: 10,
            severity: Severity::High,
        };

        let all = generate(&[slow("/a")], &[opportunity()], &[anomaly.clone()], 10);
        assert_eq!(all.len(), 3);
        assert!(all[0].starts_with("Investigate /a"));
        assert!(all[1].starts_with("Consider caching for /api/products (250 requests, 88%"));
        assert_eq!(
            all[2],
            "Error cluster on /api/pay at 2025-01-15T10:05:00Z: 12 errors in one window"
        );

        let capped = generate(&[slow("/a"), slow("/b")], &[opportunity()], &[anomaly], 2);
        assert_eq!(capped.len(), 2);
        assert!(capped[1].starts_with("Investigate /b"));
    }
}

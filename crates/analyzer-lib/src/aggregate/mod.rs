//! Summary and per-endpoint aggregation
//!
//! One pass over timestamp-ordered records produces:
//! - The batch summary (counts, time range, mean latency, error rate)
//! - Per-endpoint statistics in first-seen order
//! - The top-users ranking
//! - The hourly request distribution

mod endpoint;
mod summary;

pub use endpoint::EndpointStat;
pub use summary::{HourlyDistribution, Summary, TimeRange, UserRequests};

use std::collections::HashMap;

use crate::models::LogRecord;
use endpoint::EndpointAccumulator;

/// Everything derived from the aggregation pass
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates {
    pub summary: Summary,
    pub endpoint_stats: Vec<EndpointStat>,
    pub top_users: Vec<UserRequests>,
    pub hourly_distribution: HourlyDistribution,
}

/// Order records by timestamp; records sharing a timestamp keep input order
pub fn sort_by_timestamp(records: &mut [LogRecord]) {
    records.sort_by_key(|r| r.timestamp);
}

/// Aggregate records, expected in timestamp order
pub fn aggregate(records: &[LogRecord], top_users_limit: usize) -> Aggregates {
    let mut time_range: Option<TimeRange> = None;
    let mut total_response_time_ms = 0.0;
    let mut error_count = 0u64;

    let mut endpoints: Vec<EndpointAccumulator> = Vec::new();
    let mut endpoint_index: HashMap<&str, usize> = HashMap::new();
    let mut users: Vec<UserRequests> = Vec::new();
    let mut user_index: HashMap<&str, usize> = HashMap::new();
    let mut hourly_distribution = HourlyDistribution::new();

    for record in records {
        time_range = Some(TimeRange::extend(time_range, record.timestamp));
        total_response_time_ms += record.response_time_ms;
        if record.is_error() {
            error_count += 1;
        }

        let idx = *endpoint_index
            .entry(record.endpoint.as_str())
            .or_insert_with(|| {
                endpoints.push(EndpointAccumulator::new(&record.endpoint));
                endpoints.len() - 1
            });
        endpoints[idx].record(record);

        let idx = *user_index.entry(record.user_id.as_str()).or_insert_with(|| {
            users.push(UserRequests {
                user_id: record.user_id.clone(),
                request_count: 0,
            });
            users.len() - 1
        });
        users[idx].request_count += 1;

        *hourly_distribution
            .entry(summary::hour_key(record.timestamp))
            .or_insert(0) += 1;
    }

    let total = records.len() as u64;
    let batch_summary = if total == 0 {
        Summary::empty()
    } else {
        Summary {
            total_requests: total,
            time_range,
            avg_response_time_ms: total_response_time_ms / total as f64,
            error_rate_percentage: error_count as f64 * 100.0 / total as f64,
        }
    };

    Aggregates {
        summary: batch_summary,
        endpoint_stats: endpoints.into_iter().map(EndpointAccumulator::finish).collect(),
        top_users: summary::top_users(users, top_users_limit),
        hourly_distribution,
    }
}

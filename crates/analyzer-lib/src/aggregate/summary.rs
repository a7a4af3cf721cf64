//! Batch-wide summary, user ranking and hourly distribution

use std::collections::BTreeMap;

use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;

use crate::rounding::two_places;

/// First and last request timestamps of the batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub(crate) fn extend(range: Option<Self>, ts: DateTime<Utc>) -> Self {
        match range {
            Some(range) => Self {
                start: range.start.min(ts),
                end: range.end.max(ts),
            },
            None => Self { start: ts, end: ts },
        }
    }
}

/// Global request/response statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_requests: u64,
    /// `None` when the batch has no valid records
    pub time_range: Option<TimeRange>,
    #[serde(serialize_with = "two_places")]
    pub avg_response_time_ms: f64,
    #[serde(serialize_with = "two_places")]
    pub error_rate_percentage: f64,
}

impl Summary {
    pub fn empty() -> Self {
        Self {
            total_requests: 0,
            time_range: None,
            avg_response_time_ms: 0.0,
            error_rate_percentage: 0.0,
        }
    }
}

/// Entry of the top-users ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRequests {
    pub user_id: String,
    pub request_count: u64,
}

/// Requests per UTC hour-of-day (`"HH:00"`), summed across days
pub type HourlyDistribution = BTreeMap<String, u64>;

pub(crate) fn hour_key(ts: DateTime<Utc>) -> String {
    format!("{:02}:00", ts.hour())
}

/// Rank users by request count; `users` is in first-seen order, which breaks ties
pub(crate) fn top_users(users: Vec<UserRequests>, limit: usize) -> Vec<UserRequests> {
    let mut ranked = users;
    // Stable sort keeps first-seen order among equal counts
    ranked.sort_by(|a, b| b.request_count.cmp(&a.request_count));
    ranked.truncate(limit);
    ranked
}

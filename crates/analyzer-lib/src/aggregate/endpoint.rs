//! Per-endpoint statistics

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::LogRecord;
use crate::rounding::two_places;

/// Request statistics for a single endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointStat {
    pub endpoint: String,
    pub request_count: u64,
    #[serde(serialize_with = "two_places")]
    pub avg_response_time_ms: f64,
    #[serde(serialize_with = "two_places")]
    pub slowest_request_ms: f64,
    #[serde(serialize_with = "two_places")]
    pub fastest_request_ms: f64,
    pub error_count: u64,
    /// Most frequent status; ties go to the lowest code
    pub most_common_status: u16,
    pub status_codes: BTreeMap<u16, u64>,
    /// Requests made with a cacheable method
    pub get_request_count: u64,
    #[serde(skip)]
    pub total_response_time_ms: f64,
}

impl EndpointStat {
    /// Error share in percent, 0.0 for an endpoint without requests
    pub fn error_rate_percentage(&self) -> f64 {
        if self.request_count == 0 {
            return 0.0;
        }
        self.error_count as f64 * 100.0 / self.request_count as f64
    }

    /// Fraction (0..=1) of requests made with a cacheable method
    pub fn get_share(&self) -> f64 {
        if self.request_count == 0 {
            return 0.0;
        }
        self.get_request_count as f64 / self.request_count as f64
    }
}

/// Running totals for one endpoint during the aggregation pass
#[derive(Debug, Clone)]
pub(crate) struct EndpointAccumulator {
    endpoint: String,
    request_count: u64,
    error_count: u64,
    get_request_count: u64,
    total_response_time_ms: f64,
    min_response_time_ms: f64,
    max_response_time_ms: f64,
    status_codes: BTreeMap<u16, u64>,
}

impl EndpointAccumulator {
    pub(crate) fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            request_count: 0,
            error_count: 0,
            get_request_count: 0,
            total_response_time_ms: 0.0,
            min_response_time_ms: f64::INFINITY,
            max_response_time_ms: f64::NEG_INFINITY,
            status_codes: BTreeMap::new(),
        }
    }

    pub(crate) fn record(&mut self, record: &LogRecord) {
        self.request_count += 1;
        self.total_response_time_ms += record.response_time_ms;
        self.min_response_time_ms = self.min_response_time_ms.min(record.response_time_ms);
        self.max_response_time_ms = self.max_response_time_ms.max(record.response_time_ms);
        *self.status_codes.entry(record.status_code).or_insert(0) += 1;

        if record.is_error() {
            self.error_count += 1;
        }
        if record.method.is_cacheable() {
            self.get_request_count += 1;
        }
    }

    pub(crate) fn finish(self) -> EndpointStat {
        let most_common_status = self
            .status_codes
            .iter()
            .fold(None, |best: Option<(u16, u64)>, (&code, &count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((code, count)),
            })
            .map(|(code, _)| code)
            .unwrap_or(0);

        let (avg, fastest, slowest) = if self.request_count == 0 {
            (0.0, 0.0, 0.0)
        } else {
            (
                self.total_response_time_ms / self.request_count as f64,
                self.min_response_time_ms,
                self.max_response_time_ms,
            )
        };

        EndpointStat {
            endpoint: self.endpoint,
            request_count: self.request_count,
            avg_response_time_ms: avg,
            slowest_request_ms: slowest,
            fastest_request_ms: fastest,
            error_count: self.error_count,
            most_common_status,
            status_codes: self.status_codes,
            get_request_count: self.get_request_count,
            total_response_time_ms: self.total_response_time_ms,
        }
    }
}

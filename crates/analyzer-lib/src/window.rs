//! Fixed-size time windows
//!
//! Window boundaries are multiples of the window size counted from the Unix
//! epoch, so overlapping batches always agree on where a window starts. Only
//! windows holding at least one record are materialized.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::models::LogRecord;

/// Per-endpoint counters for one window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowBucket {
    pub request_count: u64,
    pub error_count: u64,
    pub total_response_time_ms: f64,
}

impl WindowBucket {
    fn record(&mut self, record: &LogRecord) {
        self.request_count += 1;
        self.total_response_time_ms += record.response_time_ms;
        if record.is_error() {
            self.error_count += 1;
        }
    }

    pub fn avg_response_time_ms(&self) -> f64 {
        if self.request_count == 0 {
            return 0.0;
        }
        self.total_response_time_ms / self.request_count as f64
    }
}

/// Chronological windows of one endpoint
pub type EndpointWindows = BTreeMap<DateTime<Utc>, WindowBucket>;

/// Buckets records into epoch-aligned windows
#[derive(Debug, Clone, Copy)]
pub struct WindowGrouper {
    window_secs: i64,
}

impl WindowGrouper {
    /// Create a grouper; a zero size is clamped to one second
    pub fn new(window_secs: u64) -> Self {
        Self {
            window_secs: window_secs.clamp(1, i64::MAX as u64) as i64,
        }
    }

    pub fn window_secs(&self) -> i64 {
        self.window_secs
    }

    /// Floor `ts` to the start of its window
    pub fn window_start(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let secs = ts.timestamp();
        let start = secs - secs.rem_euclid(self.window_secs);
        DateTime::from_timestamp(start, 0).unwrap_or(ts)
    }

    /// Group records by window start
    pub fn group<'a>(&self, records: &'a [LogRecord]) -> BTreeMap<DateTime<Utc>, Vec<&'a LogRecord>> {
        let mut windows: BTreeMap<DateTime<Utc>, Vec<&'a LogRecord>> = BTreeMap::new();
        for record in records {
            windows
                .entry(self.window_start(record.timestamp))
                .or_default()
                .push(record);
        }
        windows
    }

    /// Per-endpoint window counters, derived from [`WindowGrouper::group`]
    pub fn group_by_endpoint<'a>(&self, records: &'a [LogRecord]) -> HashMap<&'a str, EndpointWindows> {
        let mut by_endpoint: HashMap<&'a str, EndpointWindows> = HashMap::new();
        for (start, window) in self.group(records) {
            for record in window {
                by_endpoint
                    .entry(record.endpoint.as_str())
                    .or_default()
                    .entry(start)
                    .or_default()
                    .record(record);
            }
        }
        by_endpoint
    }
}

impl Default for WindowGrouper {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_WINDOW_SECS)
    }
}

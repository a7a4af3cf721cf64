//! User dominance detection

use std::collections::HashMap;

use super::Anomaly;
use crate::models::{LogRecord, Severity};

/// Share (percent) from which a dominating user is critical
const CRITICAL_SHARE_PERCENT: f64 = 80.0;

/// Flags users whose share of the whole batch exceeds a percentage
#[derive(Debug, Clone, Copy)]
pub struct UserDominanceDetector {
    pub threshold_percentage: f64,
}

impl UserDominanceDetector {
    pub fn new(threshold_percentage: f64) -> Self {
        Self {
            threshold_percentage,
        }
    }

    /// Detect dominating users, in first-seen order
    pub fn detect(&self, records: &[LogRecord]) -> Vec<Anomaly> {
        if records.is_empty() {
            return Vec::new();
        }

        let mut order: Vec<&str> = Vec::new();
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for record in records {
            let count = counts.entry(record.user_id.as_str()).or_insert_with(|| {
                order.push(record.user_id.as_str());
                0
            });
            *count += 1;
        }

        let total = records.len() as f64;
        order
            .into_iter()
            .filter_map(|user_id| {
                let count = counts[user_id];
                let share = count as f64 * 100.0 / total;
                (share > self.threshold_percentage).then(|| Anomaly::UserDominance {
                    user_id: user_id.to_string(),
                    request_count: count,
                    request_percentage: share,
                    threshold_percentage: self.threshold_percentage,
                    severity: if share >= CRITICAL_SHARE_PERCENT {
                        Severity::Critical
                    } else {
                        Severity::High
                    },
                })
            })
            .collect()
    }
}

impl Default for UserDominanceDetector {
    fn default() -> Self {
        Self {
            threshold_percentage: 50.0,
        }
    }
}

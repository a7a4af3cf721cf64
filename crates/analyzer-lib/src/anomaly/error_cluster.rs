//! Error cluster detection

use super::Anomaly;
use crate::models::Severity;
use crate::window::EndpointWindows;

/// Flags windows holding more errors than an absolute threshold
#[derive(Debug, Clone, Copy)]
pub struct ErrorClusterDetector {
    /// Error count a window must exceed (strictly)
    pub threshold: u64,
}

impl ErrorClusterDetector {
    pub fn new(threshold: u64) -> Self {
        Self { threshold }
    }

    pub fn detect(&self, endpoint: &str, windows: &EndpointWindows) -> Vec<Anomaly> {
        windows
            .iter()
            .filter(|(_, bucket)| bucket.error_count > self.threshold)
            .map(|(start, bucket)| Anomaly::ErrorCluster {
                endpoint: endpoint.to_string(),
                window_start: *start,
                error_count: bucket.error_count,
                threshold: self.threshold,
                severity: if bucket.error_count > self.threshold.saturating_mul(2) {
                    Severity::Critical
                } else {
                    Severity::High
                },
            })
            .collect()
    }
}

impl Default for ErrorClusterDetector {
    fn default() -> Self {
        Self { threshold: 10 }
    }
}

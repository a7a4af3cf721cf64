//! Response-time degradation detection

use super::{severity_for_ratio, Anomaly};
use crate::window::EndpointWindows;

/// Flags windows whose mean latency exceeds a multiple of the endpoint mean
#[derive(Debug, Clone, Copy)]
pub struct DegradationDetector {
    pub multiplier: f64,
}

impl DegradationDetector {
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }

    /// Detect degraded windows for one endpoint
    ///
    /// # Arguments
    /// * `endpoint` - Endpoint the windows belong to
    /// * `overall_avg_ms` - Mean response time over the whole batch
    /// * `windows` - The endpoint's non-empty windows
    pub fn detect(
        &self,
        endpoint: &str,
        overall_avg_ms: f64,
        windows: &EndpointWindows,
    ) -> Vec<Anomaly> {
        // Zero-latency endpoints cannot degrade relative to themselves
        if overall_avg_ms <= 0.0 {
            return Vec::new();
        }

        windows
            .iter()
            .filter_map(|(start, bucket)| {
                let window_avg = bucket.avg_response_time_ms();
                if window_avg <= self.multiplier * overall_avg_ms {
                    return None;
                }
                let ratio = window_avg / overall_avg_ms;
                Some(Anomaly::ResponseTimeDegradation {
                    endpoint: endpoint.to_string(),
                    window_start: *start,
                    expected_response_time_ms: overall_avg_ms,
                    actual_response_time_ms: window_avg,
                    ratio,
                    severity: severity_for_ratio(ratio),
                })
            })
            .collect()
    }
}

impl Default for DegradationDetector {
    fn default() -> Self {
        Self { multiplier: 2.0 }
    }
}

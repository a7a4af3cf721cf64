//! Request spike detection
//!
//! Compares each window's request count for an endpoint against that
//! endpoint's mean count over all of its non-empty windows, the window under
//! test included.

use super::{severity_for_ratio, Anomaly};
use crate::window::EndpointWindows;

/// Flags windows whose volume exceeds a multiple of the endpoint baseline
#[derive(Debug, Clone, Copy)]
pub struct SpikeDetector {
    /// Multiple of the baseline a window must exceed
    pub multiplier: f64,
}

impl SpikeDetector {
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }

    /// Mean requests per non-empty window
    pub fn baseline(windows: &EndpointWindows) -> f64 {
        if windows.is_empty() {
            return 0.0;
        }
        let total: u64 = windows.values().map(|w| w.request_count).sum();
        total as f64 / windows.len() as f64
    }

    /// Detect spikes for one endpoint, in window order
    pub fn detect(&self, endpoint: &str, windows: &EndpointWindows) -> Vec<Anomaly> {
        let baseline = Self::baseline(windows);
        if baseline <= 0.0 {
            return Vec::new();
        }

        windows
            .iter()
            .filter(|(_, bucket)| bucket.request_count as f64 > self.multiplier * baseline)
            .map(|(start, bucket)| {
                let ratio = bucket.request_count as f64 / baseline;
                Anomaly::RequestSpike {
                    endpoint: endpoint.to_string(),
                    window_start: *start,
                    normal_rate: baseline,
                    actual_rate: bucket.request_count,
                    ratio,
                    severity: severity_for_ratio(ratio),
                }
            })
            .collect()
    }
}

impl Default for SpikeDetector {
    fn default() -> Self {
        Self { multiplier: 3.0 }
    }
}

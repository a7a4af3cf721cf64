//! Analyzer configuration
//!
//! Every threshold used by the pipeline lives in [`AnalyzerConfig`], which is
//! passed explicitly into [`crate::analyze`]. Overrides come from an optional
//! config file and `APILOG_*` environment variables layered over the defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnalyzerError, Result};
use crate::models::Severity;

/// Default anomaly/grouping window (5 minutes)
pub const DEFAULT_WINDOW_SECS: u64 = 5 * 60;

/// Default size of the top-users ranking
pub const DEFAULT_TOP_USERS_LIMIT: usize = 5;

/// Default cap on generated recommendation strings
pub const DEFAULT_MAX_RECOMMENDATIONS: usize = 10;

/// Prefix for environment overrides, e.g. `APILOG_ANOMALY__ERROR_CLUSTER_THRESHOLD`
const ENV_PREFIX: &str = "APILOG";

/// Ascending medium/high/critical tiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl TierThresholds {
    pub const fn new(medium: f64, high: f64, critical: f64) -> Self {
        Self {
            medium,
            high,
            critical,
        }
    }

    /// Highest tier reached by `value`, or `None` below the medium tier
    pub fn classify(&self, value: f64) -> Option<Severity> {
        if value >= self.critical {
            Some(Severity::Critical)
        } else if value >= self.high {
            Some(Severity::High)
        } else if value >= self.medium {
            Some(Severity::Medium)
        } else {
            None
        }
    }

    fn validate(&self, field: &'static str) -> Result<()> {
        for (tier, value) in [
            ("medium", self.medium),
            ("high", self.high),
            ("critical", self.critical),
        ] {
            non_negative(field, value).map_err(|_| {
                AnalyzerError::invalid_config(
                    field,
                    format!("{tier} tier must be a non-negative number, got {value}"),
                )
            })?;
        }
        if self.medium > self.high || self.high > self.critical {
            return Err(AnalyzerError::invalid_config(
                field,
                format!(
                    "tiers must ascend (medium {} <= high {} <= critical {})",
                    self.medium, self.high, self.critical
                ),
            ));
        }
        Ok(())
    }
}

/// Per-response memory cost tiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryTiers {
    /// Upper bound (inclusive) of the small tier
    pub small_max_bytes: u64,
    pub small_rate: f64,
    /// Upper bound (inclusive) of the medium tier
    pub medium_max_bytes: u64,
    pub medium_rate: f64,
    /// Rate for anything above `medium_max_bytes`
    pub large_rate: f64,
}

impl MemoryTiers {
    /// Cost of serving a single response of `bytes`
    pub fn rate_for(&self, bytes: u64) -> f64 {
        if bytes <= self.small_max_bytes {
            self.small_rate
        } else if bytes <= self.medium_max_bytes {
            self.medium_rate
        } else {
            self.large_rate
        }
    }
}

impl Default for MemoryTiers {
    fn default() -> Self {
        Self {
            small_max_bytes: 1024,
            small_rate: 0.00001,
            medium_max_bytes: 10 * 1024,
            medium_rate: 0.00005,
            large_rate: 0.0001,
        }
    }
}

/// Cost model rates (USD)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    pub per_request: f64,
    pub per_millisecond: f64,
    pub memory_tiers: MemoryTiers,
    /// Share of a slow endpoint's cost assumed recoverable by fixing it
    pub optimization_fraction: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            per_request: 0.0001,
            per_millisecond: 0.000002,
            memory_tiers: MemoryTiers::default(),
            optimization_fraction: 0.20,
        }
    }
}

/// Anomaly detection thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    pub request_spike_multiplier: f64,
    pub response_time_degradation_multiplier: f64,
    /// Error count a single window must exceed
    pub error_cluster_threshold: u64,
    /// Share of all requests (percent) a single user must exceed
    pub user_dominance_percentage: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            request_spike_multiplier: 3.0,
            response_time_degradation_multiplier: 2.0,
            error_cluster_threshold: 10,
            user_dominance_percentage: 50.0,
        }
    }
}

/// Caching opportunity heuristics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CachingConfig {
    pub min_request_frequency: u64,
    /// Minimum fraction of GET requests (0..=1)
    pub min_get_share: f64,
    /// Error rate (0..=1) above which confidence drops to low
    pub max_error_rate: f64,
    /// Best-case hit rate for a pure-GET, error-free endpoint (0..=1)
    pub max_hit_rate: f64,
    pub default_ttl_minutes: u64,
}

impl Default for CachingConfig {
    fn default() -> Self {
        Self {
            min_request_frequency: 100,
            min_get_share: 0.80,
            max_error_rate: 0.02,
            max_hit_rate: 0.90,
            default_ttl_minutes: 15,
        }
    }
}

/// Full analyzer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Latency tiers in milliseconds
    #[serde(default = "default_response_time")]
    pub response_time: TierThresholds,

    /// Error-rate tiers in percent
    #[serde(default = "default_error_rate")]
    pub error_rate: TierThresholds,

    #[serde(default)]
    pub cost: CostConfig,

    #[serde(default)]
    pub anomaly: AnomalyConfig,

    #[serde(default)]
    pub caching: CachingConfig,

    /// Anomaly/grouping window width in seconds
    #[serde(default = "default_window_size_secs")]
    pub window_size_secs: u64,

    #[serde(default = "default_top_users_limit")]
    pub top_users_limit: usize,

    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: usize,
}

fn default_response_time() -> TierThresholds {
    TierThresholds::new(500.0, 1000.0, 2000.0)
}

fn default_error_rate() -> TierThresholds {
    TierThresholds::new(5.0, 10.0, 15.0)
}

fn default_window_size_secs() -> u64 {
    DEFAULT_WINDOW_SECS
}

fn default_top_users_limit() -> usize {
    DEFAULT_TOP_USERS_LIMIT
}

fn default_max_recommendations() -> usize {
    DEFAULT_MAX_RECOMMENDATIONS
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            response_time: default_response_time(),
            error_rate: default_error_rate(),
            cost: CostConfig::default(),
            anomaly: AnomalyConfig::default(),
            caching: CachingConfig::default(),
            window_size_secs: default_window_size_secs(),
            top_users_limit: default_top_users_limit(),
            max_recommendations: default_max_recommendations(),
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from defaults, an optional file and the environment
    ///
    /// The result is validated; an invalid override is an error rather than
    /// being replaced by its default.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading analyzer config file");
            builder = builder.add_source(config::File::from(path));
        }

        let config: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check every override before any processing begins
    pub fn validate(&self) -> Result<()> {
        self.response_time.validate("response_time")?;
        self.error_rate.validate("error_rate")?;

        non_negative("cost.per_request", self.cost.per_request)?;
        non_negative("cost.per_millisecond", self.cost.per_millisecond)?;
        let tiers = &self.cost.memory_tiers;
        non_negative("cost.memory_tiers.small_rate", tiers.small_rate)?;
        non_negative("cost.memory_tiers.medium_rate", tiers.medium_rate)?;
        non_negative("cost.memory_tiers.large_rate", tiers.large_rate)?;
        if tiers.small_max_bytes > tiers.medium_max_bytes {
            return Err(AnalyzerError::invalid_config(
                "cost.memory_tiers",
                format!(
                    "small_max_bytes ({}) must not exceed medium_max_bytes ({})",
                    tiers.small_max_bytes, tiers.medium_max_bytes
                ),
            ));
        }
        fraction("cost.optimization_fraction", self.cost.optimization_fraction)?;

        positive(
            "anomaly.request_spike_multiplier",
            self.anomaly.request_spike_multiplier,
        )?;
        positive(
            "anomaly.response_time_degradation_multiplier",
            self.anomaly.response_time_degradation_multiplier,
        )?;
        let dominance = self.anomaly.user_dominance_percentage;
        if !(dominance > 0.0 && dominance <= 100.0) {
            return Err(AnalyzerError::invalid_config(
                "anomaly.user_dominance_percentage",
                format!("must be in (0, 100], got {dominance}"),
            ));
        }

        fraction("caching.min_get_share", self.caching.min_get_share)?;
        fraction("caching.max_error_rate", self.caching.max_error_rate)?;
        fraction("caching.max_hit_rate", self.caching.max_hit_rate)?;

        if self.window_size_secs == 0 {
            return Err(AnalyzerError::invalid_config(
                "window_size_secs",
                "window size must be positive",
            ));
        }

        Ok(())
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(AnalyzerError::invalid_config(
            field,
            format!("must be a non-negative number, got {value}"),
        ))
    }
}

fn positive(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AnalyzerError::invalid_config(
            field,
            format!("must be a positive number, got {value}"),
        ))
    }
}

fn fraction(field: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(AnalyzerError::invalid_config(
            field,
            format!("must be within [0, 1], got {value}"),
        ))
    }
}

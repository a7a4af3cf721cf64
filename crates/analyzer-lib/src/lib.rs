//! API access-log analysis library
//!
//! This crate provides the core functionality for:
//! - Validating and normalizing raw log records
//! - Summary, per-endpoint, user and hourly aggregation
//! - Performance issue detection and cost estimation
//! - Time-windowed anomaly detection
//! - Caching opportunity analysis and recommendations
//! - Metrics and structured logging

pub mod aggregate;
pub mod anomaly;
pub mod caching;
pub mod config;
pub mod cost;
pub mod error;
pub mod models;
pub mod observability;
pub mod performance;
pub mod pipeline;
pub mod recommendations;
pub mod report;
pub mod rounding;
pub mod validation;
pub mod window;

pub use config::AnalyzerConfig;
pub use error::{AnalyzerError, Result};
pub use models::*;
pub use observability::{AnalyzerMetrics, StructuredLogger};
pub use pipeline::{analyze, analyze_str, analyze_value};
pub use report::{InputMetadata, Report};

//! Core data models for the analyzer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// HTTP method of a logged request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Other(String),
}

impl HttpMethod {
    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Other(name) => name,
        }
    }

    /// Whether responses to this method are safe to serve from a cache
    pub fn is_cacheable(&self) -> bool {
        matches!(self, HttpMethod::Get)
    }
}

impl From<String> for HttpMethod {
    fn from(name: String) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            "PATCH" => HttpMethod::Patch,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            other => HttpMethod::Other(other.to_string()),
        }
    }
}

impl From<HttpMethod> for String {
    fn from(method: HttpMethod) -> Self {
        method.as_str().to_string()
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated access-log record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub endpoint: String,
    pub timestamp: DateTime<Utc>,
    pub status_code: u16,
    pub response_time_ms: f64,
    pub response_size_bytes: u64,
    pub user_id: String,
    pub method: HttpMethod,
}

impl LogRecord {
    /// 4xx and 5xx responses count as errors
    pub fn is_error(&self) -> bool {
        is_error_status(self.status_code)
    }
}

pub fn is_error_status(status_code: u16) -> bool {
    (400..=599).contains(&status_code)
}

/// Ordinal severity attached to issues and anomalies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parsing_is_case_insensitive() {
        assert_eq!(HttpMethod::from("get".to_string()), HttpMethod::Get);
        assert_eq!(HttpMethod::from("Patch".to_string()), HttpMethod::Patch);
        assert_eq!(
            HttpMethod::from("purge".to_string()),
            HttpMethod::Other("PURGE".to_string())
        );
    }

    #[test]
    fn test_only_get_is_cacheable() {
        assert!(HttpMethod::Get.is_cacheable());
        assert!(!HttpMethod::Post.is_cacheable());
        assert!(!HttpMethod::Other("PURGE".into()).is_cacheable());
    }

    #[test]
    fn test_error_status_range() {
        assert!(!is_error_status(399));
        assert!(is_error_status(400));
        assert!(is_error_status(599));
        assert!(!is_error_status(200));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert_eq!(
            serde_json::to_string(&Severity::Critical).unwrap(),
            "\"critical\""
        );
    }
}

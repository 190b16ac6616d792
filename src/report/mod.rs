//! Structured load-test results
//!
//! This module defines the metrics record produced from a raw k6 console
//! report, and the parser that builds it.

pub mod parser;

pub use parser::{ParseOptions, parse, parse_with_options};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One complete load-test result, produced once per pipeline invocation.
///
/// Immutable after construction; ownership passes to the caller, which may
/// retain it indefinitely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRun {
    pub timestamp: DateTime<Utc>,
    pub metrics: Metrics,
}

impl TestRun {
    pub fn new(metrics: Metrics) -> Self {
        Self {
            timestamp: Utc::now(),
            metrics,
        }
    }
}

/// Global metrics extracted from a raw report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub request_duration: RequestDuration,
    pub total_requests: u64,
    pub iterations: u64,
    pub virtual_users: u32,
    pub max_virtual_users: u32,
    /// Aggregate check pass rate, 0-100.
    pub success_rate: f64,
    pub requests_per_second: f64,
    pub phases: PhaseTimings,
    /// Per-endpoint check outcomes, in report order. The order is the only
    /// correlation key available between a check and its rate line.
    pub endpoints: Vec<EndpointCheck>,
}

/// Request duration percentiles, all in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestDuration {
    pub avg: f64,
    pub min: f64,
    pub med: f64,
    pub max: f64,
    pub p90: f64,
    pub p95: f64,
}

/// Average time spent in each request phase, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseTimings {
    pub blocked: f64,
    pub connecting: f64,
    pub tls_handshake: f64,
    pub sending: f64,
    pub waiting: f64,
    pub receiving: f64,
}

/// Outcome of a single assertion in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointCheck {
    pub method: HttpMethod,
    pub path: String,
    pub success: bool,
    /// Pass rate across all iterations, 0-100.
    pub success_rate: f64,
}

/// HTTP method recognized in a check line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    /// No method token from the fixed vocabulary was present.
    Unknown,
}

impl HttpMethod {
    fn from_token(token: &str) -> Self {
        match token {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            "PATCH" => HttpMethod::Patch,
            _ => HttpMethod::Unknown,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Unknown => "UNKNOWN",
        };
        write!(f, "{}", name)
    }
}

//! k6 console report parser
//!
//! The report is human-oriented console text, not a machine format. Each
//! line is classified exactly once by a single pass over the report, and
//! every metric degrades to its zero default when its line is missing or
//! malformed. A partially-unparseable report is still more useful than no
//! report at all, so nothing in here returns an error.

use super::{EndpointCheck, HttpMethod, Metrics, PhaseTimings, RequestDuration, TestRun};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

static METHOD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(GET|POST|PUT|DELETE|PATCH)\b").unwrap());

static PATH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s(/[\w\-./]*)").unwrap());

static PERCENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([\d.]+)%").unwrap());

static SCALAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":\s*([\d.]+)").unwrap());

static RPS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([\d.]+)/s").unwrap());

static AVG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"avg=([\d.]+)(µs|ms|s)?").unwrap());

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"avg=([\d.]+)(µs|ms|s)?\s+min=([\d.]+)(µs|ms|s)?\s+med=([\d.]+)(µs|ms|s)?\s+max=([\d.]+)(µs|ms|s)?\s+p\(90\)=([\d.]+)(µs|ms|s)?\s+p\(95\)=([\d.]+)(µs|ms|s)?",
    )
    .unwrap()
});

/// Knobs the caller threads into parsing.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Configured test duration, used to derive requests-per-second when the
    /// report does not carry a `<number>/s` token. The generated scripts run
    /// for 10 seconds unless the caller says otherwise.
    pub window: Duration,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(10),
        }
    }
}

/// Parse a raw k6 console report with the default options.
pub fn parse(raw: &str) -> TestRun {
    parse_with_options(raw, &ParseOptions::default())
}

/// Parse a raw k6 console report into a structured [`TestRun`].
///
/// Pure and total: identical input yields a structurally identical result,
/// and malformed or missing sections degrade to zero defaults.
pub fn parse_with_options(raw: &str, options: &ParseOptions) -> TestRun {
    let lines: Vec<&str> = raw.lines().collect();
    let mut scan = ScanState::default();

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();

        if (trimmed.starts_with('✓') || trimmed.starts_with('✗')) && trimmed.contains("status is")
        {
            let rate_line = lines.get(i + 1).copied().filter(|l| l.contains('↳'));
            scan.endpoints.push(parse_check_line(trimmed, rate_line));
        } else if trimmed.contains('↳') {
            // Rate lines are consumed by the check line above them.
        } else if trimmed.contains("checks") {
            if scan.checks_rate.is_none() {
                scan.checks_rate = extract_percent(trimmed);
            }
        } else if trimmed.contains("http_req_failed") {
            if scan.failed_rate.is_none() {
                scan.failed_rate = extract_percent(trimmed);
            }
        } else if trimmed.contains("http_req_duration") {
            if !trimmed.contains("expected_response") && scan.duration.is_none() {
                scan.duration = parse_duration_line(trimmed);
            }
        } else if trimmed.contains("http_req_blocked") {
            set_if_unset(&mut scan.blocked, extract_avg_ms(trimmed));
        } else if trimmed.contains("http_req_connecting") {
            set_if_unset(&mut scan.connecting, extract_avg_ms(trimmed));
        } else if trimmed.contains("http_req_tls_handshaking") {
            set_if_unset(&mut scan.tls_handshake, extract_avg_ms(trimmed));
        } else if trimmed.contains("http_req_sending") {
            set_if_unset(&mut scan.sending, extract_avg_ms(trimmed));
        } else if trimmed.contains("http_req_waiting") {
            set_if_unset(&mut scan.waiting, extract_avg_ms(trimmed));
        } else if trimmed.contains("http_req_receiving") {
            set_if_unset(&mut scan.receiving, extract_avg_ms(trimmed));
        } else if trimmed.contains("http_reqs") {
            if scan.total_requests.is_none() {
                scan.total_requests = extract_scalar(trimmed);
                scan.reported_rps = RPS_RE
                    .captures(trimmed)
                    .and_then(|c| c[1].parse::<f64>().ok());
            }
        } else if trimmed.contains("iterations") {
            set_if_unset(&mut scan.iterations, extract_scalar(trimmed));
        } else if trimmed.contains("vus_max") {
            set_if_unset(&mut scan.vus_max, extract_scalar(trimmed));
        } else if trimmed.contains("vus") {
            set_if_unset(&mut scan.vus, extract_scalar(trimmed));
        }
    }

    TestRun::new(scan.into_metrics(options))
}

/// Intermediate state for the single pass. Every field is `None` until its
/// line is seen, so "first line wins" falls out of the representation.
#[derive(Default)]
struct ScanState {
    endpoints: Vec<EndpointCheck>,
    checks_rate: Option<f64>,
    failed_rate: Option<f64>,
    duration: Option<RequestDuration>,
    blocked: Option<f64>,
    connecting: Option<f64>,
    tls_handshake: Option<f64>,
    sending: Option<f64>,
    waiting: Option<f64>,
    receiving: Option<f64>,
    total_requests: Option<f64>,
    reported_rps: Option<f64>,
    iterations: Option<f64>,
    vus: Option<f64>,
    vus_max: Option<f64>,
}

impl ScanState {
    fn into_metrics(self, options: &ParseOptions) -> Metrics {
        let total_requests = self.total_requests.unwrap_or(0.0);

        // A reported throughput token wins; otherwise derive it from the
        // configured test window. No http_reqs line at all means zero.
        let requests_per_second = match (self.reported_rps, self.total_requests) {
            (Some(rps), _) => rps,
            (None, Some(total)) => {
                let window = options.window.as_secs_f64();
                if window > 0.0 { total / window } else { 0.0 }
            }
            (None, None) => 0.0,
        };

        // The checks line wins over the http_req_failed fallback.
        let success_rate = self
            .checks_rate
            .or(self.failed_rate.map(|failed| 100.0 - failed))
            .unwrap_or(0.0)
            .clamp(0.0, 100.0);

        Metrics {
            request_duration: self.duration.unwrap_or_default(),
            total_requests: total_requests as u64,
            iterations: self.iterations.unwrap_or(0.0) as u64,
            virtual_users: self.vus.unwrap_or(0.0) as u32,
            max_virtual_users: self.vus_max.unwrap_or(0.0) as u32,
            success_rate,
            requests_per_second,
            phases: PhaseTimings {
                blocked: self.blocked.unwrap_or(0.0),
                connecting: self.connecting.unwrap_or(0.0),
                tls_handshake: self.tls_handshake.unwrap_or(0.0),
                sending: self.sending.unwrap_or(0.0),
                waiting: self.waiting.unwrap_or(0.0),
                receiving: self.receiving.unwrap_or(0.0),
            },
            endpoints: self.endpoints,
        }
    }
}

fn set_if_unset(slot: &mut Option<f64>, value: Option<f64>) {
    if slot.is_none() {
        *slot = value;
    }
}

fn parse_check_line(line: &str, rate_line: Option<&str>) -> EndpointCheck {
    let success = line.starts_with('✓');

    let method = METHOD_RE
        .captures(line)
        .map(|c| HttpMethod::from_token(&c[1]))
        .unwrap_or(HttpMethod::Unknown);

    // Scripts that embed the literal path in the check label are parsed
    // verbatim. Otherwise fall back to keyword sniffing; the console format
    // does not carry the real path, so this is a known approximation.
    let path = match PATH_RE.captures(line) {
        Some(c) => c[1].to_string(),
        None => sniff_path(line).to_string(),
    };

    let success_rate = rate_line
        .and_then(extract_percent)
        .unwrap_or(if success { 100.0 } else { 0.0 })
        .clamp(0.0, 100.0);

    EndpointCheck {
        method,
        path,
        success,
        success_rate,
    }
}

fn sniff_path(line: &str) -> &'static str {
    if line.contains("data") {
        "/data"
    } else if line.contains("users") {
        "/users"
    } else if line.contains("auth") {
        "/auth"
    } else {
        "/"
    }
}

fn extract_percent(line: &str) -> Option<f64> {
    PERCENT_RE
        .captures(line)
        .and_then(|c| c[1].parse::<f64>().ok())
}

fn extract_scalar(line: &str) -> Option<f64> {
    SCALAR_RE
        .captures(line)
        .and_then(|c| c[1].parse::<f64>().ok())
}

fn extract_avg_ms(line: &str) -> Option<f64> {
    AVG_RE.captures(line).and_then(|c| {
        let value = c[1].parse::<f64>().ok()?;
        Some(to_millis(value, c.get(2).map_or("", |m| m.as_str())))
    })
}

fn parse_duration_line(line: &str) -> Option<RequestDuration> {
    let c = DURATION_RE.captures(line)?;
    let pair = |value_idx: usize| -> Option<f64> {
        let value = c[value_idx].parse::<f64>().ok()?;
        Some(to_millis(value, c.get(value_idx + 1).map_or("", |m| m.as_str())))
    };

    Some(RequestDuration {
        avg: pair(1)?,
        min: pair(3)?,
        med: pair(5)?,
        max: pair(7)?,
        p90: pair(9)?,
        p95: pair(11)?,
    })
}

/// Normalize a `value<unit>` pair to milliseconds.
fn to_millis(value: f64, unit: &str) -> f64 {
    match unit {
        "µs" | "us" => value / 1000.0,
        "s" => value * 1000.0,
        _ => value,
    }
}

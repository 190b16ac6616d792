use stampede::report::{self, HttpMethod, ParseOptions};
use std::time::Duration;

fn fixture() -> String {
    std::fs::read_to_string("tests/fixtures/k6-report.txt").expect("failed to read fixture")
}

#[test]
fn parses_a_complete_report() {
    let run = report::parse(&fixture());
    let m = &run.metrics;

    assert!((m.success_rate - 98.5).abs() < 1e-9);
    assert_eq!(m.total_requests, 200);
    assert_eq!(m.iterations, 200);
    assert_eq!(m.virtual_users, 10);
    assert_eq!(m.max_virtual_users, 10);
    assert!((m.requests_per_second - 19.973984).abs() < 1e-9);

    let d = m.request_duration;
    assert!((d.avg - 120.5).abs() < 1e-9);
    assert!((d.min - 0.05).abs() < 1e-9);
    assert!((d.med - 110.0).abs() < 1e-9);
    assert!((d.max - 500.0).abs() < 1e-9);
    assert!((d.p90 - 200.0).abs() < 1e-9);
    assert!((d.p95 - 250.0).abs() < 1e-9);

    assert!((m.phases.blocked - 0.0125).abs() < 1e-9);
    assert!((m.phases.waiting - 120.3).abs() < 1e-9);
    assert_eq!(m.phases.tls_handshake, 0.0);
}

#[test]
fn correlates_endpoints_in_report_order() {
    let run = report::parse(&fixture());
    let endpoints = &run.metrics.endpoints;

    assert_eq!(endpoints.len(), 3);

    assert_eq!(endpoints[0].method, HttpMethod::Get);
    assert_eq!(endpoints[0].path, "/users");
    assert!(endpoints[0].success);
    assert_eq!(endpoints[0].success_rate, 98.0);

    assert_eq!(endpoints[1].method, HttpMethod::Post);
    assert_eq!(endpoints[1].path, "/");
    assert!(!endpoints[1].success);
    assert_eq!(endpoints[1].success_rate, 45.0);

    assert_eq!(endpoints[2].method, HttpMethod::Get);
    assert_eq!(endpoints[2].path, "/data");
    assert!(endpoints[2].success);
    assert_eq!(endpoints[2].success_rate, 100.0);
}

#[test]
fn empty_report_yields_zeroed_metrics() {
    let run = report::parse("");
    let m = &run.metrics;

    assert_eq!(m.total_requests, 0);
    assert_eq!(m.iterations, 0);
    assert_eq!(m.virtual_users, 0);
    assert_eq!(m.max_virtual_users, 0);
    assert_eq!(m.success_rate, 0.0);
    assert_eq!(m.requests_per_second, 0.0);
    assert_eq!(m.request_duration.avg, 0.0);
    assert_eq!(m.phases.blocked, 0.0);
    assert!(m.endpoints.is_empty());
}

#[test]
fn parsing_is_pure() {
    let raw = fixture();
    let first = report::parse(&raw);
    let second = report::parse(&raw);

    assert_eq!(first.metrics, second.metrics);
}

#[test]
fn success_rates_stay_within_bounds() {
    let run = report::parse(&fixture());
    let m = &run.metrics;

    assert!((0.0..=100.0).contains(&m.success_rate));
    for endpoint in &m.endpoints {
        assert!((0.0..=100.0).contains(&endpoint.success_rate));
    }
}

#[test]
fn window_option_only_affects_the_fallback() {
    let options = ParseOptions {
        window: Duration::from_secs(20),
    };

    // The fixture reports its own /s token, so the window is ignored.
    let run = report::parse_with_options(&fixture(), &options);
    assert!((run.metrics.requests_per_second - 19.973984).abs() < 1e-9);

    // Without the token, the window drives the derived value.
    let run = report::parse_with_options("  http_reqs....: 100", &options);
    assert!((run.metrics.requests_per_second - 5.0).abs() < 1e-9);
}

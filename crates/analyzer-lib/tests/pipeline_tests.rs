//! End-to-end tests for the analysis pipeline

use analyzer_lib::{
    analyze, analyze_value, anomaly::Anomaly, AnalyzerConfig, AnalyzerError, Report,
};
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};

fn entry(endpoint: &str, offset_secs: i64, status: u16, rt: f64, user: &str) -> Value {
    let ts = Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap() + Duration::seconds(offset_secs);
    json!({
        "timestamp": ts.to_rfc3339(),
        "endpoint": endpoint,
        "method": "GET",
        "response_time_ms": rt,
        "status_code": status,
        "user_id": user,
        "response_size_bytes": 512
    })
}

fn run(records: &[Value]) -> Report {
    analyze(records, &AnalyzerConfig::default()).unwrap()
}

fn of_type<'a>(report: &'a Report, kind: &str) -> Vec<&'a Anomaly> {
    report
        .anomalies
        .iter()
        .filter(|a| a.anomaly_type() == kind)
        .collect()
}

fn mixed_batch() -> Vec<Value> {
    (0..120)
        .map(|i| {
            let endpoint = ["/api/users", "/api/orders", "/api/search"][i % 3];
            let status = if i % 17 == 0 { 503 } else { 200 };
            entry(
                endpoint,
                i as i64 * 45,
                status,
                40.0 + (i % 7) as f64 * 90.0,
                &format!("user_{:03}", i % 9),
            )
        })
        .collect()
}

#[test]
fn test_empty_batch_produces_zero_report() {
    let report = run(&[]);
    assert_eq!(report.summary.total_requests, 0);
    assert!(report.summary.time_range.is_none());
    assert!(report.endpoint_stats.is_empty());
    assert!(report.anomalies.is_empty());
    assert_eq!(report.cost_analysis.total_cost_usd, 0.0);
    assert!(report.recommendations.is_empty());

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["summary"]["time_range"].is_null());
}

#[test]
fn test_total_requests_never_exceeds_input() {
    let mut records = mixed_batch();
    records.push(json!("not a record"));
    records.push(json!({"endpoint": "/api/users"}));

    let report = run(&records);
    assert_eq!(report.summary.total_requests, 120);
    assert_eq!(report.metadata.total_log_entries, 122);
    assert_eq!(report.metadata.valid_entries, 120);
    assert_eq!(report.metadata.invalid_entries, 2);
    assert_eq!(report.metadata.rejections_by_reason["not_an_object"], 1);
}

#[test]
fn test_invalid_record_only_changes_metadata() {
    let records = mixed_batch();
    let baseline = run(&records);

    let mut polluted = records.clone();
    let mut bad = entry("/api/users", 60, 200, 100.0, "user_001");
    bad["status_code"] = json!(700);
    polluted.insert(10, bad);
    let report = run(&polluted);

    assert_eq!(
        report.metadata.invalid_entries,
        baseline.metadata.invalid_entries + 1
    );
    assert_eq!(report.summary, baseline.summary);
    assert_eq!(report.endpoint_stats, baseline.endpoint_stats);
    assert_eq!(report.anomalies, baseline.anomalies);
    assert_eq!(report.cost_analysis, baseline.cost_analysis);
    assert_eq!(report.recommendations, baseline.recommendations);
}

#[test]
fn test_cost_components_add_up() {
    let report = run(&mixed_batch());
    let costs = &report.cost_analysis;
    let breakdown = costs.cost_breakdown;
    let sum = breakdown.request_costs + breakdown.execution_costs + breakdown.memory_costs;
    assert!((sum - costs.total_cost_usd).abs() < 1e-9);
}

#[test]
fn test_analysis_is_idempotent() {
    let records = mixed_batch();
    let first = run(&records);
    let second = run(&records);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_three_small_requests_on_one_endpoint() {
    let records = vec![
        entry("/a", 0, 200, 100.0, "u1"),
        entry("/a", 1, 200, 200.0, "u2"),
        entry("/a", 2, 200, 300.0, "u3"),
    ];
    let report = run(&records);
    let config = AnalyzerConfig::default();

    let stat = &report.endpoint_stats[0];
    assert_eq!(stat.endpoint, "/a");
    assert_eq!(stat.avg_response_time_ms, 200.0);
    assert_eq!(stat.error_count, 0);
    assert_eq!(stat.slowest_request_ms, 300.0);
    assert_eq!(stat.fastest_request_ms, 100.0);

    let expected_memory = 3.0 * config.cost.memory_tiers.small_rate;
    assert!((report.cost_analysis.cost_breakdown.memory_costs - expected_memory).abs() < 1e-12);
}

#[test]
fn test_user_issuing_51_of_100_requests_dominates() {
    let records: Vec<_> = (0..100)
        .map(|i| {
            let user = if i < 51 {
                "whale".to_string()
            } else {
                format!("user_{i}")
            };
            entry("/api/items", i * 60, 200, 80.0, &user)
        })
        .collect();

    let report = run(&records);
    let dominance = of_type(&report, "user_dominance");
    assert_eq!(dominance.len(), 1);
    match dominance[0] {
        Anomaly::UserDominance {
            user_id,
            request_count,
            request_percentage,
            ..
        } => {
            assert_eq!(user_id, "whale");
            assert_eq!(*request_count, 51);
            assert!((request_percentage - 51.0).abs() < 1e-9);
        }
        other => panic!("unexpected anomaly {other:?}"),
    }
}

#[test]
fn test_window_with_four_times_baseline_is_a_spike() {
    // Window 0 has 20 requests, 15 later windows have 4: baseline 5
    let mut records: Vec<_> = (0..20)
        .map(|i| entry("/api/feed", i, 200, 50.0, &format!("user_{}", i % 10)))
        .collect();
    for window in 1..16 {
        for i in 0..4 {
            records.push(entry(
                "/api/feed",
                window * 300 + i * 30,
                200,
                50.0,
                &format!("user_{}", (window + i) % 10),
            ));
        }
    }

    let report = run(&records);
    let spikes = of_type(&report, "request_spike");
    assert_eq!(spikes.len(), 1);
    match spikes[0] {
        Anomaly::RequestSpike {
            window_start,
            normal_rate,
            actual_rate,
            ..
        } => {
            assert_eq!(*window_start, Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap());
            assert_eq!(*normal_rate, 5.0);
            assert_eq!(*actual_rate, 20);
        }
        other => panic!("unexpected anomaly {other:?}"),
    }
}

#[test]
fn test_error_cluster_threshold_is_strict() {
    let errors = |count: i64| -> Vec<Value> {
        (0..count)
            .map(|i| entry("/api/pay", i * 10, 500, 30.0, &format!("user_{i}")))
            .collect()
    };

    let eleven = run(&errors(11));
    assert_eq!(of_type(&eleven, "error_cluster").len(), 1);

    let ten = run(&errors(10));
    assert!(of_type(&ten, "error_cluster").is_empty());
}

#[test]
fn test_timestamps_serialize_as_utc_z() {
    let mut record = entry("/a", 0, 200, 10.0, "u1");
    record["timestamp"] = json!("2025-01-15T12:00:00+02:00");
    let json = serde_json::to_value(run(&[record])).unwrap();
    assert_eq!(json["summary"]["time_range"]["start"], "2025-01-15T10:00:00Z");
    assert_eq!(json["hourly_distribution"]["10:00"], 1);
}

#[test]
fn test_non_array_input_is_rejected() {
    let err = analyze_value(&json!("logs"), &AnalyzerConfig::default()).unwrap_err();
    assert!(matches!(err, AnalyzerError::InvalidInput(_)));
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = AnalyzerConfig::default();
    config.response_time.medium = -1.0;
    let err = analyze(&mixed_batch(), &config).unwrap_err();
    assert!(matches!(err, AnalyzerError::InvalidConfig { .. }));
}

#[test]
fn test_recommendations_are_capped() {
    let mut config = AnalyzerConfig::default();
    config.max_recommendations = 2;
    let records: Vec<_> = (0..6)
        .map(|i| entry(&format!("/slow/{i}"), i * 10, 500, 3000.0, &format!("u{i}")))
        .collect();
    let report = analyze(&records, &config).unwrap();
    assert!(report.performance_issues.len() > 2);
    assert_eq!(report.recommendations.len(), 2);
}

//! Tests for configuration validation

use owlmail_loadgen::config::{LoadConfig, WorkerPoolConfig};

#[test]
fn test_load_config_defaults() {
    let cfg = LoadConfig::default();
    assert_eq!(cfg.host, "192.168.123.200");
    assert_eq!(cfg.port, 1025);
    assert_eq!(cfg.count, 10_000);
    assert_eq!(cfg.concurrency, 20);
    assert!((cfg.rate - 200.0).abs() < f64::EPSILON);
    assert_eq!(cfg.timeout_secs, 10);
    assert_eq!(cfg.from, "test@local");
    assert_eq!(cfg.to, "someone@example.com");
    assert!(!cfg.allow_non_private);
    assert_eq!(cfg.progress_every, 500);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_load_config_invalid_count() {
    assert!(LoadConfig::new().with_count(0).validate().is_err());
}

#[test]
fn test_load_config_invalid_concurrency() {
    assert!(LoadConfig::new().with_concurrency(0).validate().is_err());
}

#[test]
fn test_load_config_invalid_rate() {
    for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        assert!(LoadConfig::new().with_rate(rate).validate().is_err(), "rate {rate} accepted");
    }
}

#[test]
fn test_load_config_invalid_timeout() {
    assert!(LoadConfig::new().with_timeout_secs(0).validate().is_err());
}

#[test]
fn test_load_config_empty_identities() {
    assert!(LoadConfig::new().with_envelope("", "b@local").validate().is_err());
    assert!(LoadConfig::new().with_target("  ", 25).validate().is_err());
}

#[test]
fn test_load_config_from_json() {
    let json = r#"{
        "host": "10.0.0.5",
        "port": 2525,
        "count": 100,
        "rate": 50.0
    }"#;

    let cfg = LoadConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.host, "10.0.0.5");
    assert_eq!(cfg.port, 2525);
    assert_eq!(cfg.count, 100);
    // Unspecified fields keep their defaults.
    assert_eq!(cfg.concurrency, 20);
}

#[test]
fn test_load_config_from_json_rejects_invalid() {
    assert!(LoadConfig::from_json_str(r#"{"count": 0}"#).is_err());
    assert!(LoadConfig::from_json_str("not json").is_err());
}

#[test]
fn test_worker_pool_config_validation() {
    assert!(WorkerPoolConfig::new().validate().is_ok());
    assert!(WorkerPoolConfig::new().with_worker_count(0).validate().is_err());
    assert!(WorkerPoolConfig::new().with_max_queue_depth(0).validate().is_err());
    let tiny_stack = WorkerPoolConfig {
        thread_stack_size: 1024,
        ..WorkerPoolConfig::default()
    };
    assert!(tiny_stack.validate().is_err());
}

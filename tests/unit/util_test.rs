//! Tests for utility functions

use std::time::Duration;

use owlmail_loadgen::util::{init_tracing, per_second};

#[test]
fn test_per_second() {
    assert!((per_second(100, Duration::from_millis(500)) - 200.0).abs() < 1e-9);
    assert_eq!(per_second(5, Duration::ZERO), 0.0);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}

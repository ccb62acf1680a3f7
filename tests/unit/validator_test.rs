//! Tests for the private-address gate

use owlmail_loadgen::core::{check_target, is_eligible, LoadError};

#[test]
fn test_private_address_is_eligible() {
    assert!(is_eligible("10.0.0.5"));
}

#[test]
fn test_public_address_is_not_eligible() {
    assert!(!is_eligible("8.8.8.8"));
}

#[test]
fn test_hostname_is_not_eligible() {
    assert!(!is_eligible("example.com"));
}

#[test]
fn test_gate_rejects_without_override() {
    let err = check_target("8.8.8.8", false).unwrap_err();
    assert!(matches!(err, LoadError::Validation(ref host) if host == "8.8.8.8"));
}

#[test]
fn test_gate_honors_override() {
    assert!(check_target("example.com", true).is_ok());
}

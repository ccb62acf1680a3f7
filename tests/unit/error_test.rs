//! Tests for error types

use std::time::Duration;

use owlmail_loadgen::core::{ErrorKind, LoadError, PoolError, SendError};

#[test]
fn test_validation_error() {
    let err = LoadError::Validation("8.8.8.8".to_string());
    assert_eq!(format!("{}", err), "refusing to send to non-private host: 8.8.8.8");
}

#[test]
fn test_incomplete_error() {
    let err = LoadError::Incomplete { expected: 10, received: 7 };
    assert_eq!(format!("{}", err), "run incomplete: expected 10 outcomes, received 7");
}

#[test]
fn test_pool_error_converts() {
    let err: LoadError = PoolError::PoolShutdown.into();
    assert_eq!(format!("{}", err), "worker pool error: pool has been shut down");
}

#[test]
fn test_send_error_kinds() {
    assert_eq!(SendError::Connect("refused".into()).kind(), ErrorKind::Connect);
    assert_eq!(SendError::Timeout(Duration::from_secs(1)).kind(), ErrorKind::Timeout);
    assert_eq!(SendError::Protocol("554".into()).kind(), ErrorKind::Protocol);
    assert_eq!(SendError::Internal("boom".into()).kind(), ErrorKind::Internal);
}

#[test]
fn test_send_error_display() {
    assert_eq!(
        format!("{}", SendError::Protocol("RCPT TO rejected: 550 no such user".into())),
        "protocol error: RCPT TO rejected: 550 no such user"
    );
    assert_eq!(format!("{}", SendError::Timeout(Duration::from_secs(2))), "timed out after 2s");
}

#[test]
fn test_error_kind_display() {
    assert_eq!(ErrorKind::Timeout.to_string(), "timeout");
    assert_eq!(serde_json::to_string(&ErrorKind::Protocol).unwrap(), "\"protocol\"");
}

//! Black-box tests for the `owlmail-loadgen` binary: exit codes and the
//! human-readable output.

mod support;

use std::process::{Command, Output};

use support::{Behavior, MockSmtpServer};

fn loadgen(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_owlmail-loadgen"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("LOADGEN_HOST")
        .env_remove("LOADGEN_ALLOW_NON_PRIVATE")
        .output()
        .expect("failed to launch binary")
}

#[test]
fn test_public_target_exits_with_refusal() {
    let output = loadgen(&["--host", "8.8.8.8", "--count", "1"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Refusing to send to non-private host: 8.8.8.8"), "stderr: {stderr}");
    assert!(stderr.contains("--allow-non-private"));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_refusal_takes_precedence_over_invalid_options() {
    for bad in [["--rate", "0"], ["--count", "0"]] {
        let output = loadgen(&["--host", "8.8.8.8", bad[0], bad[1]]);

        assert_eq!(output.status.code(), Some(2), "args: {bad:?}");
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("Refusing to send to non-private host: 8.8.8.8"), "stderr: {stderr}");
        assert!(!stderr.contains("invalid configuration"), "stderr: {stderr}");
    }
}

#[test]
fn test_single_send_reports_success() {
    let server = MockSmtpServer::start(Behavior::Accept);
    let port = server.port().to_string();
    let output = loadgen(&[
        "--host", "127.0.0.1", "--port", &port, "--count", "1", "--concurrency", "1", "--rate", "1000",
    ]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&format!("Target SMTP: 127.0.0.1:{port}")), "stdout: {stdout}");
    assert!(stdout.contains("Starting..."));
    assert!(stdout.contains("Done. sent=1 failed=0"), "stdout: {stdout}");
    assert_eq!(server.messages().len(), 1);
}

#[test]
fn test_failed_sends_still_exit_zero() {
    let server = MockSmtpServer::start(Behavior::RejectHandshake);
    let port = server.port().to_string();
    let output = loadgen(&[
        "--host", "127.0.0.1", "--port", &port, "--count", "5", "--concurrency", "5", "--rate", "1000",
    ]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Done. sent=0 failed=5"), "stdout: {stdout}");
}

#[test]
fn test_progress_lines_every_n() {
    let server = MockSmtpServer::start(Behavior::Accept);
    let port = server.port().to_string();
    let output = loadgen(&[
        "--host", "127.0.0.1", "--port", &port, "--count", "4", "--concurrency", "2", "--rate", "1000",
        "--progress-every", "2",
    ]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let progress: Vec<&str> = stdout.lines().filter(|l| l.starts_with("Progress ")).collect();
    assert_eq!(progress.len(), 2, "stdout: {stdout}");
    assert!(progress[0].starts_with("Progress 2/4 "));
    assert!(progress[1].starts_with("Progress 4/4 sent=4 failed=0"));
}

#[test]
fn test_json_output() {
    let server = MockSmtpServer::start(Behavior::Accept);
    let port = server.port().to_string();
    let output = loadgen(&[
        "--host", "127.0.0.1", "--port", &port, "--count", "2", "--rate", "1000", "--json",
    ]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let events: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert_eq!(events.first().map(|e| e["event"].clone()), Some("started".into()));
    let last = events.last().expect("finished event");
    assert_eq!(last["event"], "finished");
    assert_eq!(last["sent"], 2);
    assert_eq!(last["failed"], 0);
}

#[test]
fn test_invalid_arguments_exit_one() {
    let output = loadgen(&["--host", "127.0.0.1", "--count", "0"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid configuration"), "stderr: {stderr}");
}

//! Tests for message synthesis

use std::collections::HashSet;
use std::thread;

use owlmail_loadgen::core::synthesize;

#[test]
fn test_payloads_are_unique_across_indices() {
    let rendered: HashSet<String> = (1..=500)
        .map(|i| synthesize(i, "test@local", "someone@example.com").render())
        .collect();
    assert_eq!(rendered.len(), 500);
}

#[test]
fn test_message_ids_are_unique_across_indices() {
    let ids: HashSet<String> = (1..=500)
        .map(|i| synthesize(i, "test@local", "someone@example.com").message_id)
        .collect();
    assert_eq!(ids.len(), 500);
}

#[test]
fn test_concurrent_synthesis() {
    let handles: Vec<_> = (0..8_u64)
        .map(|t| {
            thread::spawn(move || {
                (1..=50_u64)
                    .map(|i| synthesize(t * 100 + i, "a@local", "b@local").render())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut all = HashSet::new();
    for handle in handles {
        for payload in handle.join().unwrap() {
            assert!(all.insert(payload));
        }
    }
    assert_eq!(all.len(), 400);
}

#[test]
fn test_payload_embeds_index() {
    let payload = synthesize(42, "a@local", "b@local");
    let text = payload.render();
    assert!(text.contains("Subject: owlmail load test #42 "));
    assert!(text.contains("Message-ID: <loadtest-42-"));
    assert!(text.contains("\r\n\r\nIndex: 42\r\n"));
    assert!(text.lines().all(|line| line.len() <= 998));
}

#[test]
fn test_message_id_and_date_share_one_instant() {
    for index in 1..=20 {
        let payload = synthesize(index, "test@local", "someone@example.com");

        let micros: i64 = payload
            .message_id
            .trim_start_matches(&format!("<loadtest-{index}-"))
            .trim_end_matches("@local>")
            .parse()
            .expect("numeric timestamp in Message-ID");
        let date = chrono::DateTime::parse_from_rfc2822(payload.header("Date").expect("Date header"))
            .expect("RFC 2822 date");

        assert_eq!(micros.div_euclid(1_000_000), date.timestamp(), "{}", payload.message_id);
    }
}

//! Integration tests for RateGate pacing under contention.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use owlmail_loadgen::core::RateGate;

#[test]
fn test_gate_spaces_admissions_across_threads() {
    let gate = Arc::new(RateGate::new(100.0));
    let admitted = Arc::new(parking_lot::Mutex::new(Vec::with_capacity(40)));

    let start = Instant::now();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let gate = Arc::clone(&gate);
            let admitted = Arc::clone(&admitted);
            thread::spawn(move || {
                for _ in 0..5 {
                    gate.admit();
                    admitted.lock().push(Instant::now());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread panicked");
    }
    let elapsed = start.elapsed();

    // 40 admissions at 100/s: 39 gaps of 10ms.
    assert_eq!(admitted.lock().len(), 40);
    assert!(elapsed >= Duration::from_millis(385), "too fast: {elapsed:?}");
}

#[test]
fn test_admitted_count_stays_under_ceiling() {
    let rate = 50.0;
    let gate = RateGate::new(rate);

    let start = Instant::now();
    let mut admitted = 0_u32;
    while start.elapsed() < Duration::from_millis(300) {
        if gate.try_admit().is_none() {
            admitted += 1;
        }
    }
    let elapsed = start.elapsed().as_secs_f64();

    // At most rate * elapsed, plus the first admission at t = 0.
    assert!(f64::from(admitted) <= rate.mul_add(elapsed, 1.0), "admitted {admitted} in {elapsed}s");
    assert!(admitted >= 10);
}

#[test]
fn test_first_admission_is_immediate() {
    let gate = RateGate::new(0.5);
    let start = Instant::now();
    assert!(gate.admit() < Duration::from_millis(50));
    assert!(start.elapsed() < Duration::from_millis(50));
    assert!(gate.try_admit().is_some());
}

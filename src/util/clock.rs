//! Throughput arithmetic.

use std::time::Duration;

/// Events per second over `elapsed`, or zero when no time has passed.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn per_second(events: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        events as f64 / secs
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_second_zero_elapsed() {
        assert_eq!(per_second(10, Duration::ZERO), 0.0);
    }

    #[test]
    fn test_per_second() {
        let rate = per_second(500, Duration::from_secs(2));
        assert!((rate - 250.0).abs() < f64::EPSILON);
    }
}

//! Utility functions for frame encoding and timing arithmetic.

pub mod image_encoding;

use std::time::Duration;

/// Fraction of `required` covered by `elapsed`, clamped to `0.0..=1.0`
///
/// A zero `required` counts as already satisfied.
#[must_use]
pub fn duration_ratio(elapsed: Duration, required: Duration) -> f64 {
    if required.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / required.as_secs_f64()).clamp(0.0, 1.0)
}

/// Whole seconds left until `elapsed` reaches `required`, rounded up
pub fn ceil_seconds(elapsed: Duration, required: Duration) -> u64 {
    let remaining = required.saturating_sub(elapsed);
    let secs = remaining.as_secs();
    if remaining.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

/// Milliseconds of a duration, saturating at `u64::MAX`
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_duration_ratio() {
        let required = Duration::from_secs(3);
        assert_eq!(duration_ratio(Duration::ZERO, required), 0.0);
        assert!((duration_ratio(Duration::from_millis(1500), required) - 0.5).abs() < 1e-12);
        assert_eq!(duration_ratio(Duration::from_secs(5), required), 1.0);
        assert_eq!(duration_ratio(Duration::ZERO, Duration::ZERO), 1.0);
    }

    #[test]
    fn test_ceil_seconds() {
        let required = Duration::from_secs(3);
        assert_eq!(ceil_seconds(Duration::ZERO, required), 3);
        assert_eq!(ceil_seconds(Duration::from_millis(50), required), 3);
        assert_eq!(ceil_seconds(Duration::from_millis(1000), required), 2);
        assert_eq!(ceil_seconds(Duration::from_millis(2999), required), 1);
        assert_eq!(ceil_seconds(Duration::from_secs(3), required), 0);
        assert_eq!(ceil_seconds(Duration::from_secs(10), required), 0);
    }

    proptest! {
        #[test]
        fn test_ratio_stays_in_unit_range(elapsed in 0u64..100_000, required in 0u64..100_000) {
            let ratio = duration_ratio(Duration::from_millis(elapsed), Duration::from_millis(required));
            prop_assert!((0.0..=1.0).contains(&ratio));
        }

        #[test]
        fn test_ceil_seconds_never_exceeds_required(elapsed in 0u64..100_000, required in 0u64..100_000) {
            let secs = ceil_seconds(Duration::from_millis(elapsed), Duration::from_millis(required));
            prop_assert!(secs * 1000 < required + 1000);
            prop_assert_eq!(secs == 0, elapsed >= required);
        }
    }
}

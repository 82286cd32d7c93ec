//! ---
//! wiresim_section: "01-core-functionality"
//! wiresim_subsection: "module"
//! wiresim_type: "source"
//! wiresim_scope: "code"
//! wiresim_description: "Shared primitives and utilities for the simulator runtime."
//! wiresim_version: "v0.0.0-prealpha"
//! wiresim_owner: "tbd"
//! ---
use std::time::Duration;

/// Scale a duration by an exact rational fraction.
///
/// All signalling waits are fractions of the configured pulse width, so the
/// numerator multiplication happens before the division to avoid rounding
/// the base duration twice.
pub fn scale(duration: Duration, numerator: u32, denominator: u32) -> Duration {
    duration * numerator / denominator
}

/// Convert a duration into microseconds, saturating at `u64::MAX`.
pub fn duration_to_micros(duration: Duration) -> u64 {
    duration.as_secs().saturating_mul(1_000_000) + u64::from(duration.subsec_micros())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_keeps_sub_millisecond_precision() {
        let pulse = Duration::from_millis(450);
        assert_eq!(scale(pulse, 1, 2), Duration::from_millis(225));
        assert_eq!(scale(pulse, 3, 4), Duration::from_micros(337_500));
        assert_eq!(scale(pulse, 7, 10), Duration::from_millis(315));
    }

    #[test]
    fn micros_conversion_counts_subsecond_part() {
        assert_eq!(duration_to_micros(Duration::from_millis(1)), 1_000);
        assert_eq!(duration_to_micros(Duration::new(2, 250_000_000)), 2_250_000);
    }
}

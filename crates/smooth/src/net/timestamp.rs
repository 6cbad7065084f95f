pub const NETWORK_TIME_PRECISION: f64 = 100.0;

pub const NETWORK_TIME_BITS: u32 = 16;

const HALF_RANGE: i64 = 1 << (NETWORK_TIME_BITS - 1);
const MASK: i64 = (1 << NETWORK_TIME_BITS) - 1;

#[inline]
pub fn wrap_network_time(ticks: i64) -> i32 {
    ((ticks.wrapping_add(HALF_RANGE) & MASK) - HALF_RANGE) as i32
}

pub fn network_time(local_time: f64, delta: f64, precision: f64) -> i32 {
    let ticks = ((local_time - delta) * precision + 0.5).floor() as i64;
    wrap_network_time(ticks)
}

/// Signed tick difference from `earlier` to `later`, valid while the real
/// gap is under half the wrap period.
#[inline]
pub fn network_elapsed(earlier: i32, later: i32) -> i32 {
    wrap_network_time(i64::from(later) - i64::from(earlier))
}

pub fn network_to_local_time(timestamp: i32, now: f64, delta: f64, precision: f64) -> f64 {
    let now_network = network_time(now, delta, precision);
    let diff = network_elapsed(now_network, timestamp);
    now + f64::from(diff) / precision
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_into_signed_16_bits() {
        assert_eq!(wrap_network_time(40000), -25536);
        assert_eq!(wrap_network_time(32767), 32767);
        assert_eq!(wrap_network_time(32768), -32768);
        assert_eq!(wrap_network_time(-32769), 32767);
        assert_eq!(wrap_network_time(65536 + 5), 5);
        assert_eq!(wrap_network_time(i64::MAX), -1);
        assert_eq!(wrap_network_time(i64::MIN), 0);
    }

    #[test]
    fn degenerate_delta_still_yields_timestamp() {
        // `as i64` saturates huge values and maps NaN to zero.
        assert_eq!(network_time(0.0, -1.0e20, NETWORK_TIME_PRECISION), -1);
        assert_eq!(network_time(0.0, 1.0e20, NETWORK_TIME_PRECISION), 0);
        assert_eq!(network_time(0.0, f64::NAN, NETWORK_TIME_PRECISION), 0);
        assert_eq!(network_time(f64::INFINITY, 0.0, NETWORK_TIME_PRECISION), -1);
    }

    #[test]
    fn network_time_applies_delta_and_rounds() {
        assert_eq!(network_time(400.0, 0.0, NETWORK_TIME_PRECISION), -25536);
        assert_eq!(network_time(12.5, 2.5, NETWORK_TIME_PRECISION), 1000);
        assert_eq!(network_time(0.004, 0.0, NETWORK_TIME_PRECISION), 0);
        assert_eq!(network_time(0.006, 0.0, NETWORK_TIME_PRECISION), 1);
        assert_eq!(network_time(0.0, 1.0, NETWORK_TIME_PRECISION), -100);
    }

    #[test]
    fn elapsed_across_wrap() {
        assert_eq!(network_elapsed(32760, -32766), 10);
        assert_eq!(network_elapsed(-32766, 32760), -10);
        assert_eq!(network_elapsed(100, 150), 50);
    }

    #[test]
    fn local_time_recovered_near_now() {
        let sent_at = 655.30;
        let stamp = network_time(sent_at, 0.0, NETWORK_TIME_PRECISION);
        let recovered = network_to_local_time(stamp, 655.40, 0.0, NETWORK_TIME_PRECISION);
        assert!((recovered - sent_at).abs() < 1e-9);
    }
}

//! Conversion of degree coordinates and wall-clock timestamps to the scaled
//! integers stored in blocks.

/// Fixed coordinate resolution of the format, in units per degree.
pub(crate) const NANODEGREE_RESOLUTION: f64 = 1e9;

/// Scales a degree value to units of `granularity` nanodegrees, rounding
/// half away from zero.
#[inline]
pub(crate) fn lonlat_to_int(degrees: f64, granularity: i32) -> i64 {
    (degrees * NANODEGREE_RESOLUTION / granularity as f64).round() as i64
}

/// Scales epoch seconds to units of `date_granularity` milliseconds.
#[inline]
pub(crate) fn timestamp_to_int(seconds: i64, date_granularity: i32) -> i64 {
    (seconds as f64 * 1000.0 / date_granularity as f64).round() as i64
}

/// Scales a degree value to whole nanodegrees, as used by the header bbox.
#[inline]
pub(crate) fn lonlat_to_nano(degrees: f64) -> i64 {
    (degrees * NANODEGREE_RESOLUTION).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0)]
    #[case(1e-7, 1)]
    #[case(2e-7, 2)]
    #[case(-1e-7, -1)]
    #[case(51.5074, 515_074_000)]
    #[case(-0.1278, -1_278_000)]
    fn scales_degrees_at_default_granularity(#[case] degrees: f64, #[case] expected: i64) {
        assert_eq!(lonlat_to_int(degrees, 100), expected);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        // one second is exactly half a unit at 2000ms granularity
        assert_eq!(timestamp_to_int(1, 2000), 1);
        assert_eq!(timestamp_to_int(-1, 2000), -1);
        assert_eq!(timestamp_to_int(3, 2000), 2);
        assert_eq!(timestamp_to_int(-3, 2000), -2);
    }

    #[test]
    fn coarser_granularity_shrinks_magnitudes() {
        assert_eq!(lonlat_to_int(1e-5, 10_000), 1);
        assert_eq!(timestamp_to_int(3600, 1000), 3600);
        assert_eq!(timestamp_to_int(3600, 60_000), 60);
    }

    #[test]
    fn scaling_is_idempotent_through_unscale() {
        for &degrees in &[0.0, 1e-7, 12.345_678_9, -89.999_999_9] {
            let scaled = lonlat_to_int(degrees, 100);
            let unscaled = scaled as f64 * 100.0 / NANODEGREE_RESOLUTION;
            assert_eq!(lonlat_to_int(unscaled, 100), scaled);
        }
    }

    #[test]
    fn nano_scaling_covers_the_whole_range() {
        assert_eq!(lonlat_to_nano(180.0), 180_000_000_000);
        assert_eq!(lonlat_to_nano(-180.0), -180_000_000_000);
        assert_eq!(lonlat_to_nano(1e-9), 1);
    }
}

//! `timestamp`/`timestamptz` wire codec: signed 64-bit microseconds since
//! 2000-01-01T00:00:00Z (`spec.md` §4.1).

use chrono::{DateTime, TimeZone, Utc};

/// Midnight 2000-01-01 UTC, in milliseconds since the Unix epoch.
const POSTGRES_EPOCH_MILLIS: i64 = 946_684_800_000;

/// Decode wire microseconds into a UTC instant.
///
/// Only millisecond precision survives; sub-millisecond digits are
/// discarded (documented lossy, `spec.md` §4.1/§9).
pub fn decode(micros: i64) -> DateTime<Utc> {
    let rounded_millis = round_div(micros, 1000);
    let unix_millis = rounded_millis.saturating_add(POSTGRES_EPOCH_MILLIS);
    Utc.timestamp_millis_opt(unix_millis)
        .single()
        .unwrap_or_else(|| Utc.timestamp_millis_opt(0).unwrap())
}

/// Encode a UTC instant into wire microseconds since the Postgres epoch.
///
/// Loses no precision finer than what `DateTime<Utc>` itself stores beyond
/// microseconds, matching the wire format's own resolution.
pub fn encode(instant: DateTime<Utc>) -> i64 {
    let unix_micros = instant.timestamp_micros();
    unix_micros.saturating_sub(POSTGRES_EPOCH_MILLIS * 1000)
}

/// Round-towards-nearest integer division (ties away from zero), matching
/// `spec.md`'s "rounded to nearest" rule for `microseconds / 1000`.
fn round_div(numerator: i64, denominator: i64) -> i64 {
    let q = numerator.div_euclid(denominator);
    let r = numerator.rem_euclid(denominator);
    if r * 2 >= denominator {
        q + 1
    } else {
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.from_utc_datetime(
            &NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(h, min, s)
                .unwrap(),
        )
    }

    #[test]
    fn epoch_round_trips_to_zero_micros() {
        let epoch = dt(2000, 1, 1, 0, 0, 0);
        assert_eq!(encode(epoch), 0);
        assert_eq!(decode(0), epoch);
    }

    #[test]
    fn one_day_after_epoch() {
        let day = dt(2000, 1, 2, 0, 0, 0);
        let micros = encode(day);
        assert_eq!(micros, 86_400_000_000);
        assert_eq!(decode(micros), day);
    }

    #[test]
    fn before_epoch_is_negative() {
        let before = dt(1999, 12, 31, 0, 0, 0);
        let micros = encode(before);
        assert!(micros < 0);
        assert_eq!(decode(micros), before);
    }

    #[test]
    fn sub_millisecond_is_truncated_by_rounding() {
        // 500 microseconds rounds up to the next millisecond.
        let base = encode(dt(2024, 6, 1, 12, 0, 0));
        assert_eq!(decode(base + 500), decode(base) + chrono::Duration::milliseconds(1));
        assert_eq!(decode(base + 400), decode(base));
    }
}

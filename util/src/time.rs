//! General time utility functions

use chrono::{self, DateTime, TimeZone, Utc};

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration.num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// The reference epoch used by the trajectory wire format, 2006-01-01T00:00:00Z.
pub fn wire_epoch() -> DateTime<Utc> {
    Utc.ymd(2006, 1, 1).and_hms(0, 0, 0)
}

/// Number of whole milliseconds between the wire epoch and `time`.
///
/// Times before the epoch saturate to zero.
pub fn millis_since_wire_epoch(time: DateTime<Utc>) -> u64 {
    let ms = (time - wire_epoch()).num_milliseconds();
    if ms < 0 { 0 } else { ms as u64 }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duration_to_seconds() {
        let d = chrono::Duration::milliseconds(1500);
        assert_eq!(duration_to_seconds(d), Some(1.5));
    }

    #[test]
    fn test_millis_since_wire_epoch() {
        assert_eq!(millis_since_wire_epoch(wire_epoch()), 0);

        let one_day = Utc.ymd(2006, 1, 2).and_hms(0, 0, 0);
        assert_eq!(millis_since_wire_epoch(one_day), 86_400_000);

        let before = Utc.ymd(2005, 12, 31).and_hms(0, 0, 0);
        assert_eq!(millis_since_wire_epoch(before), 0);
    }
}

//! Date and duration display utilities.

use std::fmt;

use jiff::{tz::TimeZone, Timestamp};

/// A timestamp rendered in the system timezone as `YYYY-MM-DD HH:MM:SS TZ`.
pub struct LocalDateTime<'a>(pub &'a Timestamp);

impl fmt::Display for LocalDateTime<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.0
                .to_zoned(TimeZone::system())
                .strftime("%Y-%m-%d %H:%M:%S %Z")
        )
    }
}

/// A span given in fractional minutes, rendered as `45s`, `12m 30s` or
/// `3h 05m`.
///
/// ```rust
/// use formflow_core::display::datetime::Minutes;
///
/// assert_eq!(Minutes(0.75).to_string(), "45s");
/// assert_eq!(Minutes(12.5).to_string(), "12m 30s");
/// assert_eq!(Minutes(185.0).to_string(), "3h 05m");
/// ```
pub struct Minutes(pub f64);

impl fmt::Display for Minutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seconds = (self.0.max(0.0) * 60.0).round() as u64;
        match (seconds / 3600, (seconds % 3600) / 60, seconds % 60) {
            (0, 0, s) => write!(f, "{s}s"),
            (0, m, s) => write!(f, "{m}m {s:02}s"),
            (h, m, _) => write!(f, "{h}h {m:02}m"),
        }
    }
}

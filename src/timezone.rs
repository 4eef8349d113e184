//! Resolve the server's local timezone.

use time::{OffsetDateTime, PrimitiveDateTime};
use time_tz::{PrimitiveDateTimeExt, Tz};

use crate::Error;

/// Get the timezone for a canonical timezone name, e.g. "Pacific/Auckland".
pub fn get_timezone(canonical_timezone: &str) -> Option<&'static Tz> {
    time_tz::timezones::get_by_name(canonical_timezone)
}

/// Like [get_timezone], but an unknown timezone is an [Error::InvalidTimezoneError].
pub fn timezone_or_error(canonical_timezone: &str) -> Result<&'static Tz, Error> {
    get_timezone(canonical_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(canonical_timezone.to_owned()))
}

/// Interpret a wall clock time in `timezone`, using the offset in effect at that local time.
///
/// An ambiguous time (clocks going back) takes the earlier instant. A time
/// skipped by clocks going forward takes the offset in effect at the same UTC
/// wall time.
pub fn assume_local(date_time: PrimitiveDateTime, timezone: &Tz) -> OffsetDateTime {
    date_time
        .assume_timezone(timezone)
        .take_first()
        .unwrap_or_else(|| date_time.assume_timezone_utc(timezone))
}

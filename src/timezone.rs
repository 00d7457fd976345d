//! Resolving the server's configured timezone into UTC offsets and local dates.

use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

/// Get the current UTC offset of `canonical_timezone`, e.g. "Pacific/Auckland".
///
/// Returns `None` if the timezone name is not known.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Like [get_local_offset], but an unknown timezone is an error.
///
/// # Errors
/// Returns [Error::InvalidTimezone] if the timezone name is not known.
pub fn local_offset(canonical_timezone: &str) -> Result<UtcOffset, Error> {
    get_local_offset(canonical_timezone)
        .ok_or_else(|| Error::InvalidTimezone(canonical_timezone.to_owned()))
}

/// The current local date and UTC offset in `canonical_timezone`.
///
/// # Errors
/// Returns [Error::InvalidTimezone] if the timezone name is not known.
pub fn local_today(canonical_timezone: &str) -> Result<(Date, UtcOffset), Error> {
    let offset = local_offset(canonical_timezone)?;

    Ok((OffsetDateTime::now_utc().to_offset(offset).date(), offset))
}

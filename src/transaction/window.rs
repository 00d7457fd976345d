//! Date windows for scoping transaction queries.
//!
//! A window is an inclusive range of calendar days. Queries compare it
//! against transaction instants by converting it to the half-open range
//! `[start 00:00, (end + 1 day) 00:00)` in the local timezone, so transactions
//! at any time on the last day are included.

use serde::{Deserialize, Serialize};
use time::{
    Date, Duration, Month, UtcOffset, format_description::BorrowedFormatItem,
    macros::format_description,
};

use crate::Error;

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The optional date range query parameters, e.g.
/// `?start_date=2024-01-01&end_date=2024-01-31`.
///
/// Empty values are treated as absent.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct WindowQuery {
    /// The first day of the window in the format YYYY-MM-DD.
    pub start_date: Option<String>,
    /// The last day of the window in the format YYYY-MM-DD.
    pub end_date: Option<String>,
}

impl WindowQuery {
    /// The window given explicitly by both query parameters, or `None` if
    /// either is absent.
    ///
    /// # Errors
    /// Returns [Error::InvalidDate] if a present value is not a valid
    /// YYYY-MM-DD date, or [Error::InvalidDateRange] if the start is after
    /// the end.
    pub fn explicit_window(&self) -> Result<Option<DateWindow>, Error> {
        let start = parse_query_date(self.start_date.as_deref())?;
        let end = parse_query_date(self.end_date.as_deref())?;

        match (start, end) {
            (Some(start), Some(end)) => DateWindow::new(start, end).map(Some),
            _ => Ok(None),
        }
    }

    /// The explicit window if both bounds are given, otherwise the calendar
    /// month containing `today`.
    ///
    /// # Errors
    /// See [WindowQuery::explicit_window].
    pub fn window_or_month_of(&self, today: Date) -> Result<DateWindow, Error> {
        Ok(self
            .explicit_window()?
            .unwrap_or_else(|| DateWindow::month_of(today)))
    }
}

fn parse_query_date(raw: Option<&str>) -> Result<Option<Date>, Error> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => Date::parse(raw, DATE_FORMAT)
            .map(Some)
            .map_err(|_| Error::InvalidDate(raw.to_owned())),
    }
}

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    /// The first day in the window.
    pub start: Date,
    /// The last day in the window.
    pub end: Date,
}

/// A half-open range of unix timestamps, `start <= t < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampRange {
    /// The first second in the range.
    pub start: i64,
    /// The first second after the range.
    pub end: i64,
}

impl DateWindow {
    /// Create a window from `start` to `end`, inclusive.
    ///
    /// # Errors
    /// Returns [Error::InvalidDateRange] if `start` is after `end`.
    pub fn new(start: Date, end: Date) -> Result<Self, Error> {
        if start > end {
            return Err(Error::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        Ok(Self { start, end })
    }

    /// The calendar month that contains `date`.
    pub fn month_of(date: Date) -> Self {
        let (year, month) = (date.year(), date.month());

        Self {
            start: date.replace_day(1).unwrap_or(date),
            end: date
                .replace_day(last_day_of_month(year, month))
                .unwrap_or(date),
        }
    }

    /// Convert the window to unix timestamps, treating days as starting at
    /// midnight in `local_offset`.
    pub fn to_timestamps(self, local_offset: UtcOffset) -> TimestampRange {
        let start = self.start.midnight().assume_offset(local_offset);
        let end = self
            .end
            .midnight()
            .assume_offset(local_offset)
            .checked_add(Duration::DAY)
            .map_or(i64::MAX, |end| end.unix_timestamp());

        TimestampRange {
            start: start.unix_timestamp(),
            end,
        }
    }
}

fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

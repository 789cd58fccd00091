//! Calendar timestamps and civil-date conversions using O(1) algorithms
//!
//! Implements Howard Hinnant's civil_from_days and days_from_civil algorithms.
//! Reference: http://howardhinnant.github.io/date_algorithms.html
//!
//! These algorithms are used in C++20's `<chrono>` library and provide:
//! - O(1) time complexity (no year iteration)
//! - Correct handling of leap years
//! - Valid for all dates in the proleptic Gregorian calendar
//!
//! `CalendarTimestamp` is the shape time has at every hardware boundary:
//! the network time service hands one out, the RTC stores one.

use core::fmt;

/// Seconds in one civil day
pub const SECONDS_PER_DAY: u32 = 86_400;

/// Weekday index of 1970-01-01 (a Thursday) with Monday = 0
const EPOCH_WEEKDAY: i64 = 3;

/// Calendar field validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalendarError {
    /// Year before the Unix epoch
    YearOutOfRange,
    /// Month outside 1-12
    InvalidMonth,
    /// Day outside the month's length
    InvalidDay,
    /// Hour outside 0-23
    InvalidHour,
    /// Minute outside 0-59
    InvalidMinute,
    /// Second outside 0-59
    InvalidSecond,
}

impl fmt::Display for CalendarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::YearOutOfRange => write!(f, "Year out of range"),
            Self::InvalidMonth => write!(f, "Invalid month"),
            Self::InvalidDay => write!(f, "Invalid day of month"),
            Self::InvalidHour => write!(f, "Invalid hour"),
            Self::InvalidMinute => write!(f, "Invalid minute"),
            Self::InvalidSecond => write!(f, "Invalid second"),
        }
    }
}

impl core::error::Error for CalendarError {}

/// A validated Gregorian date and time of day
///
/// Field order makes the derived `Ord` chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalendarTimestamp {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl CalendarTimestamp {
    /// Unix epoch, 1970-01-01 00:00:00
    pub const EPOCH: Self = Self {
        year: 1970,
        month: 1,
        day: 1,
        hour: 0,
        minute: 0,
        second: 0,
    };

    /// Build a timestamp, rejecting fields outside the Gregorian calendar
    pub fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, CalendarError> {
        if year < 1970 {
            return Err(CalendarError::YearOutOfRange);
        }
        if !(1..=12).contains(&month) {
            return Err(CalendarError::InvalidMonth);
        }
        if day == 0 || day > days_in_month(year, month) {
            return Err(CalendarError::InvalidDay);
        }
        if hour > 23 {
            return Err(CalendarError::InvalidHour);
        }
        if minute > 59 {
            return Err(CalendarError::InvalidMinute);
        }
        if second > 59 {
            return Err(CalendarError::InvalidSecond);
        }
        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    /// Midnight at the start of the given date
    pub fn date(year: u16, month: u8, day: u8) -> Result<Self, CalendarError> {
        Self::new(year, month, day, 0, 0, 0)
    }

    /// Convert Unix timestamp to a calendar timestamp
    ///
    /// Valid range: 1970-65535 (u16 year limit).
    pub fn from_unix(unix_secs: u64) -> Self {
        let days_since_epoch = (unix_secs / SECONDS_PER_DAY as u64) as i64;
        let secs_today = (unix_secs % SECONDS_PER_DAY as u64) as u32;

        let (year, month, day) = civil_from_days(days_since_epoch);

        Self {
            year,
            month,
            day,
            hour: (secs_today / 3600) as u8,
            minute: ((secs_today % 3600) / 60) as u8,
            second: (secs_today % 60) as u8,
        }
    }

    /// Convert to Unix timestamp (seconds since 1970-01-01 00:00:00)
    pub fn to_unix(&self) -> u64 {
        let days_since_epoch = days_from_civil(self.year, self.month, self.day);

        (days_since_epoch as u64) * SECONDS_PER_DAY as u64 + self.seconds_of_day() as u64
    }

    /// Day of week, Monday = 0 through Sunday = 6
    pub fn weekday(&self) -> u8 {
        let days = days_from_civil(self.year, self.month, self.day);
        (days + EPOCH_WEEKDAY).rem_euclid(7) as u8
    }

    /// The same time of day, `days` later (or earlier when negative)
    ///
    /// Saturates at the Unix epoch.
    pub fn add_days(&self, days: i64) -> Self {
        self.add_seconds(days * SECONDS_PER_DAY as i64)
    }

    /// Shift by a signed number of seconds, saturating at the Unix epoch
    pub fn add_seconds(&self, seconds: i64) -> Self {
        let shifted = self.to_unix() as i64 + seconds;
        Self::from_unix(shifted.max(0) as u64)
    }

    /// Seconds elapsed since midnight of this timestamp's date
    pub fn seconds_of_day(&self) -> u32 {
        self.hour as u32 * 3600 + self.minute as u32 * 60 + self.second as u32
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }
}

impl Default for CalendarTimestamp {
    fn default() -> Self {
        Self::EPOCH
    }
}

impl fmt::Display for CalendarTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Check if year is a leap year (Gregorian calendar)
///
/// - Divisible by 4: leap year
/// - EXCEPT divisible by 100: not a leap year
/// - EXCEPT divisible by 400: leap year
pub fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` (1-12) of `year`; 0 for an invalid month
pub fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Convert days since Unix epoch to civil date (year, month, day)
///
/// Howard Hinnant's civil_from_days algorithm.
fn civil_from_days(days_since_epoch: i64) -> (u16, u8, u8) {
    // Shift epoch from 1970-01-01 to 0000-03-01 so the leap day ends the year
    let z = days_since_epoch + 719468;

    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u32; // day of era [0, 146096]
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365; // [0, 399]
    let y = (yoe as i64) + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // [0, 365]
    let mp = (5 * doy + 2) / 153; // March = 0
    let d = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u8;
    let year = if m <= 2 { y + 1 } else { y };

    (year as u16, m, d)
}

/// Convert civil date (year, month, day) to days since Unix epoch
///
/// Howard Hinnant's days_from_civil algorithm.
fn days_from_civil(year: u16, month: u8, day: u8) -> i64 {
    let y = year as i64;
    let m = month as i64;
    let d = day as i64;

    // March = month 0, February = month 11
    let (y, m) = if m <= 2 { (y - 1, m + 9) } else { (y, m - 3) };

    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as u32; // [0, 399]
    let doy = (153 * (m as u32) + 2) / 5 + (d as u32) - 1; // [0, 365]
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy; // [0, 146096]

    era * 146097 + (doe as i64) - 719468
}

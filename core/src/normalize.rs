//! UTC to local wall time
//!
//! Offsets are whole hours, west-positive: 8 means local time is UTC-8
//! (Pacific standard time). Daylight saving moves local time one hour
//! closer to UTC.

use hal_abstractions::CalendarTimestamp;

use crate::time_of_day::SecondsOfDay;

/// Local hour for a UTC hour, wrapped onto the dial by at most one day
///
/// A single conditional correction, not a modulo: offsets are always
/// smaller than a day.
fn local_hour(utc_hour: u8, offset_hours: i8, dst: bool) -> u8 {
    let mut hour = utc_hour as i16 - offset_hours as i16 + dst as i16;
    if hour < 0 {
        hour += 24;
    } else if hour >= 24 {
        hour -= 24;
    }
    hour as u8
}

/// Local seconds since midnight for a UTC timestamp
pub fn local_seconds_of_day(utc: &CalendarTimestamp, offset_hours: i8, dst: bool) -> SecondsOfDay {
    let hour = local_hour(utc.hour(), offset_hours, dst);
    SecondsOfDay::wrapping(hour as u32 * 3600 + utc.minute() as u32 * 60 + utc.second() as u32)
}

/// The full local date and time for a UTC timestamp
///
/// Unlike `local_seconds_of_day` the date moves too, so this is what gets
/// written into a wall-time RTC.
pub fn local_datetime(utc: &CalendarTimestamp, offset_hours: i8, dst: bool) -> CalendarTimestamp {
    let shift_hours = dst as i64 - offset_hours as i64;
    utc.add_seconds(shift_hours * 3600)
}

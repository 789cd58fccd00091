//! Daylight-saving calculator
//!
//! US rule: DST runs from the second Sunday in March up to, but not
//! including, the first Sunday in November. Only the date matters; the
//! 02:00 changeover instant is not modelled.

use hal_abstractions::CalendarTimestamp;

/// Which daylight-saving rule applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DstRule {
    /// Standard time all year
    None,
    /// Second Sunday of March to first Sunday of November
    #[default]
    UnitedStates,
}

impl DstRule {
    pub fn is_daylight(self, date: &CalendarTimestamp) -> bool {
        match self {
            DstRule::None => false,
            DstRule::UnitedStates => is_daylight(date),
        }
    }
}

/// `true` when `date` falls inside the US daylight-saving window of its year
pub fn is_daylight(date: &CalendarTimestamp) -> bool {
    let year = date.year();
    let day = (date.month(), date.day());

    let start = (3, second_sunday_of_march(year));
    let end = (11, first_sunday_of_november(year));

    start <= day && day < end
}

/// Day of month of the second Sunday in March
pub fn second_sunday_of_march(year: u16) -> u8 {
    1 + (6 - first_weekday(year, 3)) + 7
}

/// Day of month of the first Sunday in November
pub fn first_sunday_of_november(year: u16) -> u8 {
    1 + (6 - first_weekday(year, 11))
}

/// Weekday (Monday = 0) of the first day of `month`
fn first_weekday(year: u16, month: u8) -> u8 {
    CalendarTimestamp::date(year, month, 1)
        .map(|d| d.weekday())
        .unwrap_or_default()
}

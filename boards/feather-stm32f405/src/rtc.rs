//! STM32 internal RTC behind `HardwareClock`
//!
//! The RTC runs from the 32.768 kHz LSE and keeps counting between syncs.
//! It holds whatever wall time the clock source writes, which is local time.

use defmt::Format;
use embassy_stm32::rtc::{DateTime, DayOfWeek, Rtc};
use hal_abstractions::{CalendarTimestamp, HardwareClock};

/// RTC operation errors
#[derive(Debug, Clone, Copy, Format)]
pub enum RtcError {
    /// The peripheral rejected a read or write
    HardwareError,
    /// The RTC holds a date the calendar cannot represent
    InvalidDateTime,
}

impl core::fmt::Display for RtcError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::HardwareError => write!(f, "RTC hardware error"),
            Self::InvalidDateTime => write!(f, "RTC date out of range"),
        }
    }
}

impl core::error::Error for RtcError {}

pub struct StmRtc {
    rtc: Rtc,
}

impl StmRtc {
    pub fn new(rtc: Rtc) -> Self {
        Self { rtc }
    }
}

fn day_of_week(timestamp: &CalendarTimestamp) -> DayOfWeek {
    match timestamp.weekday() {
        0 => DayOfWeek::Monday,
        1 => DayOfWeek::Tuesday,
        2 => DayOfWeek::Wednesday,
        3 => DayOfWeek::Thursday,
        4 => DayOfWeek::Friday,
        5 => DayOfWeek::Saturday,
        _ => DayOfWeek::Sunday,
    }
}

impl HardwareClock for StmRtc {
    type Error = RtcError;

    fn get(&mut self) -> Result<CalendarTimestamp, RtcError> {
        let dt = self.rtc.now().map_err(|_| RtcError::HardwareError)?;
        CalendarTimestamp::new(
            dt.year(),
            dt.month(),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second(),
        )
        .map_err(|_| RtcError::InvalidDateTime)
    }

    fn set(&mut self, timestamp: CalendarTimestamp) -> Result<(), RtcError> {
        let dt = DateTime::from(
            timestamp.year(),
            timestamp.month(),
            timestamp.day(),
            day_of_week(&timestamp),
            timestamp.hour(),
            timestamp.minute(),
            timestamp.second(),
            0, // microsecond
        )
        .map_err(|_| RtcError::InvalidDateTime)?;
        self.rtc
            .set_datetime(dt)
            .map_err(|_| RtcError::HardwareError)
    }
}

//! Clock sources: the single owner of authoritative local time
//!
//! Two strategies sit behind `ClockSource`:
//! - `RtcClockSource` delegates every read to a free-running hardware RTC
//!   that holds local wall time. Drift is the RTC crystal's (±20-50ppm).
//! - `TickClockSource` counts poll cycles from the last sync. Drift is the
//!   poll loop's, which includes the time spent doing work in each poll.
//!
//! Both re-anchor on every sync and wrap to 0 at local midnight.

use hal_abstractions::{CalendarTimestamp, HardwareClock, SECONDS_PER_DAY};

use crate::normalize::{local_datetime, local_seconds_of_day};
use crate::time_of_day::SecondsOfDay;

/// Authoritative local time between syncs
pub trait ClockSource {
    /// Current local seconds since midnight
    fn seconds_of_day(&mut self) -> SecondsOfDay;

    /// Re-anchor from a freshly fetched UTC timestamp
    fn set_from_sync(&mut self, utc: &CalendarTimestamp, dst: bool);

    /// Called once per poll cycle
    fn on_poll(&mut self) {}
}

/// Hardware-clock-authoritative source
///
/// The RTC is programmed with local wall time, so reads need no timezone
/// math. A failed read returns the last good value.
pub struct RtcClockSource<C> {
    rtc: C,
    offset_hours: i8,
    last_read: SecondsOfDay,
}

impl<C: HardwareClock> RtcClockSource<C> {
    pub fn new(rtc: C, offset_hours: i8) -> Self {
        Self {
            rtc,
            offset_hours,
            last_read: SecondsOfDay::MIDNIGHT,
        }
    }

    /// Full local date and time as held by the RTC
    pub fn local_datetime(&mut self) -> Result<CalendarTimestamp, C::Error> {
        self.rtc.get()
    }

    pub fn into_inner(self) -> C {
        self.rtc
    }
}

impl<C: HardwareClock> ClockSource for RtcClockSource<C> {
    fn seconds_of_day(&mut self) -> SecondsOfDay {
        match self.rtc.get() {
            Ok(now) => {
                self.last_read = SecondsOfDay::wrapping(now.seconds_of_day());
            }
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "RTC read failed: {:?}, holding {}",
                    defmt::Debug2Format(&_e),
                    self.last_read
                );
            }
        }
        self.last_read
    }

    fn set_from_sync(&mut self, utc: &CalendarTimestamp, dst: bool) {
        let local = local_datetime(utc, self.offset_hours, dst);
        match self.rtc.set(local) {
            Ok(()) => {
                self.last_read = SecondsOfDay::wrapping(local.seconds_of_day());
                #[cfg(feature = "defmt")]
                defmt::info!("RTC set to local time {}", self.last_read);
            }
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::error!("Unable to set RTC time: {:?}", defmt::Debug2Format(&_e));
            }
        }
    }
}

/// Software-tick-authoritative source
///
/// Seconds-of-day are derived from the number of polls since the anchor.
/// When the count reaches midnight the anchor moves to 0 and the count
/// restarts, so the counter never grows past one day of polls.
pub struct TickClockSource {
    offset_hours: i8,
    polls_per_second: u32,
    anchor: SecondsOfDay,
    polls: u32,
}

impl TickClockSource {
    pub fn new(offset_hours: i8, polls_per_second: u32) -> Self {
        Self {
            offset_hours,
            polls_per_second: polls_per_second.max(1),
            anchor: SecondsOfDay::MIDNIGHT,
            polls: 0,
        }
    }

    /// Polls counted since the last anchor
    pub fn polls(&self) -> u32 {
        self.polls
    }

    fn elapsed_secs(&self) -> u32 {
        self.polls / self.polls_per_second
    }
}

impl ClockSource for TickClockSource {
    fn seconds_of_day(&mut self) -> SecondsOfDay {
        SecondsOfDay::wrapping(self.anchor.as_secs() + self.elapsed_secs())
    }

    fn set_from_sync(&mut self, utc: &CalendarTimestamp, dst: bool) {
        self.anchor = local_seconds_of_day(utc, self.offset_hours, dst);
        self.polls = 0;
    }

    fn on_poll(&mut self) {
        self.polls += 1;
        if self.anchor.as_secs() + self.elapsed_secs() >= SECONDS_PER_DAY {
            self.anchor = SecondsOfDay::MIDNIGHT;
            self.polls = 0;
        }
    }
}

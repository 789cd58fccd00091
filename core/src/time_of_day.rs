//! Local wall time as seconds since midnight

use core::fmt;

use hal_abstractions::SECONDS_PER_DAY;

/// Local time of day in seconds since local midnight, always `< 86400`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SecondsOfDay(u32);

impl SecondsOfDay {
    pub const MIDNIGHT: Self = Self(0);
    pub const NOON: Self = Self(43_200);

    /// `None` when `secs` is a full day or more
    pub const fn new(secs: u32) -> Option<Self> {
        if secs < SECONDS_PER_DAY {
            Some(Self(secs))
        } else {
            None
        }
    }

    /// Reduce any second count onto the 24-hour dial
    pub const fn wrapping(secs: u32) -> Self {
        Self(secs % SECONDS_PER_DAY)
    }

    pub fn from_hms(hour: u8, minute: u8, second: u8) -> Option<Self> {
        if hour > 23 || minute > 59 || second > 59 {
            return None;
        }
        Some(Self(hour as u32 * 3600 + minute as u32 * 60 + second as u32))
    }

    pub const fn as_secs(self) -> u32 {
        self.0
    }

    pub const fn hour(self) -> u8 {
        (self.0 / 3600) as u8
    }

    pub const fn minute(self) -> u8 {
        ((self.0 % 3600) / 60) as u8
    }

    pub const fn second(self) -> u8 {
        (self.0 % 60) as u8
    }

    /// Seconds from `earlier` forward to `self` around the 24-hour dial
    pub const fn seconds_since(self, earlier: Self) -> u32 {
        (self.0 + SECONDS_PER_DAY - earlier.0) % SECONDS_PER_DAY
    }
}

impl fmt::Display for SecondsOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

impl From<SecondsOfDay> for u32 {
    fn from(value: SecondsOfDay) -> Self {
        value.0
    }
}

//! Real-time clock peripheral abstraction

use crate::calendar::CalendarTimestamp;

/// A real-time clock that free-runs once set
///
/// Typically battery or capacitor backed, so it is the source of truth
/// between network syncs.
pub trait HardwareClock {
    type Error: core::fmt::Debug;

    /// Read the current date and time
    fn get(&mut self) -> Result<CalendarTimestamp, Self::Error>;

    /// Program the clock; it keeps counting from `timestamp`
    fn set(&mut self, timestamp: CalendarTimestamp) -> Result<(), Self::Error>;
}

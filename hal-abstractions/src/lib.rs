//! Hardware abstraction traits for the network alarm clock
//!
//! This crate defines the collaborators the clock core talks to. Boards
//! implement these traits; the core stays free of hardware dependencies.
//!
//! - **`calendar`**: `CalendarTimestamp`, the time shape shared by the RTC
//!   and the network time service
//! - **`clock`**: `HardwareClock`, a free-running real-time clock peripheral
//! - **`display`**: `DisplayDevice`, a four-digit seven-segment display
//! - **`network`**: `NetworkConnector` and `TimeService`
//!
//! LED, buzzer and button are plain `embedded-hal` digital pins and have no
//! trait of their own here.

#![no_std]
#![deny(unsafe_code)]
#![deny(warnings)]

pub mod calendar;
pub mod clock;
pub mod display;
pub mod network;

pub use calendar::{CalendarError, CalendarTimestamp, SECONDS_PER_DAY};
pub use clock::HardwareClock;
pub use display::{BlinkRate, DisplayDevice};
pub use network::{NetworkConnector, TimeService};

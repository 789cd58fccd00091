//! Platform-agnostic core logic for the network alarm clock
//!
//! This crate contains the time-keeping and alarm logic shared by every
//! board. It has NO hardware dependencies: collaborators come in through
//! the `hal-abstractions` traits and `embedded-hal` pins.
//!
//! - **`dst`**: US daylight-saving window
//! - **`normalize`**: UTC to local seconds-of-day
//! - **`clock`**: RTC-backed and tick-counted clock sources
//! - **`sync`**: daily resync scheduling and the retrying sync job
//! - **`alarm`**: the alarm state machine
//! - **`appliance`**: the poll loop tying it all together
//!
//! Enable the `defmt` feature to get log output on target.

#![no_std]
#![deny(unsafe_code)]
#![deny(warnings)]

pub mod alarm;
pub mod appliance;
pub mod clock;
pub mod config;
pub mod display;
pub mod dst;
pub mod normalize;
pub mod sync;
pub mod time_of_day;
pub mod trigger;

pub use alarm::{AlarmEvent, AlarmMachine, AlarmOutputs};
pub use appliance::{Appliance, Peripherals, PollOutcome};
pub use clock::{ClockSource, RtcClockSource, TickClockSource};
pub use config::{AlarmConfig, ClockConfig, ConfigError};
pub use dst::{is_daylight, DstRule};
pub use hal_abstractions::{BlinkRate, CalendarTimestamp};
pub use normalize::{local_datetime, local_seconds_of_day};
pub use sync::{run_sync, SyncReport, SyncScheduler};
pub use time_of_day::SecondsOfDay;
pub use trigger::{InstantTrigger, TriggerPolicy};

//! Network collaborators used during a time sync
//!
//! Both traits are async: on real hardware they wait on the network stack.
//! Implementors handle their own errors gracefully (log and report) rather
//! than panicking.

use crate::calendar::CalendarTimestamp;

/// Brings the network up
pub trait NetworkConnector {
    /// Try once to get connectivity; `true` on success
    ///
    /// Callers may retry as often as they like.
    fn connect(&mut self) -> impl core::future::Future<Output = bool>;
}

/// Source of authoritative UTC time, e.g. an SNTP client
pub trait TimeService {
    type Error: core::fmt::Debug;

    /// Fetch the current UTC date and time
    fn fetch_utc_now(
        &mut self,
    ) -> impl core::future::Future<Output = Result<CalendarTimestamp, Self::Error>>;
}

//! Daily network time resync
//!
//! Once per day, when local time reaches the resync instant, the clock is
//! re-anchored from the network time service:
//! 1. connect, retrying without limit
//! 2. fetch UTC; a failed fetch is handled exactly like a failed connect
//! 3. evaluate daylight saving on the UTC date
//! 4. normalise to local time and commit to the clock source
//!
//! The retry loop blocks the poll loop, display and alarm included, until
//! the network answers.

use embedded_hal_async::delay::DelayNs;
use hal_abstractions::{CalendarTimestamp, NetworkConnector, TimeService};

use crate::clock::ClockSource;
use crate::config::ClockConfig;
use crate::normalize::local_seconds_of_day;
use crate::time_of_day::SecondsOfDay;
use crate::trigger::InstantTrigger;

/// What a completed sync did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SyncReport {
    /// Timestamp returned by the time service
    pub utc: CalendarTimestamp,
    /// Daylight saving in effect for `utc`'s date
    pub dst: bool,
    /// Local time committed to the clock source
    pub local: SecondsOfDay,
    /// Connect attempts made, including the successful one
    pub attempts: u32,
}

/// Decides when the daily resync is due
pub struct SyncScheduler {
    trigger: InstantTrigger,
}

impl SyncScheduler {
    pub fn new(config: &ClockConfig) -> Self {
        Self {
            trigger: InstantTrigger::new(config.resync_at, config.trigger_policy),
        }
    }

    /// Feed the current local time; `true` once per arrival at the instant
    pub fn due(&mut self, now: SecondsOfDay) -> bool {
        self.trigger.update(now)
    }

    pub fn resync_at(&self) -> SecondsOfDay {
        self.trigger.target()
    }
}

/// Run one full sync job against the given collaborators
///
/// Never fails: connectivity and time-service errors are retried with
/// `config.retry_backoff_ms` between attempts until one succeeds.
pub async fn run_sync<N, T, C, D>(
    connector: &mut N,
    time_service: &mut T,
    clock: &mut C,
    delay: &mut D,
    config: &ClockConfig,
) -> SyncReport
where
    N: NetworkConnector,
    T: TimeService,
    C: ClockSource,
    D: DelayNs,
{
    let mut attempts = 0u32;
    let utc = loop {
        attempts = attempts.saturating_add(1);
        if !connector.connect().await {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "Network connect failed (attempt {}), retrying in {} ms",
                attempts,
                config.retry_backoff_ms
            );
            delay.delay_ms(config.retry_backoff_ms).await;
            continue;
        }

        match time_service.fetch_utc_now().await {
            Ok(utc) => break utc,
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "Time service failed: {:?}, retrying in {} ms",
                    defmt::Debug2Format(&_e),
                    config.retry_backoff_ms
                );
                delay.delay_ms(config.retry_backoff_ms).await;
            }
        }
    };

    let dst = config.dst_rule.is_daylight(&utc);
    let local = local_seconds_of_day(&utc, config.utc_offset_hours, dst);
    clock.set_from_sync(&utc, dst);

    #[cfg(feature = "defmt")]
    defmt::info!(
        "Synced: {} UTC, DST {}, local {} after {} attempt(s)",
        utc,
        dst,
        local,
        attempts
    );

    SyncReport {
        utc,
        dst,
        local,
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TickClockSource;
    use crate::trigger::TriggerPolicy;
    use embassy_futures::block_on;

    struct FlakyConnector {
        failures_left: u32,
        calls: u32,
    }

    impl NetworkConnector for FlakyConnector {
        async fn connect(&mut self) -> bool {
            self.calls += 1;
            if self.failures_left > 0 {
                self.failures_left -= 1;
                false
            } else {
                true
            }
        }
    }

    struct FixedTimeService {
        now: CalendarTimestamp,
        failures_left: u32,
    }

    impl TimeService for FixedTimeService {
        type Error = &'static str;

        async fn fetch_utc_now(&mut self) -> Result<CalendarTimestamp, Self::Error> {
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err("timeout");
            }
            Ok(self.now)
        }
    }

    #[derive(Default)]
    struct RecordingDelay {
        total_ms: u64,
    }

    impl DelayNs for RecordingDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.total_ms += (ns / 1_000_000) as u64;
        }

        async fn delay_ms(&mut self, ms: u32) {
            self.total_ms += ms as u64;
        }
    }

    fn summer_evening() -> CalendarTimestamp {
        CalendarTimestamp::new(2024, 6, 1, 20, 0, 0).unwrap()
    }

    #[test]
    fn test_sync_commits_local_time() {
        let config = ClockConfig::default();
        let mut connector = FlakyConnector {
            failures_left: 0,
            calls: 0,
        };
        let mut service = FixedTimeService {
            now: summer_evening(),
            failures_left: 0,
        };
        let mut clock = TickClockSource::new(config.utc_offset_hours, config.polls_per_second);
        let mut delay = RecordingDelay::default();

        let report = block_on(run_sync(
            &mut connector,
            &mut service,
            &mut clock,
            &mut delay,
            &config,
        ));

        assert!(report.dst);
        assert_eq!(report.local.as_secs(), 46_800);
        assert_eq!(report.attempts, 1);
        assert_eq!(clock.seconds_of_day().as_secs(), 46_800);
        assert_eq!(delay.total_ms, 0);
    }

    #[test]
    fn test_connect_is_retried_without_limit() {
        let config = ClockConfig::default();
        let mut connector = FlakyConnector {
            failures_left: 1000,
            calls: 0,
        };
        let mut service = FixedTimeService {
            now: summer_evening(),
            failures_left: 0,
        };
        let mut clock = TickClockSource::new(config.utc_offset_hours, config.polls_per_second);
        let mut delay = RecordingDelay::default();

        let report = block_on(run_sync(
            &mut connector,
            &mut service,
            &mut clock,
            &mut delay,
            &config,
        ));

        assert_eq!(connector.calls, 1001);
        assert_eq!(report.attempts, 1001);
        assert_eq!(delay.total_ms, 1000 * 5000);
    }

    #[test]
    fn test_fetch_failure_goes_back_to_connect() {
        let config = ClockConfig::default();
        let mut connector = FlakyConnector {
            failures_left: 0,
            calls: 0,
        };
        let mut service = FixedTimeService {
            now: summer_evening(),
            failures_left: 2,
        };
        let mut clock = TickClockSource::new(config.utc_offset_hours, config.polls_per_second);
        let mut delay = RecordingDelay::default();

        let report = block_on(run_sync(
            &mut connector,
            &mut service,
            &mut clock,
            &mut delay,
            &config,
        ));

        assert_eq!(connector.calls, 3);
        assert_eq!(report.attempts, 3);
        assert_eq!(delay.total_ms, 2 * 5000);
    }

    #[test]
    fn test_winter_sync_uses_standard_time() {
        let config = ClockConfig::default();
        let mut connector = FlakyConnector {
            failures_left: 0,
            calls: 0,
        };
        let mut service = FixedTimeService {
            now: CalendarTimestamp::new(2024, 1, 1, 3, 0, 0).unwrap(),
            failures_left: 0,
        };
        let mut clock = TickClockSource::new(config.utc_offset_hours, config.polls_per_second);
        let mut delay = RecordingDelay::default();

        let report = block_on(run_sync(
            &mut connector,
            &mut service,
            &mut clock,
            &mut delay,
            &config,
        ));

        assert!(!report.dst);
        assert_eq!(report.local, SecondsOfDay::from_hms(19, 0, 0).unwrap());
    }

    #[test]
    fn test_resync_is_idempotent() {
        let config = ClockConfig::default();
        let mut connector = FlakyConnector {
            failures_left: 0,
            calls: 0,
        };
        let mut service = FixedTimeService {
            now: summer_evening(),
            failures_left: 0,
        };
        let mut clock = TickClockSource::new(config.utc_offset_hours, config.polls_per_second);
        let mut delay = RecordingDelay::default();

        let first = block_on(run_sync(
            &mut connector,
            &mut service,
            &mut clock,
            &mut delay,
            &config,
        ));
        let second = block_on(run_sync(
            &mut connector,
            &mut service,
            &mut clock,
            &mut delay,
            &config,
        ));

        assert_eq!(first.local, second.local);
        assert_eq!(clock.seconds_of_day(), first.local);
    }

    #[test]
    fn test_scheduler_fires_once_at_noon() {
        let mut scheduler = SyncScheduler::new(&ClockConfig::default());
        assert_eq!(scheduler.resync_at(), SecondsOfDay::NOON);
        assert!(!scheduler.due(SecondsOfDay::new(43_199).unwrap()));
        assert!(scheduler.due(SecondsOfDay::NOON));
        // Still noon after a quick sync: not due again
        assert!(!scheduler.due(SecondsOfDay::NOON));
        assert!(!scheduler.due(SecondsOfDay::new(43_201).unwrap()));
    }

    #[test]
    fn test_exact_match_scheduler_misses_skipped_noon() {
        let config = ClockConfig {
            trigger_policy: TriggerPolicy::ExactMatch,
            ..Default::default()
        };
        let mut scheduler = SyncScheduler::new(&config);
        assert!(!scheduler.due(SecondsOfDay::new(43_199).unwrap()));
        assert!(!scheduler.due(SecondsOfDay::new(43_201).unwrap()));
    }
}

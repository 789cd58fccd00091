//! Detecting when local time reaches a fixed instant
//!
//! The poll loop samples the clock every ~10 ms, so under normal load it
//! sees every second. A stalled poll (a long sync, a slow display write)
//! can skip one. `TriggerPolicy` picks how that case is handled.

use hal_abstractions::SECONDS_PER_DAY;

use crate::time_of_day::SecondsOfDay;

/// How an instant counts as reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerPolicy {
    /// Fire only when a sample equals the instant; a skipped second is missed
    ExactMatch,
    /// Fire when the instant lies in `(previous sample, current sample]`
    #[default]
    Crossing,
}

/// Latching detector for one instant of the day
///
/// Fires at most once per arrival: samples that stay on the instant do not
/// fire again. A backward step of the clock (a sync correcting a fast RTC)
/// never fires; a forward run past midnight does.
#[derive(Debug, Clone, Copy)]
pub struct InstantTrigger {
    target: SecondsOfDay,
    policy: TriggerPolicy,
    last: Option<SecondsOfDay>,
}

impl InstantTrigger {
    pub const fn new(target: SecondsOfDay, policy: TriggerPolicy) -> Self {
        Self {
            target,
            policy,
            last: None,
        }
    }

    pub fn target(&self) -> SecondsOfDay {
        self.target
    }

    /// Feed one clock sample; `true` when the instant was just reached
    pub fn update(&mut self, now: SecondsOfDay) -> bool {
        let fired = match (self.policy, self.last) {
            (_, None) => now == self.target,
            (_, Some(last)) if last == now => false,
            (TriggerPolicy::ExactMatch, Some(_)) => now == self.target,
            (TriggerPolicy::Crossing, Some(last)) => self.crossed(last, now),
        };
        self.last = Some(now);
        fired
    }

    fn crossed(&self, last: SecondsOfDay, now: SecondsOfDay) -> bool {
        let forward = now.seconds_since(last);
        // More than half a day "forward" is really a step backwards
        if forward > SECONDS_PER_DAY / 2 {
            return false;
        }
        let to_target = self.target.seconds_since(last);
        to_target != 0 && to_target <= forward
    }
}

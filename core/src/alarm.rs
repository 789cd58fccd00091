//! Alarm state machine
//!
//! ```text
//!            trigger instant reached
//!   INACTIVE ------------------------> ACTIVE
//!      ^                                 |
//!      |   window elapsed, or button     |
//!      +---------------------------------+
//! ```
//!
//! While ACTIVE the LED and buzzer flip every `toggle_every_polls` poll
//! cycles and the display flashes. While INACTIVE everything is off.
//!
//! The alarm is one-shot per day: once cancelled or expired it only starts
//! again when the trigger instant comes round the next day. The button is
//! a raw level sampled each poll; holding it when the instant arrives still
//! starts the alarm, and the next poll cancels it.

use hal_abstractions::BlinkRate;

use crate::config::AlarmConfig;
use crate::time_of_day::SecondsOfDay;
use crate::trigger::{InstantTrigger, TriggerPolicy};

/// Alarm transitions reported by `AlarmMachine::update`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmEvent {
    Started,
    /// The alarm window ran out
    Expired,
    /// The button was pressed
    Cancelled,
}

/// Output levels the alarm wants driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmOutputs {
    pub led_on: bool,
    pub buzzer_on: bool,
    pub blink: BlinkRate,
}

impl AlarmOutputs {
    pub const OFF: Self = Self {
        led_on: false,
        buzzer_on: false,
        blink: BlinkRate::Off,
    };
}

pub struct AlarmMachine {
    config: AlarmConfig,
    trigger: InstantTrigger,
    toggle_every_polls: u32,
    active: bool,
    last_toggle_poll: u32,
    outputs: AlarmOutputs,
}

impl AlarmMachine {
    pub fn new(config: AlarmConfig, policy: TriggerPolicy, toggle_every_polls: u32) -> Self {
        Self {
            config,
            trigger: InstantTrigger::new(config.trigger, policy),
            toggle_every_polls: toggle_every_polls.max(1),
            active: false,
            last_toggle_poll: 0,
            outputs: AlarmOutputs::OFF,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn config(&self) -> &AlarmConfig {
        &self.config
    }

    /// Check transitions for one poll
    pub fn update(
        &mut self,
        now: SecondsOfDay,
        button_pressed: bool,
        poll: u32,
    ) -> Option<AlarmEvent> {
        if self.trigger.update(now) {
            if self.active {
                return None;
            }
            self.active = true;
            // Flip on immediately rather than waiting a full toggle period
            self.last_toggle_poll = poll.wrapping_sub(self.toggle_every_polls);
            return Some(AlarmEvent::Started);
        }

        if !self.active {
            return None;
        }
        if self.window_elapsed(now) {
            self.active = false;
            Some(AlarmEvent::Expired)
        } else if button_pressed {
            self.active = false;
            Some(AlarmEvent::Cancelled)
        } else {
            None
        }
    }

    /// Output levels for this poll
    pub fn drive(&mut self, poll: u32) -> AlarmOutputs {
        if !self.active {
            self.outputs = AlarmOutputs::OFF;
            return self.outputs;
        }

        if poll.wrapping_sub(self.last_toggle_poll) >= self.toggle_every_polls {
            self.last_toggle_poll = poll;
            self.outputs.led_on = !self.outputs.led_on;
            self.outputs.buzzer_on = !self.outputs.buzzer_on;
        }
        self.outputs.blink = BlinkRate::Flash;
        self.outputs
    }

    /// The poll counter was reset to 0 from `previous_poll`
    ///
    /// Keeps the distance to the last toggle so the cadence carries on
    /// through the reset.
    pub fn rebase_cycle(&mut self, previous_poll: u32) {
        self.last_toggle_poll = self.last_toggle_poll.wrapping_sub(previous_poll);
    }

    fn window_elapsed(&self, now: SecondsOfDay) -> bool {
        now.seconds_since(self.config.trigger) >= self.config.duration_secs
    }
}

//! The clock appliance: one owned state struct driven by a poll loop
//!
//! Every poll cycle:
//! - advance the clock source and read local time
//! - run the alarm transition check with the sampled button level
//! - drive LED, buzzer and display blink from the alarm (pins are only
//!   written when a level changes)
//! - run the daily resync when due (blocks until the network answers)
//! - reset the cycle counter when local time reaches midnight
//!
//! Once per second (every `polls_per_second` cycles) the display is
//! refreshed with `HH:MM`.
//!
//! Peripheral errors are logged and otherwise ignored: the loop never stops.

use embedded_hal::digital::{InputPin, OutputPin, PinState};
use embedded_hal_async::delay::DelayNs;
use hal_abstractions::{BlinkRate, DisplayDevice, NetworkConnector, TimeService};

use crate::alarm::{AlarmEvent, AlarmMachine, AlarmOutputs};
use crate::clock::ClockSource;
use crate::config::{AlarmConfig, ClockConfig, ConfigError};
use crate::display::hhmm;
use crate::sync::{run_sync, SyncReport, SyncScheduler};
use crate::time_of_day::SecondsOfDay;
use crate::trigger::InstantTrigger;

/// What happened during one poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollOutcome {
    /// Local time sampled at the start of the cycle
    pub now: SecondsOfDay,
    pub alarm: Option<AlarmEvent>,
    pub synced: Option<SyncReport>,
}

/// Output peripherals driven by the appliance
pub struct Peripherals<D, L, Z, B> {
    pub display: D,
    pub led: L,
    pub buzzer: Z,
    pub button: B,
}

/// Levels last written successfully; `None` forces the next write
#[derive(Debug, Clone, Copy, Default)]
struct Applied {
    led_on: Option<bool>,
    buzzer_on: Option<bool>,
    blink: Option<BlinkRate>,
}

pub struct Appliance<S, D, L, Z, B> {
    clock: S,
    io: Peripherals<D, L, Z, B>,
    config: ClockConfig,
    scheduler: SyncScheduler,
    alarm: AlarmMachine,
    midnight: InstantTrigger,
    cycle: u32,
    applied: Applied,
}

impl<S, D, L, Z, B> Appliance<S, D, L, Z, B>
where
    S: ClockSource,
    D: DisplayDevice,
    L: OutputPin,
    Z: OutputPin,
    B: InputPin,
{
    pub fn new(
        clock: S,
        io: Peripherals<D, L, Z, B>,
        config: ClockConfig,
        alarm: AlarmConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            clock,
            io,
            scheduler: SyncScheduler::new(&config),
            alarm: AlarmMachine::new(alarm, config.trigger_policy, config.toggle_every_polls),
            midnight: InstantTrigger::new(SecondsOfDay::MIDNIGHT, config.trigger_policy),
            cycle: 0,
            applied: Applied::default(),
            config,
        })
    }

    /// Initial sync and first display refresh, before the loop starts
    pub async fn start<N, T, W>(
        &mut self,
        connector: &mut N,
        time_service: &mut T,
        delay: &mut W,
    ) -> SyncReport
    where
        N: NetworkConnector,
        T: TimeService,
        W: DelayNs,
    {
        let report = run_sync(
            connector,
            time_service,
            &mut self.clock,
            delay,
            &self.config,
        )
        .await;
        self.apply_outputs(AlarmOutputs::OFF);
        let now = self.clock.seconds_of_day();
        self.refresh_display(now);
        report
    }

    /// One poll cycle
    pub async fn poll<N, T, W>(
        &mut self,
        connector: &mut N,
        time_service: &mut T,
        delay: &mut W,
    ) -> PollOutcome
    where
        N: NetworkConnector,
        T: TimeService,
        W: DelayNs,
    {
        self.cycle = self.cycle.wrapping_add(1);
        self.clock.on_poll();
        let now = self.clock.seconds_of_day();

        let pressed = self.button_pressed();
        let alarm = self.alarm.update(now, pressed, self.cycle);
        if let Some(_event) = alarm {
            #[cfg(feature = "defmt")]
            defmt::info!("Alarm {} at {}", _event, now);
        }
        let outputs = self.alarm.drive(self.cycle);
        self.apply_outputs(outputs);

        let synced = if self.scheduler.due(now) {
            #[cfg(feature = "defmt")]
            defmt::info!("Daily resync at {}", now);
            Some(
                run_sync(
                    connector,
                    time_service,
                    &mut self.clock,
                    delay,
                    &self.config,
                )
                .await,
            )
        } else {
            None
        };

        if self.midnight.update(now) {
            self.alarm.rebase_cycle(self.cycle);
            self.cycle = 0;
        }

        if self.cycle % self.config.polls_per_second == 0 {
            self.refresh_display(now);
        }

        PollOutcome { now, alarm, synced }
    }

    /// Poll forever at the configured interval
    pub async fn run<N, T, W>(&mut self, connector: &mut N, time_service: &mut T, delay: &mut W) -> !
    where
        N: NetworkConnector,
        T: TimeService,
        W: DelayNs,
    {
        loop {
            self.poll(connector, time_service, delay).await;
            delay.delay_ms(self.config.poll_interval_ms).await;
        }
    }

    /// Poll cycles since start or since the last local midnight
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    pub fn alarm_active(&self) -> bool {
        self.alarm.is_active()
    }

    pub fn clock(&mut self) -> &mut S {
        &mut self.clock
    }

    pub fn peripherals(&self) -> &Peripherals<D, L, Z, B> {
        &self.io
    }

    fn button_pressed(&mut self) -> bool {
        match self.io.button.is_high() {
            Ok(level) => level,
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Button read failed: {:?}", defmt::Debug2Format(&_e));
                false
            }
        }
    }

    /// Write each output whose level differs from the last successful write
    ///
    /// A failed write leaves its entry untouched, so it is retried next poll.
    fn apply_outputs(&mut self, outputs: AlarmOutputs) {
        if self.applied.led_on != Some(outputs.led_on) {
            match self.io.led.set_state(PinState::from(outputs.led_on)) {
                Ok(()) => self.applied.led_on = Some(outputs.led_on),
                Err(_e) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("LED write failed: {:?}", defmt::Debug2Format(&_e));
                }
            }
        }
        if self.applied.buzzer_on != Some(outputs.buzzer_on) {
            match self.io.buzzer.set_state(PinState::from(outputs.buzzer_on)) {
                Ok(()) => self.applied.buzzer_on = Some(outputs.buzzer_on),
                Err(_e) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Buzzer write failed: {:?}", defmt::Debug2Format(&_e));
                }
            }
        }
        if self.applied.blink != Some(outputs.blink) {
            match self.io.display.set_blink_rate(outputs.blink) {
                Ok(()) => self.applied.blink = Some(outputs.blink),
                Err(_e) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Display blink failed: {:?}", defmt::Debug2Format(&_e));
                }
            }
        }
    }

    fn refresh_display(&mut self, now: SecondsOfDay) {
        if let Err(_e) = self.io.display.render(&hhmm(now)) {
            #[cfg(feature = "defmt")]
            defmt::warn!("Display update failed: {:?}", defmt::Debug2Format(&_e));
        }
    }
}

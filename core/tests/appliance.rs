//! Poll-loop tests driving the appliance with fake peripherals

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use clock_core::{
    AlarmConfig, AlarmEvent, Appliance, BlinkRate, CalendarTimestamp, ClockConfig, Peripherals,
    RtcClockSource, SecondsOfDay, TickClockSource,
};
use embassy_futures::block_on;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use embedded_hal_async::delay::DelayNs;
use hal_abstractions::{DisplayDevice, HardwareClock, NetworkConnector, TimeService};

/// RTC whose wall time the test moves by hand
#[derive(Clone, Default)]
struct FakeRtc {
    unix: Rc<Cell<u64>>,
    writes: Rc<Cell<u32>>,
}

impl FakeRtc {
    fn set_local(&self, hour: u8, minute: u8, second: u8) {
        let ts = CalendarTimestamp::new(2024, 6, 1, hour, minute, second).unwrap();
        self.unix.set(ts.to_unix());
    }

    fn advance(&self, secs: u64) {
        self.unix.set(self.unix.get() + secs);
    }

    fn local(&self) -> CalendarTimestamp {
        CalendarTimestamp::from_unix(self.unix.get())
    }
}

impl HardwareClock for FakeRtc {
    type Error = Infallible;

    fn get(&mut self) -> Result<CalendarTimestamp, Infallible> {
        Ok(self.local())
    }

    fn set(&mut self, timestamp: CalendarTimestamp) -> Result<(), Infallible> {
        self.unix.set(timestamp.to_unix());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

#[derive(Clone, Default)]
struct FakeDisplay {
    shown: Rc<RefCell<Vec<String>>>,
    blink: Rc<Cell<BlinkRate>>,
    /// Number of upcoming blink-rate writes that NACK
    failing_blink_writes: Rc<Cell<u32>>,
}

/// Bus error reported by the fake display
#[derive(Debug)]
struct Nack;

impl FakeDisplay {
    fn last(&self) -> Option<String> {
        self.shown.borrow().last().cloned()
    }
}

impl DisplayDevice for FakeDisplay {
    type Error = Nack;

    fn render(&mut self, text: &str) -> Result<(), Nack> {
        self.shown.borrow_mut().push(text.into());
        Ok(())
    }

    fn set_blink_rate(&mut self, rate: BlinkRate) -> Result<(), Nack> {
        let failing = self.failing_blink_writes.get();
        if failing > 0 {
            self.failing_blink_writes.set(failing - 1);
            return Err(Nack);
        }
        self.blink.set(rate);
        Ok(())
    }
}

/// Output pin recording its level and how often it changed
#[derive(Clone, Default)]
struct FakePin {
    high: Rc<Cell<bool>>,
    toggles: Rc<Cell<u32>>,
}

impl ErrorType for FakePin {
    type Error = Infallible;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        if self.high.replace(false) {
            self.toggles.set(self.toggles.get() + 1);
        }
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        if !self.high.replace(true) {
            self.toggles.set(self.toggles.get() + 1);
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
struct FakeButton {
    pressed: Rc<Cell<bool>>,
}

impl ErrorType for FakeButton {
    type Error = Infallible;
}

impl InputPin for FakeButton {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.pressed.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.pressed.get())
    }
}

#[derive(Default)]
struct Network {
    down_for: u32,
    connects: u32,
}

impl NetworkConnector for Network {
    async fn connect(&mut self) -> bool {
        self.connects += 1;
        if self.down_for > 0 {
            self.down_for -= 1;
            return false;
        }
        true
    }
}

struct Ntp {
    utc: CalendarTimestamp,
}

impl TimeService for Ntp {
    type Error = Infallible;

    async fn fetch_utc_now(&mut self) -> Result<CalendarTimestamp, Infallible> {
        Ok(self.utc)
    }
}

#[derive(Default)]
struct NoDelay;

impl DelayNs for NoDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}

struct Rig {
    rtc: FakeRtc,
    display: FakeDisplay,
    led: FakePin,
    buzzer: FakePin,
    button: FakeButton,
    network: Network,
    ntp: Ntp,
    delay: NoDelay,
    appliance: Appliance<RtcClockSource<FakeRtc>, FakeDisplay, FakePin, FakePin, FakeButton>,
}

impl Rig {
    fn new(config: ClockConfig, alarm: AlarmConfig) -> Self {
        let rtc = FakeRtc::default();
        let display = FakeDisplay::default();
        let led = FakePin::default();
        let buzzer = FakePin::default();
        let button = FakeButton::default();
        let appliance = Appliance::new(
            RtcClockSource::new(rtc.clone(), config.utc_offset_hours),
            Peripherals {
                display: display.clone(),
                led: led.clone(),
                buzzer: buzzer.clone(),
                button: button.clone(),
            },
            config,
            alarm,
        )
        .unwrap();
        Self {
            rtc,
            display,
            led,
            buzzer,
            button,
            network: Network::default(),
            // 2024-06-01 20:00 UTC is 13:00 Pacific daylight time
            ntp: Ntp {
                utc: CalendarTimestamp::new(2024, 6, 1, 20, 0, 0).unwrap(),
            },
            delay: NoDelay,
            appliance,
        }
    }

    fn start(&mut self) {
        block_on(
            self.appliance
                .start(&mut self.network, &mut self.ntp, &mut self.delay),
        );
    }

    fn poll(&mut self) -> clock_core::PollOutcome {
        block_on(
            self.appliance
                .poll(&mut self.network, &mut self.ntp, &mut self.delay),
        )
    }

    /// One second of wall time at 100 polls per second
    fn run_second(&mut self) -> Vec<clock_core::PollOutcome> {
        self.rtc.advance(1);
        (0..100).map(|_| self.poll()).collect()
    }
}

fn default_rig() -> Rig {
    Rig::new(ClockConfig::default(), AlarmConfig::default())
}

#[test]
fn startup_syncs_and_shows_local_time() {
    let mut rig = default_rig();
    rig.start();

    assert_eq!(rig.rtc.writes.get(), 1);
    assert_eq!(
        rig.rtc.local(),
        CalendarTimestamp::new(2024, 6, 1, 13, 0, 0).unwrap()
    );
    assert_eq!(rig.display.last().as_deref(), Some("13:00"));
    assert_eq!(rig.display.blink.get(), BlinkRate::Off);
    assert!(!rig.led.high.get());
    assert!(!rig.buzzer.high.get());
}

#[test]
fn startup_waits_for_network() {
    let mut rig = default_rig();
    rig.network.down_for = 7;
    rig.start();
    assert_eq!(rig.network.connects, 8);
    assert_eq!(rig.display.last().as_deref(), Some("13:00"));
}

#[test]
fn display_refreshes_once_per_second() {
    let mut rig = default_rig();
    rig.start();
    let before = rig.display.shown.borrow().len();
    rig.run_second();
    rig.run_second();
    assert_eq!(rig.display.shown.borrow().len(), before + 2);
}

#[test]
fn alarm_sounds_for_its_window() {
    let mut rig = default_rig();
    rig.start();
    rig.rtc.set_local(5, 29, 59);
    rig.poll();
    assert!(!rig.appliance.alarm_active());

    let outcomes = rig.run_second(); // 05:30:00
    assert_eq!(outcomes[0].alarm, Some(AlarmEvent::Started));
    assert!(rig.appliance.alarm_active());
    assert_eq!(rig.display.blink.get(), BlinkRate::Flash);
    // On at the first poll, then flipped every 50 polls
    assert_eq!(rig.buzzer.toggles.get(), 2);
    assert_eq!(rig.led.toggles.get(), 2);

    for _ in 0..298 {
        rig.run_second();
    }
    assert_eq!(rig.appliance.clock().local_datetime().unwrap().seconds_of_day(), 20_098);
    rig.run_second(); // 05:34:59
    assert!(rig.appliance.alarm_active());

    let outcomes = rig.run_second(); // 05:35:00
    assert_eq!(outcomes[0].alarm, Some(AlarmEvent::Expired));
    assert!(!rig.appliance.alarm_active());
    assert!(!rig.led.high.get());
    assert!(!rig.buzzer.high.get());
    assert_eq!(rig.display.blink.get(), BlinkRate::Off);
}

#[test]
fn button_cancels_alarm_for_the_day() {
    let mut rig = default_rig();
    rig.start();
    rig.rtc.set_local(5, 29, 59);
    rig.poll();
    rig.run_second();
    assert!(rig.appliance.alarm_active());

    for _ in 0..49 {
        rig.run_second();
    }
    rig.button.pressed.set(true);
    rig.rtc.advance(1); // 05:30:50
    assert_eq!(rig.poll().alarm, Some(AlarmEvent::Cancelled));
    rig.button.pressed.set(false);

    assert!(!rig.appliance.alarm_active());
    assert!(!rig.buzzer.high.get());
    assert!(!rig.led.high.get());
    assert_eq!(rig.display.blink.get(), BlinkRate::Off);

    let toggles = rig.buzzer.toggles.get();
    for _ in 0..300 {
        rig.run_second();
    }
    assert!(!rig.appliance.alarm_active());
    assert_eq!(rig.buzzer.toggles.get(), toggles);
}

#[test]
fn noon_resync_corrects_drift() {
    let mut rig = default_rig();
    rig.start();
    // RTC drifted 5 s fast; the network says it is 19:00:02 UTC (12:00:02 local)
    rig.rtc.set_local(11, 59, 59);
    rig.ntp.utc = CalendarTimestamp::new(2024, 6, 1, 19, 0, 2).unwrap();
    rig.poll();
    let connects = rig.network.connects;

    let outcomes = rig.run_second(); // RTC reads 12:00:00
    let report = outcomes[0].synced.expect("resync at noon");
    assert!(report.dst);
    assert_eq!(report.local, SecondsOfDay::from_hms(12, 0, 2).unwrap());
    assert_eq!(rig.network.connects, connects + 1);
    assert_eq!(
        rig.rtc.local(),
        CalendarTimestamp::new(2024, 6, 1, 12, 0, 2).unwrap()
    );
    // Only once for the whole second
    assert!(outcomes[1..].iter().all(|o| o.synced.is_none()));
}

#[test]
fn midnight_resets_cycle_counter() {
    let mut rig = default_rig();
    rig.start();
    rig.rtc.set_local(23, 59, 58);
    rig.run_second();
    assert!(rig.appliance.cycle() >= 100);

    rig.rtc.advance(1); // 00:00:00 next day
    let outcome = rig.poll();
    assert_eq!(outcome.now, SecondsOfDay::MIDNIGHT);
    assert_eq!(rig.appliance.cycle(), 0);
    assert_eq!(rig.display.last().as_deref(), Some("00:00"));
}

#[test]
fn tick_clock_variant_runs_the_same_loop() {
    let display = FakeDisplay::default();
    let buzzer = FakePin::default();
    let config = ClockConfig::default();
    let mut appliance = Appliance::new(
        TickClockSource::new(config.utc_offset_hours, config.polls_per_second),
        Peripherals {
            display: display.clone(),
            led: FakePin::default(),
            buzzer: buzzer.clone(),
            button: FakeButton::default(),
        },
        config,
        AlarmConfig::from_hhmm("1301", 60).unwrap(),
    )
    .unwrap();
    let mut network = Network::default();
    let mut ntp = Ntp {
        utc: CalendarTimestamp::new(2024, 6, 1, 20, 0, 0).unwrap(),
    };
    let mut delay = NoDelay;

    block_on(appliance.start(&mut network, &mut ntp, &mut delay));
    assert_eq!(display.last().as_deref(), Some("13:00"));

    let mut started = false;
    for _ in 0..(60 * 100) {
        let outcome = block_on(appliance.poll(&mut network, &mut ntp, &mut delay));
        started |= outcome.alarm == Some(AlarmEvent::Started);
    }
    assert!(started);
    assert!(appliance.alarm_active());
    assert!(buzzer.toggles.get() > 0);
    assert_eq!(display.last().as_deref(), Some("13:01"));
}

#[test]
fn failed_blink_write_is_retried() {
    let mut rig = default_rig();
    rig.start();
    rig.rtc.set_local(5, 29, 59);
    rig.poll();
    rig.run_second(); // 05:30:00
    assert_eq!(rig.display.blink.get(), BlinkRate::Flash);

    rig.display.failing_blink_writes.set(1);
    rig.button.pressed.set(true);
    rig.rtc.advance(1);
    assert_eq!(rig.poll().alarm, Some(AlarmEvent::Cancelled));
    rig.button.pressed.set(false);
    assert_eq!(rig.display.blink.get(), BlinkRate::Flash);

    rig.poll();
    assert_eq!(rig.display.blink.get(), BlinkRate::Off);
    for _ in 0..10 {
        rig.run_second();
    }
    assert_eq!(rig.display.blink.get(), BlinkRate::Off);
    assert!(!rig.buzzer.high.get());
}

#[test]
fn toggle_cadence_holds_across_midnight() {
    let mut rig = Rig::new(
        ClockConfig::default(),
        AlarmConfig::from_hhmm("2359", 300).unwrap(),
    );
    rig.start();
    rig.rtc.set_local(23, 58, 59);
    rig.poll();
    let outcomes = rig.run_second(); // 23:59:00
    assert_eq!(outcomes[0].alarm, Some(AlarmEvent::Started));

    let mut previous = rig.buzzer.toggles.get();
    for _ in 0..59 {
        rig.run_second();
        assert_eq!(rig.buzzer.toggles.get() - previous, 2);
        previous = rig.buzzer.toggles.get();
    }

    let outcomes = rig.run_second(); // 00:00:00
    assert_eq!(outcomes[0].now, SecondsOfDay::MIDNIGHT);
    assert!(rig.appliance.alarm_active());
    assert_eq!(rig.buzzer.toggles.get() - previous, 2);
    assert_eq!(rig.led.toggles.get(), rig.buzzer.toggles.get());
}

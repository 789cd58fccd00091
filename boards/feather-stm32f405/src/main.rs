#![deny(unsafe_code)]
#![deny(warnings)]
#![no_main]
#![no_std]

use defmt_rtt as _; // global logger
use panic_probe as _;
use rtic::app;
use rtic_monotonics::stm32::prelude::*;

mod delay;
mod display;
mod eth;
mod network;
mod rtc;

stm32_tim2_monotonic!(Mono, 1_000_000);

#[app(device = embassy_stm32, peripherals = true, dispatchers = [USART1, USART2])]
mod app {
    use super::*;
    use defmt::{info, unwrap, warn};
    use embassy_futures::join::join3;
    use embassy_stm32::exti::ExtiInput;
    use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
    use embassy_stm32::i2c::{self, I2c};
    use embassy_stm32::peripherals;
    use embassy_stm32::rcc::{Hse, HseMode, LsConfig, LseConfig, LseMode};
    use embassy_stm32::rtc::{Rtc, RtcConfig};
    use embassy_stm32::spi::{self, Spi};
    use embassy_stm32::time::Hertz;

    use clock_core::{AlarmConfig, Appliance, ClockConfig, Peripherals, RtcClockSource};
    use display::Ht16k33;
    use delay::MonoDelay;
    use network::{EthernetConnector, NetworkConfig, SntpClient, SntpConfig};
    use rtc::StmRtc;

    type SpiPeripheral = embassy_stm32::Peri<'static, peripherals::SPI2>;
    type PinPB13 = embassy_stm32::Peri<'static, peripherals::PB13>;
    type PinPB15 = embassy_stm32::Peri<'static, peripherals::PB15>;
    type PinPB14 = embassy_stm32::Peri<'static, peripherals::PB14>;
    type PinPC6 = embassy_stm32::Peri<'static, peripherals::PC6>;
    type PinPC3 = embassy_stm32::Peri<'static, peripherals::PC3>;
    type PinPC2 = embassy_stm32::Peri<'static, peripherals::PC2>;
    type ExtiChannel = embassy_stm32::Peri<'static, peripherals::EXTI2>;
    type DmaTx = embassy_stm32::Peri<'static, peripherals::DMA1_CH4>;
    type DmaRx = embassy_stm32::Peri<'static, peripherals::DMA1_CH3>;

    struct NetworkPeripherals {
        spi: SpiPeripheral,
        sck: PinPB13,
        mosi: PinPB15,
        miso: PinPB14,
        cs: PinPC6,
        reset: PinPC3,
        int: PinPC2,
        exti: ExtiChannel,
        dma_tx: DmaTx,
        dma_rx: DmaRx,
    }

    /// Everything the clock itself drives
    ///
    /// Feather pin names: D5 button (active high, pulled down), D9 buzzer,
    /// D10 button LED, SCL/SDA to the HT16K33 backpack.
    struct ClockPeripherals {
        rtc: embassy_stm32::Peri<'static, peripherals::RTC>,
        i2c: embassy_stm32::Peri<'static, peripherals::I2C1>,
        scl: embassy_stm32::Peri<'static, peripherals::PB6>,
        sda: embassy_stm32::Peri<'static, peripherals::PB7>,
        button: embassy_stm32::Peri<'static, peripherals::PC7>,
        buzzer: embassy_stm32::Peri<'static, peripherals::PB8>,
        led: embassy_stm32::Peri<'static, peripherals::PB9>,
    }

    #[shared]
    struct Shared {}

    #[local]
    struct Local {}

    #[init]
    fn init(_cx: init::Context) -> (Shared, Local) {
        info!("Network alarm clock starting...");

        // Adafruit Feather STM32F405: 12 MHz HSE, 32.768 kHz LSE (PC14/PC15)
        let mut config = embassy_stm32::Config::default();
        config.rcc.hse = Some(Hse {
            freq: Hertz(12_000_000),
            mode: HseMode::Oscillator,
        });

        // HSE (12 MHz) / PREDIV(6) = 2 MHz (PLL input)
        // 2 MHz * MUL(168) = 336 MHz (VCO)
        // VCO / DIVP(4) = 84 MHz (SYSCLK)
        // VCO / DIVQ(7) = 48 MHz
        config.rcc.pll_src = embassy_stm32::rcc::PllSource::HSE;
        config.rcc.pll = Some(embassy_stm32::rcc::Pll {
            prediv: embassy_stm32::rcc::PllPreDiv::DIV6,
            mul: embassy_stm32::rcc::PllMul::MUL168,
            divp: Some(embassy_stm32::rcc::PllPDiv::DIV4),
            divq: Some(embassy_stm32::rcc::PllQDiv::DIV7),
            divr: None,
        });
        config.rcc.sys = embassy_stm32::rcc::Sysclk::PLL1_P;
        config.rcc.ahb_pre = embassy_stm32::rcc::AHBPrescaler::DIV1; // 84 MHz
        config.rcc.apb1_pre = embassy_stm32::rcc::APBPrescaler::DIV2; // 42 MHz
        config.rcc.apb2_pre = embassy_stm32::rcc::APBPrescaler::DIV1; // 84 MHz

        config.rcc.ls = LsConfig {
            rtc: embassy_stm32::rcc::RtcClockSource::LSE,
            lsi: false,
            lse: Some(LseConfig {
                frequency: Hertz(32_768),
                mode: LseMode::Oscillator(embassy_stm32::rcc::LseDrive::MediumHigh),
            }),
        };

        let p = embassy_stm32::init(config);

        // TIM2 on APB1: timer clock = 2*APB1 when prescaler != 1
        let timer_clock_hz = 84_000_000;
        Mono::start(timer_clock_hz);
        info!("TIM2 monotonic timer initialized at 1 MHz");

        let net_periph = NetworkPeripherals {
            spi: p.SPI2,
            sck: p.PB13,
            mosi: p.PB15,
            miso: p.PB14,
            cs: p.PC6,
            reset: p.PC3,
            int: p.PC2,
            exti: p.EXTI2,
            dma_tx: p.DMA1_CH4,
            dma_rx: p.DMA1_CH3,
        };

        let clock_periph = ClockPeripherals {
            rtc: p.RTC,
            i2c: p.I2C1,
            scl: p.PB6,
            sda: p.PB7,
            button: p.PC7,
            buzzer: p.PB8,
            led: p.PB9,
        };

        clock_task::spawn(net_periph, clock_periph).ok();

        (Shared {}, Local {})
    }

    /// Clock task: network stack runners plus the clock poll loop
    ///
    /// Stack is !Send and must remain within this task.
    #[task(priority = 1)]
    async fn clock_task(
        _cx: clock_task::Context,
        net: NetworkPeripherals,
        io: ClockPeripherals,
    ) {
        use embassy_net::{Config, StackResources};
        use static_cell::StaticCell;

        let network_config = NetworkConfig::default();
        let clock_config = ClockConfig::default();
        let alarm_config = AlarmConfig::default();
        info!(
            "Alarm at {} for {} s, UTC offset {} h",
            alarm_config.trigger, alarm_config.duration_secs, clock_config.utc_offset_hours
        );

        let mut spi_config = spi::Config::default();
        spi_config.frequency = Hertz(10_000_000); // 10 MHz for W5500

        let spi = Spi::new(
            net.spi, net.sck, net.mosi, net.miso, net.dma_tx, net.dma_rx, spi_config,
        );

        let eth_periph = eth::EthPeripherals {
            spi,
            cs: Output::new(net.cs, Level::High, Speed::VeryHigh),
            reset: Output::new(net.reset, Level::High, Speed::Low),
            int: ExtiInput::new(net.int, net.exti, Pull::Up),
        };

        let (device, w5500_runner) =
            unwrap!(eth::init_w5500(eth_periph, network_config.mac_addr).await);

        static RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
        let (stack, mut net_runner) = embassy_net::new(
            device,
            Config::dhcpv4(Default::default()),
            RESOURCES.init(StackResources::new()),
            network_config.seed,
        );
        info!("Network stack initialized with DHCP");

        let rtc = StmRtc::new(Rtc::new(io.rtc, RtcConfig::default()));
        info!("Internal RTC initialized with LSE (32.768kHz)");

        let mut display = Ht16k33::new(I2c::new_blocking(
            io.i2c,
            io.scl,
            io.sda,
            i2c::Config::default(),
        ));
        if let Err(e) = display.init() {
            warn!("HT16K33 init failed: {:?}", e);
        }

        let peripherals = Peripherals {
            display,
            led: Output::new(io.led, Level::Low, Speed::Low),
            buzzer: Output::new(io.buzzer, Level::Low, Speed::Low),
            button: Input::new(io.button, Pull::Down),
        };

        let app_logic = async {
            let mut appliance = unwrap!(Appliance::new(
                RtcClockSource::new(rtc, clock_config.utc_offset_hours),
                peripherals,
                clock_config,
                alarm_config,
            ));
            let mut connector = EthernetConnector::new(stack, network_config);
            let mut sntp = SntpClient::new(stack, SntpConfig::default());
            let mut delay = MonoDelay;

            let report = appliance.start(&mut connector, &mut sntp, &mut delay).await;
            info!(
                "Clock set after {} attempt(s): {} UTC",
                report.attempts, report.utc
            );
            appliance.run(&mut connector, &mut sntp, &mut delay).await
        };

        join3(w5500_runner.run(), net_runner.run(), app_logic).await;
    }

    /// RTIC idle task - WFI sleep mode when no tasks active
    #[idle]
    fn idle(_cx: idle::Context) -> ! {
        loop {
            cortex_m::asm::wfi();
        }
    }
}

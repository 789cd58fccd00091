//! W5500 Ethernet FeatherWing bring-up

use defmt::info;
use embassy_embedded_hal::shared_bus::asynch::spi::SpiDevice as SpiDeviceBus;
use embassy_net_wiznet::chip::W5500;
use embassy_net_wiznet::{Device, Runner};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::Output;
use embassy_stm32::mode::Async;
use embassy_stm32::spi::Spi;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use static_cell::StaticCell;

use crate::network::NetworkError;

type SpiBus = SpiDeviceBus<'static, CriticalSectionRawMutex, Spi<'static, Async>, Output<'static>>;

/// Runner that must be polled for the W5500 to move packets
pub type W5500Runner = Runner<'static, W5500, SpiBus, ExtiInput<'static>, Output<'static>>;

/// Ethernet peripherals bundle
pub struct EthPeripherals<'a> {
    pub spi: Spi<'a, Async>,
    pub cs: Output<'a>,
    pub reset: Output<'a>,
    pub int: ExtiInput<'a>,
}

/// Reset the W5500 and hand back the embassy-net device and its runner
pub async fn init_w5500(
    periph: EthPeripherals<'static>,
    mac_addr: [u8; 6],
) -> Result<(Device<'static>, W5500Runner), NetworkError> {
    let EthPeripherals {
        spi,
        cs,
        mut reset,
        int,
    } = periph;

    reset.set_low();
    embassy_time::Timer::after_millis(1).await;
    reset.set_high();
    embassy_time::Timer::after_millis(2).await;

    type SpiBusType = embassy_sync::mutex::Mutex<CriticalSectionRawMutex, Spi<'static, Async>>;
    static SPI_BUS: StaticCell<SpiBusType> = StaticCell::new();
    let spi_bus = SPI_BUS.init(embassy_sync::mutex::Mutex::new(spi));
    let spi_device = SpiDeviceBus::new(spi_bus, cs);

    info!(
        "MAC address: {:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        mac_addr[0], mac_addr[1], mac_addr[2], mac_addr[3], mac_addr[4], mac_addr[5]
    );

    static STATE: StaticCell<embassy_net_wiznet::State<8, 8>> = StaticCell::new();
    let state = STATE.init(embassy_net_wiznet::State::<8, 8>::new());

    let (device, runner) = embassy_net_wiznet::new(mac_addr, state, spi_device, int, reset)
        .await
        .map_err(|_| NetworkError::DeviceInit)?;

    info!("W5500 initialized");
    Ok((device, runner))
}

//! Link bring-up for the sync job
//!
//! A connect attempt succeeds once DHCP has handed out an address. Each
//! attempt waits at most `dhcp_timeout_ms`; the caller decides whether and
//! when to try again.

use defmt::{info, warn};
use embassy_futures::select::{select, Either};
use embassy_net::Stack;
use embassy_time::{Duration, Timer};
use hal_abstractions::NetworkConnector;

use super::config::NetworkConfig;

pub struct EthernetConnector {
    stack: Stack<'static>,
    config: NetworkConfig,
}

impl EthernetConnector {
    pub fn new(stack: Stack<'static>, config: NetworkConfig) -> Self {
        Self { stack, config }
    }

    fn log_address(&self) {
        if let Some(config) = self.stack.config_v4() {
            let octets = config.address.address().octets();
            info!(
                "IP: {}.{}.{}.{}",
                octets[0], octets[1], octets[2], octets[3]
            );

            if let Some(gateway) = config.gateway {
                let gw_octets = gateway.octets();
                info!(
                    "Gateway: {}.{}.{}.{}",
                    gw_octets[0], gw_octets[1], gw_octets[2], gw_octets[3]
                );
            }
        }
    }
}

impl NetworkConnector for EthernetConnector {
    async fn connect(&mut self) -> bool {
        if self.stack.is_config_up() {
            return true;
        }

        if !self.stack.is_link_up() {
            warn!("Ethernet link is down");
        }
        info!("Waiting for DHCP...");
        let timeout = Timer::after(Duration::from_millis(self.config.dhcp_timeout_ms));
        match select(timeout, self.stack.wait_config_up()).await {
            Either::First(_) => {
                warn!("No DHCP lease after {} ms", self.config.dhcp_timeout_ms);
                false
            }
            Either::Second(()) => {
                info!("Network is UP!");
                self.log_address();
                true
            }
        }
    }
}

//! `DelayNs` on top of the TIM2 monotonic

use embedded_hal_async::delay::DelayNs;
use rtic_monotonics::fugit::ExtU64;
use rtic_monotonics::Monotonic;

use crate::Mono;

pub struct MonoDelay;

impl DelayNs for MonoDelay {
    async fn delay_ns(&mut self, ns: u32) {
        // Mono ticks at 1 MHz
        Mono::delay((ns as u64).div_ceil(1_000).micros()).await;
    }

    async fn delay_us(&mut self, us: u32) {
        Mono::delay((us as u64).micros()).await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        Mono::delay((ms as u64).millis()).await;
    }
}

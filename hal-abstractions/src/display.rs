//! Seven-segment display abstraction

/// Display blink modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlinkRate {
    /// Steady display
    #[default]
    Off,
    /// Attention flash while the alarm sounds
    Flash,
}

/// A display that renders short text such as `"05:30"`
pub trait DisplayDevice {
    type Error: core::fmt::Debug;

    /// Show `text`, replacing what was shown before
    fn render(&mut self, text: &str) -> Result<(), Self::Error>;

    /// Change the blink mode of the whole display
    fn set_blink_rate(&mut self, rate: BlinkRate) -> Result<(), Self::Error>;
}

//! HT16K33 four-digit seven-segment backpack over I2C

use clock_core::display::{ht16k33, Segments, DIGITS};
use embedded_hal::i2c::I2c;
use hal_abstractions::{BlinkRate, DisplayDevice};

/// Default backpack address (no solder jumpers)
pub const DEFAULT_ADDRESS: u8 = 0x70;

/// Display RAM addresses of the four digits; the colon sits at 0x04
const DIGIT_ADDRESSES: [usize; DIGITS] = [0x00, 0x02, 0x06, 0x08];
const COLON_ADDRESS: usize = 0x04;
const COLON_BITS: u8 = 0x02;

pub struct Ht16k33<I> {
    i2c: I,
    address: u8,
}

impl<I: I2c> Ht16k33<I> {
    pub fn new(i2c: I) -> Self {
        Self {
            i2c,
            address: DEFAULT_ADDRESS,
        }
    }

    /// Start the oscillator, switch the display on and set half brightness
    pub fn init(&mut self) -> Result<(), I::Error> {
        self.command(ht16k33::OSCILLATOR_ON)?;
        self.set_blink_rate(BlinkRate::Off)?;
        self.command(ht16k33::dimming(ht16k33::DEFAULT_BRIGHTNESS))
    }

    fn command(&mut self, command: u8) -> Result<(), I::Error> {
        self.i2c.write(self.address, &[command])
    }

    fn write_frame(&mut self, frame: &Segments) -> Result<(), I::Error> {
        // Register pointer followed by display RAM 0x00..=0x09
        let mut buffer = [0u8; 11];
        for (address, glyph) in DIGIT_ADDRESSES.iter().zip(frame.digits) {
            buffer[1 + address] = glyph;
        }
        if frame.colon {
            buffer[1 + COLON_ADDRESS] = COLON_BITS;
        }
        self.i2c.write(self.address, &buffer)
    }
}

impl<I: I2c> DisplayDevice for Ht16k33<I> {
    type Error = I::Error;

    fn render(&mut self, text: &str) -> Result<(), I::Error> {
        self.write_frame(&Segments::from_text(text))
    }

    fn set_blink_rate(&mut self, rate: BlinkRate) -> Result<(), I::Error> {
        self.command(ht16k33::display_setup(rate))
    }
}

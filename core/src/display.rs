//! Display text and seven-segment glyphs

use core::fmt::Write;

use hal_abstractions::BlinkRate;
use heapless::String;

use crate::time_of_day::SecondsOfDay;

/// Number of digit positions on the display
pub const DIGITS: usize = 4;

/// Zero-padded 24-hour `HH:MM`
pub fn hhmm(now: SecondsOfDay) -> String<5> {
    let mut text = String::new();
    // Five characters always fit
    let _ = write!(text, "{:02}:{:02}", now.hour(), now.minute());
    text
}

/// Segment bits for one character, bit 0 = segment A through bit 6 = G
///
/// Characters without a glyph render blank.
pub fn glyph(c: char) -> u8 {
    match c {
        '0' => 0x3F,
        '1' => 0x06,
        '2' => 0x5B,
        '3' => 0x4F,
        '4' => 0x66,
        '5' => 0x6D,
        '6' => 0x7D,
        '7' => 0x07,
        '8' => 0x7F,
        '9' => 0x6F,
        '-' => 0x40,
        '_' => 0x08,
        _ => 0x00,
    }
}

/// Decimal point bit
pub const DP: u8 = 0x80;

/// A full display frame: four digit glyphs and the centre colon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Segments {
    pub digits: [u8; DIGITS],
    pub colon: bool,
}

impl Segments {
    /// Lay out text such as `"05:30"` or `"12.34"` left to right
    ///
    /// `:` lights the colon, `.` adds a decimal point to the previous digit,
    /// characters past the fourth digit are dropped.
    pub fn from_text(text: &str) -> Self {
        let mut frame = Self::default();
        let mut pos = 0;
        for c in text.chars() {
            match c {
                ':' => frame.colon = true,
                '.' if pos > 0 => frame.digits[pos - 1] |= DP,
                _ if pos < DIGITS => {
                    frame.digits[pos] = glyph(c);
                    pos += 1;
                }
                _ => {}
            }
        }
        frame
    }
}

/// HT16K33 backpack command bytes
pub mod ht16k33 {
    use super::BlinkRate;

    pub const OSCILLATOR_ON: u8 = 0x21;
    /// Half of the 0..=15 dimming range
    pub const DEFAULT_BRIGHTNESS: u8 = 7;

    const DISPLAY_SETUP: u8 = 0x80;
    const DISPLAY_ON: u8 = 0x01;
    const DIMMING: u8 = 0xE0;

    /// Display on, blink field in bits 2:1 (0b01 = 2 Hz, 0b10 = 1 Hz)
    pub const fn display_setup(rate: BlinkRate) -> u8 {
        let blink = match rate {
            BlinkRate::Off => 0b00,
            BlinkRate::Flash => 0b10,
        };
        DISPLAY_SETUP | DISPLAY_ON | (blink << 1)
    }

    /// Dimming command, level clamped to 15
    pub const fn dimming(level: u8) -> u8 {
        let level = if level > 15 { 15 } else { level };
        DIMMING | level
    }
}

//! lcdstat Hardware Library
//!
//! Drives HD44780-compatible character LCDs wired to a PCF8574 I2C GPIO
//! expander in 4-bit mode. Supports direct writes to the panel as well as
//! an off-screen text buffer that is committed in a single flush.

pub mod error;
pub mod lcd;
mod transport;

pub use error::{Error, Result};
pub use lcd::{
    bar, Addressing, CursorStyle, Geometry, Lcd, Mode, PinMap, TextBuffer, BAR_GLYPHS,
};
pub use linux_embedded_hal::{Delay, I2cdev};

/// Default I2C address of PCF8574A-based LCD backpacks.
pub const DEFAULT_ADDRESS: u8 = 0x3F;

/// Number of user-definable glyph slots in CGRAM.
pub const GLYPH_SLOTS: u8 = 8;

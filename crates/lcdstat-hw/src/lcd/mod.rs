//! Character LCD module.
//!
//! Provides control over an HD44780 display attached through a PCF8574 expander.

mod buffer;
mod device;
#[cfg(test)]
pub(crate) mod mock;
mod protocol;

pub mod bar;

pub use bar::BAR_GLYPHS;
pub use buffer::TextBuffer;
pub use device::{Addressing, Geometry, Lcd};
pub use protocol::{CursorStyle, Mode, PinMap};

//! LCD display state and command surface.

use crate::transport::{open_bus, Expander};
use crate::{Error, Result, GLYPH_SLOTS};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use linux_embedded_hal::{Delay, I2cdev};
use std::path::Path;
use tracing::{debug, info, warn};

use super::bar::{self, BAR_GLYPHS};
use super::buffer::TextBuffer;
use super::protocol::{
    self, cell_address, encode, line_address, next_ddram_address, BusWrite, CursorStyle, Mode,
    PinMap, CMD_CLEAR, CMD_DISPLAY_OFF, CMD_SET_CGRAM, CMD_SET_DDRAM, CMD_SHIFT_LEFT,
    CMD_SHIFT_RIGHT, INIT_COMMANDS, LINE_LENGTH,
};

/// Panel size in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    rows: usize,
    columns: usize,
}

impl Geometry {
    /// Creates a geometry. Both dimensions must be positive.
    pub fn new(rows: usize, columns: usize) -> Result<Self> {
        if rows == 0 || columns == 0 {
            return Err(Error::InvalidGeometry { rows, columns });
        }
        Ok(Self { rows, columns })
    }

    /// Returns the number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    pub fn columns(&self) -> usize {
        self.columns
    }
}

/// Where character writes go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Addressing {
    /// Every write reaches the controller immediately.
    #[default]
    Direct,
    /// Character writes are staged in the off-screen buffer until `flush`.
    Buffered,
}

/// HD44780 display controller.
///
/// Owns the bus for its whole lifetime. Not meant to be shared between
/// callers; every operation blocks for the controller's settle times.
pub struct Lcd<I2C = I2cdev, D = Delay> {
    expander: Expander<I2C>,
    delay: D,
    pins: PinMap,
    geometry: Geometry,
    powered: bool,
    cursor: CursorStyle,
    backlight: bool,
    addressing: Addressing,
    buffer: TextBuffer,
    /// Mirror of the controller's DDRAM address counter.
    address: u8,
    glyphs: [Option<[u8; 7]>; GLYPH_SLOTS as usize],
    needs_resync: bool,
}

impl Lcd {
    /// Opens the display on an i2c-dev bus and initialises the controller.
    pub fn open<P: AsRef<Path>>(
        path: P,
        address: u8,
        geometry: Geometry,
        pins: PinMap,
    ) -> Result<Self> {
        let bus = open_bus(path)?;
        Self::new(bus, address, Delay, geometry, pins)
    }
}

impl<I2C: I2c, D: DelayNs> Lcd<I2C, D> {
    /// Takes ownership of the bus, probes the expander at `address` and
    /// runs the controller initialisation sequence.
    pub fn new(
        i2c: I2C,
        address: u8,
        delay: D,
        geometry: Geometry,
        pins: PinMap,
    ) -> Result<Self> {
        let mut lcd = Self {
            expander: Expander::new(i2c, address)?,
            delay,
            pins,
            geometry,
            powered: true,
            cursor: CursorStyle::default(),
            backlight: true,
            addressing: Addressing::default(),
            buffer: TextBuffer::new(geometry.rows(), geometry.columns()),
            address: 0,
            glyphs: [None; GLYPH_SLOTS as usize],
            needs_resync: false,
        };
        lcd.initialize()?;
        info!(
            "LCD initialised at 0x{:02X} ({} rows x {} columns)",
            lcd.expander.address(),
            geometry.rows(),
            geometry.columns()
        );
        Ok(lcd)
    }

    /// Resets the controller into 4-bit mode, clears it and turns it on
    /// with the cursor hidden. Always talks to the hardware.
    fn initialize(&mut self) -> Result<()> {
        for write in protocol::reset_sequence(&self.pins, self.backlight) {
            self.write(write)?;
        }
        for command in INIT_COMMANDS {
            self.command(command)?;
        }
        self.address = 0;
        Ok(())
    }

    /// Re-initialises the controller after a failed transfer.
    ///
    /// Replays the initialisation sequence, then restores glyph definitions,
    /// power state and cursor style. Buffer contents are kept; the panel
    /// itself is blank until the next print or flush.
    pub fn resync(&mut self) -> Result<()> {
        warn!("Re-initialising LCD controller");
        self.initialize()?;

        let glyphs = self.glyphs;
        for (slot, pattern) in glyphs.iter().enumerate() {
            if let Some(pattern) = pattern {
                self.define_glyph(slot as u8, pattern)?;
            }
        }

        if !self.powered {
            self.command(CMD_DISPLAY_OFF)?;
        } else if self.cursor != CursorStyle::Hidden {
            self.command(self.cursor.command())?;
        }

        self.needs_resync = false;
        debug!("LCD controller re-synchronised");
        Ok(())
    }

    fn write(&mut self, write: BusWrite) -> Result<()> {
        if let Err(e) = self.expander.write_byte(write.byte) {
            warn!("Expander write of 0x{:02X} failed: {}", write.byte, e);
            self.needs_resync |= e.needs_resync();
            return Err(e);
        }
        self.delay.delay_us(write.settle_us);
        Ok(())
    }

    /// Sends one byte to the controller, bypassing the buffer.
    fn transfer(&mut self, value: u8, mode: Mode) -> Result<()> {
        for write in encode(&self.pins, value, mode, self.backlight) {
            self.write(write)?;
        }
        Ok(())
    }

    fn command(&mut self, command: u8) -> Result<()> {
        self.transfer(command, Mode::Command)
    }

    fn set_ddram_address(&mut self, address: u8) -> Result<()> {
        self.command(CMD_SET_DDRAM | address)?;
        self.address = address;
        Ok(())
    }

    /// Writes one character cell, to the buffer or the controller depending on mode.
    fn put(&mut self, byte: u8) -> Result<()> {
        match self.addressing {
            Addressing::Buffered => self.buffer.put(byte),
            Addressing::Direct => {
                self.transfer(byte, Mode::Data)?;
                self.address = next_ddram_address(self.address);
                Ok(())
            }
        }
    }

    /// Moves the cursor. Row and column wrap around the panel size.
    pub fn cursor_pos(&mut self, row: usize, column: usize) -> Result<()> {
        let row = row % self.geometry.rows();
        let column = column % self.geometry.columns();

        match self.addressing {
            Addressing::Direct => {
                let address = cell_address(row, column)?;
                self.set_ddram_address(address)
            }
            Addressing::Buffered => {
                self.buffer.set_cursor(row, column);
                Ok(())
            }
        }
    }

    /// Clears the panel, or blanks the buffer in buffered mode.
    pub fn clear(&mut self) -> Result<()> {
        match self.addressing {
            Addressing::Direct => {
                self.command(CMD_CLEAR)?;
                self.address = 0;
            }
            Addressing::Buffered => self.buffer.clear(),
        }
        Ok(())
    }

    /// Turns the display on with the last selected cursor style.
    pub fn on(&mut self) -> Result<()> {
        self.powered = true;
        self.command(self.cursor.command())
    }

    /// Turns the display off. The cursor style is remembered.
    pub fn off(&mut self) -> Result<()> {
        self.powered = false;
        self.command(CMD_DISPLAY_OFF)
    }

    /// Selects the cursor style, applying it at once if the display is on.
    pub fn set_cursor_style(&mut self, style: CursorStyle) -> Result<()> {
        self.cursor = style;
        debug!("Cursor style set to {}", style);
        if self.powered {
            self.on()?;
        }
        Ok(())
    }

    /// Hides the cursor.
    pub fn cursor_no(&mut self) -> Result<()> {
        self.set_cursor_style(CursorStyle::Hidden)
    }

    /// Shows an underline cursor.
    pub fn cursor_solid(&mut self) -> Result<()> {
        self.set_cursor_style(CursorStyle::Solid)
    }

    /// Shows a blinking cursor.
    pub fn cursor_blink(&mut self) -> Result<()> {
        self.set_cursor_style(CursorStyle::Blink)
    }

    /// Switches the backlight. Takes effect immediately with a standalone write.
    pub fn set_backlight(&mut self, on: bool) -> Result<()> {
        self.backlight = on;
        let byte = if on { self.pins.backlight() } else { 0 };
        self.write(BusWrite {
            byte,
            settle_us: 0,
        })
    }

    /// Turns the backlight on.
    pub fn backlight_on(&mut self) -> Result<()> {
        self.set_backlight(true)
    }

    /// Turns the backlight off.
    pub fn backlight_off(&mut self) -> Result<()> {
        self.set_backlight(false)
    }

    /// Shifts the visible window one position left.
    pub fn shift_left(&mut self) -> Result<()> {
        self.command(CMD_SHIFT_LEFT)
    }

    /// Shifts the visible window one position right.
    pub fn shift_right(&mut self) -> Result<()> {
        self.command(CMD_SHIFT_RIGHT)
    }

    /// Prints text at the cursor without any wrapping.
    ///
    /// Characters outside the controller's 8-bit range print as `?`.
    pub fn print(&mut self, text: &str) -> Result<()> {
        for ch in text.chars() {
            self.put(u8::try_from(ch).unwrap_or(b'?'))?;
        }
        Ok(())
    }

    /// Prints raw character codes, including custom glyph codes 0-7.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        for &byte in bytes {
            self.put(byte)?;
        }
        Ok(())
    }

    /// Defines a custom glyph from seven 5-bit rows. The eighth row is blank.
    ///
    /// DDRAM addressing is restored afterwards so the next print continues
    /// at the cursor position.
    pub fn define_glyph(&mut self, slot: u8, pattern: &[u8; 7]) -> Result<()> {
        if slot >= GLYPH_SLOTS {
            return Err(Error::GlyphSlotOutOfRange(slot));
        }

        self.command(CMD_SET_CGRAM | (slot << 3))?;
        for &row in pattern {
            self.transfer(row, Mode::Data)?;
        }
        self.transfer(0x00, Mode::Data)?;
        self.command(CMD_SET_DDRAM | self.address)?;

        self.glyphs[slot as usize] = Some(*pattern);
        debug!("Defined glyph {}", slot);
        Ok(())
    }

    /// Loads the bar graph glyphs into all eight CGRAM slots.
    pub fn define_bar_glyphs(&mut self) -> Result<()> {
        for (slot, pattern) in BAR_GLYPHS.iter().enumerate() {
            self.define_glyph(slot as u8, pattern)?;
        }
        Ok(())
    }

    /// Draws a bar of `filled` dots out of `max` dots at the cursor.
    ///
    /// Requires the bar glyphs to be loaded with [`Lcd::define_bar_glyphs`].
    pub fn bar_display(&mut self, filled: usize, max: usize) -> Result<()> {
        self.write_bytes(&bar::cells(filled, max))
    }

    /// Stages subsequent character writes in the off-screen buffer.
    pub fn buffer_on(&mut self) {
        self.addressing = Addressing::Buffered;
        debug!("Buffered addressing enabled");
    }

    /// Sends subsequent character writes straight to the controller.
    pub fn buffer_off(&mut self) {
        self.addressing = Addressing::Direct;
        debug!("Direct addressing enabled");
    }

    /// Writes the whole buffer to the controller.
    ///
    /// Rows go out in DDRAM address order so that the controller's address
    /// counter carries from one row into the next (rows 0, 2, 1, 3 on a
    /// 20x4 panel). An address command is only sent where it does not. The
    /// buffer cursor returns to the first cell.
    pub fn flush(&mut self) -> Result<()> {
        let order = self.flush_order()?;
        self.buffer.rewind();

        for row in order {
            let base = line_address(row)?;
            if self.address != base {
                self.set_ddram_address(base)?;
            }
            let cells = self.buffer.row(row).to_vec();
            for byte in cells {
                self.transfer(byte, Mode::Data)?;
                self.address = next_ddram_address(self.address);
            }
        }

        debug!("Flushed {} cells", self.buffer.capacity());
        Ok(())
    }

    fn flush_order(&self) -> Result<Vec<usize>> {
        if self.geometry.columns() > LINE_LENGTH {
            return Err(Error::ColumnOutOfRange {
                column: self.geometry.columns() - 1,
                supported: LINE_LENGTH,
            });
        }
        let mut rows = Vec::with_capacity(self.geometry.rows());
        for row in 0..self.geometry.rows() {
            rows.push((line_address(row)?, row));
        }
        rows.sort_unstable();
        Ok(rows.into_iter().map(|(_, row)| row).collect())
    }

    /// Returns the panel size.
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Returns the current addressing mode.
    pub fn addressing(&self) -> Addressing {
        self.addressing
    }

    /// Returns true if the display is on.
    pub fn is_on(&self) -> bool {
        self.powered
    }

    /// Returns the remembered cursor style.
    pub fn cursor_style(&self) -> CursorStyle {
        self.cursor
    }

    /// Returns true if the backlight is on.
    pub fn backlight(&self) -> bool {
        self.backlight
    }

    /// Returns the off-screen buffer.
    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    /// Returns the linear write position in the off-screen buffer.
    pub fn buffer_position(&self) -> usize {
        self.buffer.cursor()
    }

    /// Returns the tracked DDRAM address counter.
    pub fn ddram_address(&self) -> u8 {
        self.address
    }

    /// Returns true after a failed transfer until [`Lcd::resync`] succeeds.
    pub fn needs_resync(&self) -> bool {
        self.needs_resync
    }

    /// Returns the bus.
    pub fn bus(&self) -> &I2C {
        self.expander.bus()
    }

    /// Returns the bus mutably.
    pub fn bus_mut(&mut self) -> &mut I2C {
        self.expander.bus_mut()
    }
}

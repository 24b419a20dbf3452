//! HD44780 4-bit protocol definitions and encoding.
//!
//! Protocol structure:
//! - Each logical byte is sent as two nibbles, high nibble first
//! - Each nibble is latched by pulsing the enable line: low, high, low
//! - RS selects the instruction register (command) or data register
//! - RW is held low; the controller is never read back

use crate::{Error, Result};

/// Clear display and return the address counter to 0.
pub const CMD_CLEAR: u8 = 0x01;

/// Function set: 4-bit interface, 2 lines, 5x8 font.
pub const CMD_FUNCTION_SET_4BIT_2LINE: u8 = 0x28;

/// Display control with the display switched off.
pub const CMD_DISPLAY_OFF: u8 = 0x08;

/// Shift the whole display one position left.
pub const CMD_SHIFT_LEFT: u8 = 0x18;

/// Shift the whole display one position right.
pub const CMD_SHIFT_RIGHT: u8 = 0x1C;

/// Set CGRAM address (OR with `slot * 8`).
pub const CMD_SET_CGRAM: u8 = 0x40;

/// Set DDRAM address (OR with the 7-bit address).
pub const CMD_SET_DDRAM: u8 = 0x80;

/// Nibble that selects 8-bit mode during the reset procedure.
pub const RESET_NIBBLE_8BIT: u8 = 0x3;

/// Nibble that switches the interface to 4-bit mode.
pub const RESET_NIBBLE_4BIT: u8 = 0x2;

/// Settle time around each enable edge.
pub const ENABLE_SETTLE_US: u32 = 100;

/// Execution time allowed for a data write.
pub const DATA_SETTLE_US: u32 = 50;

/// Execution time allowed for a command.
pub const COMMAND_SETTLE_US: u32 = 5000;

/// Settle times after each reset pulse: three 8-bit resets then the 4-bit switch.
pub const RESET_SETTLE_US: [u32; 4] = [5000, 200, 200, 5000];

/// Number of lines with a DDRAM base address.
pub const LINE_COUNT: usize = 4;

/// Characters per DDRAM line in 2-line mode.
pub const LINE_LENGTH: usize = 40;

/// Register selected by a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Instruction register (RS low).
    Command,
    /// Data register, DDRAM or CGRAM depending on the last address set (RS high).
    Data,
}

impl Mode {
    /// Time the controller needs to execute a transfer of this kind.
    pub fn settle_us(self) -> u32 {
        match self {
            Mode::Command => COMMAND_SETTLE_US,
            Mode::Data => DATA_SETTLE_US,
        }
    }
}

/// Cursor appearance while the display is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CursorStyle {
    /// Display on, cursor hidden.
    #[default]
    Hidden = 0x0C,
    /// Display on, underline cursor.
    Solid = 0x0E,
    /// Display on, blinking block cursor.
    Blink = 0x0F,
}

impl CursorStyle {
    /// Display control command that turns the display on with this cursor.
    pub fn command(self) -> u8 {
        self as u8
    }
}

impl std::str::FromStr for CursorStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hidden" | "none" | "no" => Ok(CursorStyle::Hidden),
            "solid" => Ok(CursorStyle::Solid),
            "blink" => Ok(CursorStyle::Blink),
            _ => Err(format!("unknown cursor style: {}", s)),
        }
    }
}

impl std::fmt::Display for CursorStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CursorStyle::Hidden => write!(f, "hidden"),
            CursorStyle::Solid => write!(f, "solid"),
            CursorStyle::Blink => write!(f, "blink"),
        }
    }
}

/// Assignment of controller lines to expander output bits.
///
/// Every field is a single-bit mask. `data` holds D4..D7 in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    rs: u8,
    rw: u8,
    enable: u8,
    backlight: u8,
    data: [u8; 4],
}

impl Default for PinMap {
    /// Common PCF8574 backpack wiring: P0=RS, P1=RW, P2=EN, P3=BL, P4..P7=D4..D7.
    fn default() -> Self {
        Self {
            rs: 0x01,
            rw: 0x02,
            enable: 0x04,
            backlight: 0x08,
            data: [0x10, 0x20, 0x40, 0x80],
        }
    }
}

impl PinMap {
    /// Builds a pin map from expander bit indices (0-7).
    pub fn new(rs: u8, rw: u8, enable: u8, backlight: u8, data: [u8; 4]) -> Result<Self> {
        let bits = [rs, rw, enable, backlight, data[0], data[1], data[2], data[3]];
        let mut used = 0u8;
        for bit in bits {
            if bit > 7 {
                return Err(Error::InvalidPinMap(format!(
                    "bit {} does not exist on an 8-bit expander",
                    bit
                )));
            }
            let mask = 1 << bit;
            if used & mask != 0 {
                return Err(Error::InvalidPinMap(format!(
                    "bit {} assigned more than once",
                    bit
                )));
            }
            used |= mask;
        }

        Ok(Self {
            rs: 1 << rs,
            rw: 1 << rw,
            enable: 1 << enable,
            backlight: 1 << backlight,
            data: data.map(|bit| 1 << bit),
        })
    }

    /// Register-select mask.
    pub fn rs(&self) -> u8 {
        self.rs
    }

    /// Read/write mask. Always driven low.
    pub fn rw(&self) -> u8 {
        self.rw
    }

    /// Enable strobe mask.
    pub fn enable(&self) -> u8 {
        self.enable
    }

    /// Backlight mask.
    pub fn backlight(&self) -> u8 {
        self.backlight
    }

    /// Places the low four bits of `nibble` on the data lines.
    pub fn nibble(&self, nibble: u8) -> u8 {
        self.data
            .iter()
            .enumerate()
            .filter(|(i, _)| nibble & (1 << i) != 0)
            .fold(0, |acc, (_, &mask)| acc | mask)
    }

    /// Control bits shared by every byte of a transfer.
    pub fn control(&self, mode: Mode, backlight: bool) -> u8 {
        let mut control = if backlight { self.backlight } else { 0 };
        if mode == Mode::Data {
            control |= self.rs;
        }
        control
    }
}

/// One expander write followed by a settle delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusWrite {
    /// Full expander output state.
    pub byte: u8,
    /// Delay after the write, in microseconds.
    pub settle_us: u32,
}

impl BusWrite {
    const fn new(byte: u8, settle_us: u32) -> Self {
        Self { byte, settle_us }
    }
}

/// Builds the enable pulse that latches one nibble.
///
/// `lines` is the expander state (data lines and control bits) without enable.
/// The controller samples on the rising edge and executes after the falling
/// edge, so `settle_us` follows the final write.
pub fn pulse(pins: &PinMap, lines: u8, settle_us: u32) -> [BusWrite; 3] {
    [
        BusWrite::new(lines, ENABLE_SETTLE_US),
        BusWrite::new(lines | pins.enable(), ENABLE_SETTLE_US),
        BusWrite::new(lines, settle_us),
    ]
}

/// Encodes one logical transfer as six expander writes.
pub fn encode(pins: &PinMap, value: u8, mode: Mode, backlight: bool) -> [BusWrite; 6] {
    let control = pins.control(mode, backlight);
    let settle = mode.settle_us();
    let [h0, h1, h2] = pulse(pins, pins.nibble(value >> 4) | control, settle);
    let [l0, l1, l2] = pulse(pins, pins.nibble(value & 0x0F) | control, settle);
    [h0, h1, h2, l0, l1, l2]
}

/// Builds the reset pulses that bring the controller from an unknown
/// power-on state into 4-bit mode.
pub fn reset_sequence(pins: &PinMap, backlight: bool) -> Vec<BusWrite> {
    let control = pins.control(Mode::Command, backlight);
    let nibbles = [
        RESET_NIBBLE_8BIT,
        RESET_NIBBLE_8BIT,
        RESET_NIBBLE_8BIT,
        RESET_NIBBLE_4BIT,
    ];
    nibbles
        .iter()
        .zip(RESET_SETTLE_US)
        .flat_map(|(&nibble, settle)| pulse(pins, pins.nibble(nibble) | control, settle))
        .collect()
}

/// Commands sent through the 4-bit encoder once the interface is in 4-bit mode.
pub const INIT_COMMANDS: [u8; 3] = [
    CMD_FUNCTION_SET_4BIT_2LINE,
    CMD_CLEAR,
    CursorStyle::Hidden as u8,
];

/// DDRAM base address of a display line.
///
/// The controller interleaves lines: line 2 continues line 0 and line 3
/// continues line 1, so the bases are not `row * columns`.
pub fn line_address(row: usize) -> Result<u8> {
    match row {
        0 => Ok(0x00),
        1 => Ok(0x40),
        2 => Ok(0x14),
        3 => Ok(0x54),
        _ => Err(Error::RowOutOfRange {
            row,
            supported: LINE_COUNT,
        }),
    }
}

/// DDRAM address of a cell.
pub fn cell_address(row: usize, column: usize) -> Result<u8> {
    let base = line_address(row)?;
    if column >= LINE_LENGTH {
        return Err(Error::ColumnOutOfRange {
            column,
            supported: LINE_LENGTH,
        });
    }
    Ok(base + column as u8)
}

/// Address the controller's counter moves to after a data write in 2-line mode.
pub fn next_ddram_address(address: u8) -> u8 {
    match address {
        0x27 => 0x40,
        0x67 => 0x00,
        a => a.wrapping_add(1) & 0x7F,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_data() {
        let pins = PinMap::default();
        let writes = encode(&pins, b'A', Mode::Data, true);
        let bytes: Vec<u8> = writes.iter().map(|w| w.byte).collect();
        // 'A' = 0x41: high nibble 0x40, low nibble 0x10, RS|BL = 0x09
        assert_eq!(bytes, vec![0x49, 0x4D, 0x49, 0x19, 0x1D, 0x19]);

        let settles: Vec<u32> = writes.iter().map(|w| w.settle_us).collect();
        assert_eq!(settles, vec![100, 100, 50, 100, 100, 50]);
    }

    #[test]
    fn test_encode_command() {
        let pins = PinMap::default();
        let writes = encode(&pins, CMD_CLEAR, Mode::Command, false);
        let bytes: Vec<u8> = writes.iter().map(|w| w.byte).collect();
        assert_eq!(bytes, vec![0x00, 0x04, 0x00, 0x10, 0x14, 0x10]);
        assert_eq!(writes[2].settle_us, 5000);
        assert_eq!(writes[5].settle_us, 5000);
    }

    #[test]
    fn test_rw_never_driven() {
        let pins = PinMap::default();
        for value in 0..=255u8 {
            for mode in [Mode::Command, Mode::Data] {
                for write in encode(&pins, value, mode, true) {
                    assert_eq!(write.byte & pins.rw(), 0);
                }
            }
        }
    }

    #[test]
    fn test_custom_pin_map() {
        // Data on the low nibble, control on the high nibble.
        let pins = PinMap::new(4, 5, 6, 7, [0, 1, 2, 3]).unwrap();
        assert_eq!(pins.nibble(0xA), 0x0A);
        let writes = encode(&pins, 0x5A, Mode::Data, true);
        assert_eq!(writes[0].byte, 0x05 | 0x10 | 0x80);
        assert_eq!(writes[1].byte, 0x05 | 0x10 | 0x80 | 0x40);
        assert_eq!(writes[3].byte, 0x0A | 0x10 | 0x80);
    }

    #[test]
    fn test_pin_map_validation() {
        assert!(PinMap::new(0, 1, 2, 3, [4, 5, 6, 8]).is_err());
        assert!(PinMap::new(0, 1, 2, 2, [4, 5, 6, 7]).is_err());
        assert_eq!(PinMap::new(0, 1, 2, 3, [4, 5, 6, 7]).unwrap(), PinMap::default());
    }

    #[test]
    fn test_reset_sequence() {
        let pins = PinMap::default();
        let writes = reset_sequence(&pins, true);
        assert_eq!(writes.len(), 12);
        assert_eq!(writes[0].byte, 0x38);
        assert_eq!(writes[1].byte, 0x3C);
        assert_eq!(writes[2], BusWrite::new(0x38, 5000));
        assert_eq!(writes[5].settle_us, 200);
        assert_eq!(writes[8].settle_us, 200);
        assert_eq!(writes[9].byte, 0x28);
        assert_eq!(writes[10].byte, 0x2C);
        assert_eq!(writes[11].settle_us, 5000);
    }

    #[test]
    fn test_line_addresses() {
        let commands: Vec<u8> = (0..4)
            .map(|row| CMD_SET_DDRAM | line_address(row).unwrap())
            .collect();
        assert_eq!(commands, vec![0x80, 0xC0, 0x94, 0xD4]);
        assert!(matches!(
            line_address(4),
            Err(Error::RowOutOfRange { row: 4, supported: 4 })
        ));
    }

    #[test]
    fn test_cell_addresses_stay_on_line() {
        // 20x4 panel: every cell of a row lies within its own line range.
        for row in 0..4 {
            let base = line_address(row).unwrap();
            for column in 0..20 {
                let address = cell_address(row, column).unwrap();
                assert!(address >= base && address < base + 20);
                assert!(address < 0x68);
            }
        }
        assert!(cell_address(0, 40).is_err());
    }

    #[test]
    fn test_address_counter_wrap() {
        assert_eq!(next_ddram_address(0x00), 0x01);
        assert_eq!(next_ddram_address(0x13), 0x14);
        assert_eq!(next_ddram_address(0x27), 0x40);
        assert_eq!(next_ddram_address(0x67), 0x00);
    }

    #[test]
    fn test_cursor_style_parse() {
        assert_eq!("blink".parse::<CursorStyle>().unwrap(), CursorStyle::Blink);
        assert_eq!("Solid".parse::<CursorStyle>().unwrap(), CursorStyle::Solid);
        assert!("dashed".parse::<CursorStyle>().is_err());
    }
}

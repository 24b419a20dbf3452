//! Error types for the lcdstat hardware library.

use embedded_hal::i2c::ErrorKind;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when interacting with the display.
#[derive(Error, Debug)]
pub enum Error {
    /// The I2C bus device could not be opened.
    #[error("Failed to open I2C device {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The probe read found no device at the target address.
    #[error("No device responded at 0x{address:02X}: {kind:?}")]
    Probe { address: u8, kind: ErrorKind },

    /// I2C target addresses are 7 bits wide.
    #[error("Invalid I2C address 0x{0:02X} (must be 0x00-0x7F)")]
    InvalidAddress(u8),

    /// Rows and columns must both be positive.
    #[error("Invalid geometry: {rows} rows x {columns} columns")]
    InvalidGeometry { rows: usize, columns: usize },

    /// Expander wiring map is unusable.
    #[error("Invalid pin map: {0}")]
    InvalidPinMap(String),

    /// A byte write to the expander failed mid-sequence. The controller's
    /// nibble framing is undefined afterwards until it is re-initialised.
    #[error("Transfer to expander failed: {0:?}")]
    Transfer(ErrorKind),

    /// Row has no DDRAM line address on this controller.
    #[error("Row {row} out of range (controller addresses {supported} lines)")]
    RowOutOfRange { row: usize, supported: usize },

    /// Column lies past the end of a DDRAM line.
    #[error("Column {column} out of range (DDRAM lines hold {supported} characters)")]
    ColumnOutOfRange { column: usize, supported: usize },

    /// CGRAM holds eight glyphs.
    #[error("Glyph slot {0} out of range (must be 0-7)")]
    GlyphSlotOutOfRange(u8),

    /// Buffered write past the end of the off-screen buffer.
    #[error("Buffer overrun at position {position} (capacity {capacity})")]
    BufferOverrun { position: usize, capacity: usize },
}

impl Error {
    /// Returns true if the controller must be re-initialised before further use.
    pub fn needs_resync(&self) -> bool {
        matches!(self, Error::Transfer(_))
    }
}

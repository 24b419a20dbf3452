//! PCF8574 expander on an I2C bus.
//!
//! Every byte written sets all eight expander outputs at once, so the
//! expander has no notion of registers or multi-byte frames.

use crate::{Error, Result};
use embedded_hal::i2c::{Error as _, I2c};
use std::path::Path;
use tracing::{debug, info};

/// Opens a Linux i2c-dev bus.
pub fn open_bus<P: AsRef<Path>>(path: P) -> Result<linux_embedded_hal::I2cdev> {
    let path = path.as_ref();
    let bus = linux_embedded_hal::I2cdev::new(path).map_err(|e| Error::Open {
        path: path.display().to_string(),
        source: Box::new(e),
    })?;
    info!("Opened I2C bus {}", path.display());
    Ok(bus)
}

/// Expander output register at a fixed 7-bit address.
#[derive(Debug)]
pub struct Expander<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Expander<I2C> {
    /// Binds the bus to `address` and probes it with a one-byte read.
    pub fn new(mut i2c: I2C, address: u8) -> Result<Self> {
        if address > 0x7F {
            return Err(Error::InvalidAddress(address));
        }

        let mut register = [0u8; 1];
        i2c.read(address, &mut register)
            .map_err(|e| Error::Probe {
                address,
                kind: e.kind(),
            })?;
        debug!("Probe read 0x{:02X} from expander", register[0]);

        Ok(Self { i2c, address })
    }

    /// Writes one byte. A single attempt is made; failures are not retried.
    pub fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.i2c
            .write(self.address, &[byte])
            .map_err(|e| Error::Transfer(e.kind()))
    }

    /// Returns the target address.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Returns the bus.
    pub fn bus(&self) -> &I2C {
        &self.i2c
    }

    /// Returns the bus mutably.
    pub fn bus_mut(&mut self) -> &mut I2C {
        &mut self.i2c
    }
}

//! In-memory display bus for daemon tests.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use lcdstat_hw::{Geometry, Lcd, PinMap};

/// Records expander writes and can be made to drop one.
#[derive(Debug, Default)]
pub struct Bus {
    pub bytes: Vec<u8>,
    fail_at: Option<usize>,
    writes: usize,
}

impl Bus {
    /// Fails the write `n` bytes from now.
    pub fn fail_after(&mut self, n: usize) {
        self.fail_at = Some(self.writes + n);
    }
}

impl ErrorType for Bus {
    type Error = ErrorKind;
}

impl I2c for Bus {
    fn transaction(
        &mut self,
        _address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for operation in operations {
            match operation {
                Operation::Read(buffer) => buffer.fill(0xFF),
                Operation::Write(bytes) => {
                    for &byte in bytes.iter() {
                        let write = self.writes;
                        self.writes += 1;
                        if self.fail_at == Some(write) {
                            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
                        }
                        self.bytes.push(byte);
                    }
                }
            }
        }
        Ok(())
    }
}

pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// A display on an in-memory bus.
pub fn lcd(rows: usize, columns: usize) -> Lcd<Bus, NoDelay> {
    let geometry = Geometry::new(rows, columns).unwrap();
    Lcd::new(
        Bus::default(),
        lcdstat_hw::DEFAULT_ADDRESS,
        NoDelay,
        geometry,
        PinMap::default(),
    )
    .unwrap()
}

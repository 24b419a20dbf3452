//! In-memory I2C bus and delay for driver tests.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

/// Records every byte written; optionally fails the N-th write.
#[derive(Debug, Default)]
pub struct Recorder {
    pub bytes: Vec<u8>,
    pub fail_at: Option<usize>,
    pub reads: usize,
    pub target: Option<u8>,
    absent: bool,
    attempts: usize,
}

impl Recorder {
    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::default()
        }
    }

    /// A bus with nothing answering at any address.
    pub fn absent() -> Self {
        Self {
            absent: true,
            ..Self::default()
        }
    }
}

impl ErrorType for Recorder {
    type Error = ErrorKind;
}

impl I2c for Recorder {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if self.absent {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        self.target = Some(address);

        for operation in operations {
            match operation {
                Operation::Read(buffer) => {
                    self.reads += 1;
                    buffer.fill(0xFF);
                }
                Operation::Write(bytes) => {
                    for &byte in bytes.iter() {
                        let attempt = self.attempts;
                        self.attempts += 1;
                        if self.fail_at == Some(attempt) {
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

/// Accumulates requested delays instead of sleeping.
#[derive(Debug, Default)]
pub struct NoDelay {
    pub total_us: u64,
}

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_us += u64::from(ns / 1_000);
    }

    fn delay_us(&mut self, us: u32) {
        self.total_us += u64::from(us);
    }
}

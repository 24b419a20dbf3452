//! System sensors module.
//!
//! Provides CPU, memory and filesystem usage plus local time.

pub mod data;

mod cpu;
mod filesystem;
mod memory;

pub use data::SystemData;

use anyhow::Result;
use cpu::CpuSensor;
use filesystem::FsStat;
use memory::MemStat;
use std::path::PathBuf;

/// Sensors collection for sampling system data.
pub struct Sensors {
    cpu: CpuSensor,
    filesystem: PathBuf,
}

impl Sensors {
    /// Creates the sensors, taking the first CPU reading.
    pub fn new<P: Into<PathBuf>>(filesystem: P) -> Result<Self> {
        Ok(Self {
            cpu: CpuSensor::new()?,
            filesystem: filesystem.into(),
        })
    }

    /// Samples all sensors.
    pub fn sample(&mut self) -> Result<SystemData> {
        let cpu_usage = self.cpu.sample()?;
        let mem = MemStat::read()?;
        let fs = FsStat::read(&self.filesystem)?;

        Ok(SystemData {
            mem_resident: mem.resident_fraction(),
            cpu_usage,
            fs_used_kb: fs.used_kb(),
            fs_used: fs.used_fraction(),
            time: chrono::Local::now().format("%T").to_string(),
        })
    }
}

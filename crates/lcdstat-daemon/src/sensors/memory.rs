//! Memory usage from /proc/meminfo.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Kernel memory accounting file.
pub const PROC_MEMINFO: &str = "/proc/meminfo";

/// Memory counters in kB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemStat {
    pub total_kb: u64,
    pub free_kb: u64,
    pub buffers_kb: u64,
    pub cached_kb: u64,
}

fn field(line: &str, key: &str) -> Option<u64> {
    line.strip_prefix(key)?
        .split_whitespace()
        .next()?
        .parse()
        .ok()
}

impl MemStat {
    /// Parses /proc/meminfo content. Missing keys read as zero.
    pub fn parse(content: &str) -> Self {
        let mut stat = Self::default();
        for line in content.lines() {
            if let Some(v) = field(line, "MemTotal:") {
                stat.total_kb = v;
            } else if let Some(v) = field(line, "MemFree:") {
                stat.free_kb = v;
            } else if let Some(v) = field(line, "Buffers:") {
                stat.buffers_kb = v;
            } else if let Some(v) = field(line, "Cached:") {
                stat.cached_kb = v;
            }
        }
        stat
    }

    /// Reads the counters from a meminfo file.
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::parse(&content))
    }

    /// Reads the current counters.
    pub fn read() -> Result<Self> {
        Self::read_from(PROC_MEMINFO)
    }

    /// Memory held by processes: total minus free, buffers and page cache.
    pub fn resident_kb(&self) -> u64 {
        self.total_kb
            .saturating_sub(self.free_kb + self.buffers_kb + self.cached_kb)
    }

    /// Resident share of total memory, in [0, 1].
    pub fn resident_fraction(&self) -> f64 {
        if self.total_kb == 0 {
            return 0.0;
        }
        self.resident_kb() as f64 / self.total_kb as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMINFO: &str = "MemTotal:        8000000 kB\n\
                           MemFree:         2000000 kB\n\
                           MemAvailable:    5000000 kB\n\
                           Buffers:          500000 kB\n\
                           Cached:          1500000 kB\n\
                           SwapCached:         1234 kB\n";

    #[test]
    fn test_parse() {
        let stat = MemStat::parse(MEMINFO);
        assert_eq!(
            stat,
            MemStat {
                total_kb: 8_000_000,
                free_kb: 2_000_000,
                buffers_kb: 500_000,
                cached_kb: 1_500_000,
            }
        );
    }

    #[test]
    fn test_resident() {
        let stat = MemStat::parse(MEMINFO);
        assert_eq!(stat.resident_kb(), 4_000_000);
        assert!((stat.resident_fraction() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_meminfo() {
        let stat = MemStat::parse("");
        assert_eq!(stat.resident_kb(), 0);
        assert_eq!(stat.resident_fraction(), 0.0);
    }
}

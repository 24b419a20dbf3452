//! CPU usage from /proc/stat jiffies.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Kernel CPU accounting file.
pub const PROC_STAT: &str = "/proc/stat";

/// Aggregate CPU counters in jiffies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuStat {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    /// Sum of the first nine counters (user through guest).
    pub total: u64,
}

impl CpuStat {
    /// Parses the aggregate `cpu` line at the top of /proc/stat.
    pub fn parse(content: &str) -> Option<Self> {
        let line = content.lines().next()?;
        let mut fields = line.split_whitespace();
        if fields.next()? != "cpu" {
            return None;
        }

        let values: Vec<u64> = fields
            .take(9)
            .map(|s| s.parse().ok())
            .collect::<Option<_>>()?;
        if values.len() < 4 {
            return None;
        }

        Some(Self {
            user: values[0],
            nice: values[1],
            system: values[2],
            total: values.iter().sum(),
        })
    }

    /// Reads the counters from a stat file.
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Malformed cpu line in {}", path.display()))
    }

    /// Reads the current counters.
    pub fn read() -> Result<Self> {
        Self::read_from(PROC_STAT)
    }

    /// Counter deltas from `self` to a newer sample.
    pub fn diff(&self, newer: &CpuStat) -> CpuStat {
        CpuStat {
            user: newer.user.saturating_sub(self.user),
            nice: newer.nice.saturating_sub(self.nice),
            system: newer.system.saturating_sub(self.system),
            total: newer.total.saturating_sub(self.total),
        }
    }

    /// Busy share of a delta, in [0, 1].
    pub fn usage_fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let busy = self.user + self.nice + self.system;
        (busy as f64 / self.total as f64).clamp(0.0, 1.0)
    }
}

/// CPU usage sensor. Each sample covers the time since the previous one.
pub struct CpuSensor {
    last: CpuStat,
}

impl CpuSensor {
    /// Creates a sensor primed with the current counters.
    pub fn new() -> Result<Self> {
        Ok(Self {
            last: CpuStat::read()?,
        })
    }

    /// Returns the usage fraction since the last sample.
    pub fn sample(&mut self) -> Result<f64> {
        let now = CpuStat::read()?;
        let usage = self.last.diff(&now).usage_fraction();
        self.last = now;
        Ok(usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT: &str = "cpu  4705 356 584 3699 23 23 0 0 0 0\n\
                        cpu0 1393 280 287 3468 16 19 0 0 0 0\n";

    #[test]
    fn test_parse() {
        let stat = CpuStat::parse(STAT).unwrap();
        assert_eq!(stat.user, 4705);
        assert_eq!(stat.nice, 356);
        assert_eq!(stat.system, 584);
        assert_eq!(stat.total, 4705 + 356 + 584 + 3699 + 23 + 23);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(CpuStat::parse("").is_none());
        assert!(CpuStat::parse("intr 1 2 3 4").is_none());
        assert!(CpuStat::parse("cpu 1 2").is_none());
        assert!(CpuStat::parse("cpu 1 x 3 4").is_none());
    }

    #[test]
    fn test_usage_fraction() {
        let old = CpuStat {
            user: 100,
            nice: 0,
            system: 50,
            total: 1000,
        };
        let new = CpuStat {
            user: 130,
            nice: 10,
            system: 60,
            total: 1200,
        };
        let diff = old.diff(&new);
        assert_eq!(diff.total, 200);
        assert!((diff.usage_fraction() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_idle_interval() {
        let stat = CpuStat::default();
        assert_eq!(stat.diff(&stat).usage_fraction(), 0.0);
    }
}

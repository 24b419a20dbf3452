//! System data aggregation for the status screen.

/// One sample of everything the status screen shows.
#[derive(Debug, Clone, Default)]
pub struct SystemData {
    /// Resident memory share of total (0-1)
    pub mem_resident: f64,
    /// CPU busy share since the previous sample (0-1)
    pub cpu_usage: f64,
    /// Used space on the monitored filesystem in kB
    pub fs_used_kb: u64,
    /// Used share of the monitored filesystem (0-1)
    pub fs_used: f64,
    /// Local time formatted as "HH:MM:SS"
    pub time: String,
}

//! Filesystem usage via statvfs.

use anyhow::{Context, Result};
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// Block counts of a mounted filesystem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsStat {
    /// Size in fragments.
    pub blocks: u64,
    /// Fragments available to unprivileged users.
    pub available: u64,
    /// Fragment size in bytes.
    pub fragment_size: u64,
}

impl FsStat {
    /// Queries the filesystem containing `path`.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let c_path = CString::new(path.as_os_str().as_bytes())
            .with_context(|| format!("Invalid path {}", path.display()))?;

        // SAFETY: statvfs is plain old data, and the call only writes into it.
        let mut st: libc::statvfs = unsafe { std::mem::zeroed() };
        let ret = unsafe { libc::statvfs(c_path.as_ptr(), &mut st) };
        if ret != 0 {
            return Err(std::io::Error::last_os_error())
                .with_context(|| format!("statvfs failed for {}", path.display()));
        }

        Ok(Self {
            blocks: u64::from(st.f_blocks),
            available: u64::from(st.f_bavail),
            fragment_size: u64::from(st.f_frsize),
        })
    }

    /// Space not available to users, in kB.
    pub fn used_kb(&self) -> u64 {
        (self.blocks.saturating_sub(self.available) * self.fragment_size) >> 10
    }

    /// Available share of the filesystem, in [0, 1].
    pub fn free_fraction(&self) -> f64 {
        if self.blocks == 0 {
            return 0.0;
        }
        (self.available as f64 / self.blocks as f64).clamp(0.0, 1.0)
    }

    /// Unavailable share of the filesystem, in [0, 1].
    pub fn used_fraction(&self) -> f64 {
        if self.blocks == 0 {
            return 0.0;
        }
        1.0 - self.free_fraction()
    }
}

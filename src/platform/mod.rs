use std::path::PathBuf;

use crate::error::Result;
use crate::model::{TcpTable, UdpTable};

pub mod owner;
pub mod procnet;

/// A platform's socket tables. Every call takes a fresh snapshot; nothing
/// is cached between calls.
pub trait SocketTableSource: Send + Sync {
    fn tcp_table(&self) -> Result<TcpTable>;
    fn udp_table(&self) -> Result<UdpTable>;
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Root of the proc filesystem. Only read on Linux.
    pub proc_root: PathBuf,
    /// Look up the owning process of each socket. Sources whose tables
    /// already carry the PID ignore this.
    pub resolve_owners: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            proc_root: PathBuf::from("/proc"),
            resolve_owners: true,
        }
    }
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "windows")]
mod windows;
#[cfg(not(any(target_os = "linux", target_os = "windows")))]
mod unsupported;

#[cfg(target_os = "linux")]
pub use linux::ProcNetSource;
#[cfg(target_os = "windows")]
pub use windows::IpHelperSource;

pub fn create_source(config: SourceConfig) -> Box<dyn SocketTableSource> {
    #[cfg(target_os = "linux")]
    {
        Box::new(linux::ProcNetSource::new(config))
    }
    #[cfg(target_os = "windows")]
    {
        let _ = config;
        Box::new(windows::IpHelperSource::new())
    }
    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        let _ = config;
        Box::new(unsupported::UnsupportedSource)
    }
}

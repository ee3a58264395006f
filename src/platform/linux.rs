use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use super::owner::{scan_proc, OwnerIndex};
use super::procnet::{ProcNetRow, ProcNetRows};
use super::{SocketTableSource, SourceConfig};
use crate::error::{Result, SocktabError};
use crate::model::*;

// ---------------------------------------------------------------------------
// ProcNetSource
// ---------------------------------------------------------------------------

/// Reads `<proc_root>/net/{tcp,udp}` and resolves owners through
/// `<proc_root>/<pid>/fd`.
pub struct ProcNetSource {
    config: SourceConfig,
}

impl ProcNetSource {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    fn table_path(&self, name: &str) -> PathBuf {
        self.config.proc_root.join("net").join(name)
    }

    /// Stream the rows of one table into a fallibly grown `ConnectionTable`.
    ///
    /// The owner index is built once the table is open, then each row is
    /// converted as it is read.
    fn read_table<T, F>(&self, name: &str, mut convert: F) -> Result<ConnectionTable<T>>
    where
        F: FnMut(ProcNetRow, &OwnerIndex) -> T,
    {
        let path = self.table_path(name);
        let file = File::open(&path)
            .map_err(|e| SocktabError::unavailable(path.display().to_string(), e))?;
        let owners = self.owner_index();

        let mut table = ConnectionTable::new();
        for row in ProcNetRows::new(BufReader::new(file)) {
            let row = row.map_err(|e| SocktabError::unavailable(path.display().to_string(), e))?;
            table.push(convert(row, &owners))?;
        }
        tracing::debug!(table = %path.display(), rows = table.count(), "read socket table");
        Ok(table)
    }

    /// One index per fetch, so each row is an O(1) lookup.
    fn owner_index(&self) -> OwnerIndex {
        if !self.config.resolve_owners {
            return OwnerIndex::new();
        }
        if !nix::unistd::geteuid().is_root() {
            tracing::debug!("not running as root; sockets of other users' processes stay unresolved");
        }
        scan_proc(&self.config.proc_root)
    }
}

impl SocketTableSource for ProcNetSource {
    fn tcp_table(&self) -> Result<TcpTable> {
        self.read_table("tcp", |row, owners| ConnectionRecord {
            state: TcpState::from_linux(row.state_code),
            local_address: *row.local.ip(),
            local_port: row.local.port(),
            remote_address: *row.remote.ip(),
            remote_port: row.remote.port(),
            owner_pid: owners.resolve_owner(row.inode),
        })
    }

    fn udp_table(&self) -> Result<UdpTable> {
        self.read_table("udp", |row, owners| {
            EndpointRecord::new(row.local, owners.resolve_owner(row.inode))
        })
    }
}

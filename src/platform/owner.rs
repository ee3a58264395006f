use std::collections::HashMap;

/// Socket inode → owning PID, built once per fetch.
///
/// When several processes hold the same socket (e.g. after `fork`), the
/// first process seen keeps it.
#[derive(Debug, Default, Clone)]
pub struct OwnerIndex {
    owners: HashMap<u64, u32>,
}

impl OwnerIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `pid` holds `inode`. Inode 0 is not a real socket and is
    /// ignored.
    pub fn insert(&mut self, inode: u64, pid: u32) {
        if inode == 0 {
            return;
        }
        self.owners.entry(inode).or_insert(pid);
    }

    pub fn resolve_owner(&self, inode: u64) -> Option<u32> {
        self.owners.get(&inode).copied()
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

impl FromIterator<(u64, u32)> for OwnerIndex {
    fn from_iter<I: IntoIterator<Item = (u64, u32)>>(iter: I) -> Self {
        let mut index = OwnerIndex::new();
        for (inode, pid) in iter {
            index.insert(inode, pid);
        }
        index
    }
}

#[cfg(target_os = "linux")]
pub use self::scan::scan_proc;

#[cfg(target_os = "linux")]
mod scan {
    use std::path::Path;

    use procfs::process::FDTarget;

    use super::OwnerIndex;

    /// Walk every `<root>/<pid>/fd` directory once and index socket inodes.
    ///
    /// Processes that exit mid-scan or whose descriptors we may not read are
    /// skipped; their sockets stay unresolved.
    pub fn scan_proc(root: &Path) -> OwnerIndex {
        let mut index = OwnerIndex::new();

        let all_procs = match procfs::process::all_processes_with_root(root) {
            Ok(procs) => procs,
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "cannot list processes; owners left unresolved");
                return index;
            }
        };

        let mut unreadable = 0usize;
        for proc_result in all_procs {
            let proc = match proc_result {
                Ok(p) => p,
                Err(_) => continue,
            };

            let fds = match proc.fd() {
                Ok(fds) => fds,
                Err(e) => {
                    tracing::trace!(pid = proc.pid, error = %e, "skipping process fds");
                    unreadable += 1;
                    continue;
                }
            };

            for fd_info in fds {
                let fd_info = match fd_info {
                    Ok(fi) => fi,
                    Err(_) => continue,
                };
                if let FDTarget::Socket(inode) = fd_info.target {
                    index.insert(inode, proc.pid as u32);
                }
            }
        }

        tracing::debug!(
            sockets = index.len(),
            unreadable_processes = unreadable,
            "built socket owner index"
        );
        index
    }
}

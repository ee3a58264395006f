use std::collections::HashMap;
use std::io::{self, Write};
use std::net::SocketAddrV4;

use sysinfo::System;

use crate::model::{SocketRecord, TcpTable, UdpTable};

/// PID → process name, loaded once per render.
#[derive(Debug, Default)]
pub struct ProcessNames {
    names: HashMap<u32, String>,
}

impl ProcessNames {
    /// Snapshot the names of every running process.
    pub fn load() -> Self {
        let mut sys = System::new();
        sys.refresh_processes();
        let names = sys
            .processes()
            .iter()
            .map(|(pid, proc)| (pid.as_u32(), proc.name().to_string()))
            .collect();
        ProcessNames { names }
    }

    pub fn get(&self, pid: u32) -> Option<&str> {
        self.names.get(&pid).map(String::as_str)
    }
}

impl FromIterator<(u32, String)> for ProcessNames {
    fn from_iter<I: IntoIterator<Item = (u32, String)>>(iter: I) -> Self {
        ProcessNames {
            names: iter.into_iter().collect(),
        }
    }
}

/// Renders socket tables as aligned columns.
pub struct TableFormatter<'a> {
    /// Append a COMMAND column with the owner's process name.
    pub names: Option<&'a ProcessNames>,
}

const TCP_RULE: &str = "--------------------------------------------------------------";
const UDP_RULE: &str = "----------------------------------------------";

impl<'a> TableFormatter<'a> {
    pub fn new(names: Option<&'a ProcessNames>) -> Self {
        TableFormatter { names }
    }

    pub fn write_tcp<W: Write>(&self, out: &mut W, table: &TcpTable) -> io::Result<()> {
        writeln!(out, "Total TCP connections: {}", table.count())?;
        writeln!(out, "{}", TCP_RULE)?;
        write!(
            out,
            "{:>21} {:>21} {:>12} {:>7}",
            "Local Address:Port", "Remote Address:Port", "State", "PID"
        )?;
        self.write_command_header(out)?;
        writeln!(out, "{}", TCP_RULE)?;

        for rec in table {
            write!(
                out,
                "{:>21} {:>21} {:>12} {:>7}",
                format_endpoint(rec.local()),
                format_endpoint(rec.remote()),
                rec.state.to_string(),
                format_pid(rec.owner_pid),
            )?;
            self.write_command(out, rec.owner_pid)?;
        }
        Ok(())
    }

    pub fn write_udp<W: Write>(&self, out: &mut W, table: &UdpTable) -> io::Result<()> {
        writeln!(out, "Total UDP endpoints: {}", table.count())?;
        writeln!(out, "{}", UDP_RULE)?;
        write!(out, "{:>21} {:>12} {:>7}", "Local Address:Port", "State", "PID")?;
        self.write_command_header(out)?;
        writeln!(out, "{}", UDP_RULE)?;

        for rec in table {
            write!(
                out,
                "{:>21} {:>12} {:>7}",
                format_endpoint(rec.local()),
                "LISTENING",
                format_pid(rec.owner_pid),
            )?;
            self.write_command(out, rec.owner_pid)?;
        }
        Ok(())
    }

    fn write_command_header<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.names.is_some() {
            writeln!(out, "  COMMAND")
        } else {
            writeln!(out)
        }
    }

    fn write_command<W: Write>(&self, out: &mut W, pid: Option<u32>) -> io::Result<()> {
        match self.names {
            Some(names) => {
                let name = pid.and_then(|p| names.get(p)).unwrap_or("-");
                writeln!(out, "  {}", name)
            }
            None => writeln!(out),
        }
    }
}

/// Unique owning PIDs across the given records, ascending.
pub fn terse_pids<'r, R, I>(records: I) -> Vec<u32>
where
    R: SocketRecord + 'r,
    I: IntoIterator<Item = &'r R>,
{
    let mut pids: Vec<u32> = records.into_iter().filter_map(|r| r.owner_pid()).collect();
    pids.sort_unstable();
    pids.dedup();
    pids
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn format_endpoint(addr: SocketAddrV4) -> String {
    format!("{}:{}", addr.ip(), addr.port())
}

/// Unresolved owners print as -1.
fn format_pid(pid: Option<u32>) -> String {
    match pid {
        Some(p) => p.to_string(),
        None => "-1".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

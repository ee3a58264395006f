//! IP helper owner-PID tables. The tables carry the owning PID, so no
//! ownership pass is needed.

use std::ffi::c_void;
use std::net::{Ipv4Addr, SocketAddrV4};

use windows::Win32::Foundation::TRUE;
use windows::Win32::NetworkManagement::IpHelper::{
    GetExtendedTcpTable, GetExtendedUdpTable, MIB_TCPROW_OWNER_PID, MIB_TCPTABLE_OWNER_PID,
    MIB_UDPROW_OWNER_PID, MIB_UDPTABLE_OWNER_PID, TCP_TABLE_OWNER_PID_ALL, UDP_TABLE_OWNER_PID,
};
use windows::Win32::Networking::WinSock::AF_INET;

use super::SocketTableSource;
use crate::error::{Result, SocktabError};
use crate::model::*;

const NO_ERROR: u32 = 0;
const ERROR_INSUFFICIENT_BUFFER: u32 = 122;

/// The table can grow between the sizing call and the fetch.
const MAX_SIZING_ATTEMPTS: usize = 3;

pub struct IpHelperSource;

impl IpHelperSource {
    pub fn new() -> Self {
        IpHelperSource
    }
}

impl Default for IpHelperSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a sizing call followed by the real call. The buffer is `u32`-backed
/// so the table header and rows are properly aligned. An empty buffer means
/// the table has no rows.
fn query_table<F>(api: &'static str, call: F) -> Result<Vec<u32>>
where
    F: Fn(Option<*mut c_void>, &mut u32) -> u32,
{
    let mut size = 0u32;
    let mut buffer: Vec<u32> = Vec::new();

    for _ in 0..MAX_SIZING_ATTEMPTS {
        let ptr = if buffer.is_empty() {
            None
        } else {
            Some(buffer.as_mut_ptr() as *mut c_void)
        };
        match call(ptr, &mut size) {
            NO_ERROR if !buffer.is_empty() => return Ok(buffer),
            // An empty table can succeed on the sizing call.
            NO_ERROR => return Ok(Vec::new()),
            ERROR_INSUFFICIENT_BUFFER => {
                let words = (size as usize).div_ceil(std::mem::size_of::<u32>());
                buffer.clear();
                buffer
                    .try_reserve_exact(words)
                    .map_err(|_| SocktabError::AllocationFailure(words))?;
                buffer.resize(words, 0);
            }
            code => {
                return Err(SocktabError::unavailable(api, format!("error code {}", code)));
            }
        }
    }

    Err(SocktabError::unavailable(api, "table kept growing while sizing"))
}

/// IP helper addresses are `DWORD`s holding network-order bytes.
fn addr(dw: u32) -> Ipv4Addr {
    Ipv4Addr::from(dw.to_ne_bytes())
}

/// Ports live in the low 16 bits, in network order.
fn port(dw: u32) -> u16 {
    u16::from_be(dw as u16)
}

impl SocketTableSource for IpHelperSource {
    fn tcp_table(&self) -> Result<TcpTable> {
        let buffer = query_table("GetExtendedTcpTable", |ptr, size| unsafe {
            GetExtendedTcpTable(
                ptr,
                size,
                TRUE,
                AF_INET.0 as u32,
                TCP_TABLE_OWNER_PID_ALL,
                0,
            )
        })?;
        if buffer.is_empty() {
            return Ok(ConnectionTable::new());
        }

        // SAFETY: the buffer was filled by GetExtendedTcpTable and
        // dwNumEntries rows follow the header.
        let rows: &[MIB_TCPROW_OWNER_PID] = unsafe {
            let table = &*(buffer.as_ptr() as *const MIB_TCPTABLE_OWNER_PID);
            std::slice::from_raw_parts(table.table.as_ptr(), table.dwNumEntries as usize)
        };

        let mut table = ConnectionTable::new();
        table.reserve_exact(rows.len())?;
        for row in rows {
            table.push(ConnectionRecord {
                state: TcpState::from_mib(row.dwState),
                local_address: addr(row.dwLocalAddr),
                local_port: port(row.dwLocalPort),
                remote_address: addr(row.dwRemoteAddr),
                remote_port: port(row.dwRemotePort),
                owner_pid: Some(row.dwOwningPid),
            })?;
        }
        tracing::debug!(rows = table.count(), "read TCP owner-PID table");
        Ok(table)
    }

    fn udp_table(&self) -> Result<UdpTable> {
        let buffer = query_table("GetExtendedUdpTable", |ptr, size| unsafe {
            GetExtendedUdpTable(ptr, size, TRUE, AF_INET.0 as u32, UDP_TABLE_OWNER_PID, 0)
        })?;
        if buffer.is_empty() {
            return Ok(ConnectionTable::new());
        }

        // SAFETY: as above, for the UDP table layout.
        let rows: &[MIB_UDPROW_OWNER_PID] = unsafe {
            let table = &*(buffer.as_ptr() as *const MIB_UDPTABLE_OWNER_PID);
            std::slice::from_raw_parts(table.table.as_ptr(), table.dwNumEntries as usize)
        };

        let mut table = ConnectionTable::new();
        table.reserve_exact(rows.len())?;
        for row in rows {
            let local = SocketAddrV4::new(addr(row.dwLocalAddr), port(row.dwLocalPort));
            table.push(EndpointRecord::new(local, Some(row.dwOwningPid)))?;
        }
        tracing::debug!(rows = table.count(), "read UDP owner-PID table");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addr_and_port_byte_order() {
        let dw = u32::from_ne_bytes([127, 0, 0, 1]);
        assert_eq!(addr(dw), Ipv4Addr::LOCALHOST);
        assert_eq!(port(u32::from(8080u16.to_be())), 8080);
    }

    #[test]
    fn test_live_tables() {
        let source = IpHelperSource::new();
        assert!(source.tcp_table().is_ok());
        assert!(source.udp_table().is_ok());
    }
}

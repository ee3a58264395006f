//! Parser for the IPv4 socket tables under `/proc/net` (`tcp`, `udp`).
//!
//! Each line after the header looks like
//!
//! ```text
//!   sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
//!    1: 0100007F:1F90 00000000:0000 0A 00000000:00000000 00:00000000 00000000  1000        0 12345
//! ```
//!
//! The parser only depends on the text, so it is built on every platform.

use std::io::BufRead;
use std::net::{Ipv4Addr, SocketAddrV4};

use thiserror::Error;

use crate::error::{Result, SocktabError};

/// Field positions after splitting a row on whitespace.
const LOCAL_FIELD: usize = 1;
const REMOTE_FIELD: usize = 2;
const STATE_FIELD: usize = 3;
const INODE_FIELD: usize = 9;

/// A row of `/proc/net/{tcp,udp}` with the fields we need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcNetRow {
    pub local: SocketAddrV4,
    pub remote: SocketAddrV4,
    /// Raw kernel state code (`st` column).
    pub state_code: u32,
    /// Socket inode, used to find the owning process.
    pub inode: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("expected at least {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },
    #[error("bad endpoint {0:?}")]
    BadEndpoint(String),
    #[error("bad state {0:?}")]
    BadState(String),
    #[error("bad inode {0:?}")]
    BadInode(String),
    #[error("row is not valid UTF-8")]
    NotUtf8,
}

/// Streams the rows of a table straight off the reader.
///
/// The first non-blank line is taken as the header unless it parses as a
/// row. Blank and malformed rows are skipped; only I/O errors are yielded.
pub struct ProcNetRows<R> {
    lines: std::io::Split<R>,
    lineno: usize,
    seen_first: bool,
}

impl<R: BufRead> ProcNetRows<R> {
    pub fn new(reader: R) -> Self {
        ProcNetRows {
            lines: reader.split(b'\n'),
            lineno: 0,
            seen_first: false,
        }
    }
}

impl<R: BufRead> Iterator for ProcNetRows<R> {
    type Item = std::io::Result<ProcNetRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let raw = match self.lines.next()? {
                Ok(raw) => raw,
                Err(e) => return Some(Err(e)),
            };
            self.lineno += 1;

            let parsed = std::str::from_utf8(&raw)
                .map_err(|_| RowError::NotUtf8)
                .and_then(|line| {
                    if line.trim().is_empty() {
                        Ok(None)
                    } else {
                        parse_row(line).map(Some)
                    }
                });
            let first = !self.seen_first;

            match parsed {
                Ok(None) => continue,
                Ok(Some(row)) => {
                    self.seen_first = true;
                    return Some(Ok(row));
                }
                Err(e) => {
                    self.seen_first = true;
                    if first {
                        tracing::trace!(line = self.lineno, "skipping table header");
                    } else {
                        tracing::debug!(line = self.lineno, error = %e, "skipping malformed socket row");
                    }
                }
            }
        }
    }
}

/// Parse a whole table into a vector, growing it fallibly.
pub fn parse_proc_net<R: BufRead>(reader: R) -> Result<Vec<ProcNetRow>> {
    let mut rows = Vec::new();
    for row in ProcNetRows::new(reader) {
        let row = row?;
        rows.try_reserve(1)
            .map_err(|_| SocktabError::AllocationFailure(rows.len() + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Parse a single data row.
pub fn parse_row(line: &str) -> std::result::Result<ProcNetRow, RowError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() <= INODE_FIELD {
        return Err(RowError::TooFewFields {
            expected: INODE_FIELD + 1,
            found: fields.len(),
        });
    }

    let local = parse_endpoint(fields[LOCAL_FIELD])?;
    let remote = parse_endpoint(fields[REMOTE_FIELD])?;
    // Out-of-range codes are kept and normalized later; only non-hex fails.
    let state_code = u32::from_str_radix(fields[STATE_FIELD], 16)
        .map_err(|_| RowError::BadState(fields[STATE_FIELD].to_string()))?;
    let inode = fields[INODE_FIELD]
        .parse::<u64>()
        .map_err(|_| RowError::BadInode(fields[INODE_FIELD].to_string()))?;

    Ok(ProcNetRow {
        local,
        remote,
        state_code,
        inode,
    })
}

/// Parse `AAAAAAAA:PPPP`.
///
/// The kernel prints the address as the native-endian integer value of a
/// network-order `__be32`, so the octets are the integer's native bytes.
/// The port is printed after `ntohs` and is already in host order.
pub fn parse_endpoint(s: &str) -> std::result::Result<SocketAddrV4, RowError> {
    let bad = || RowError::BadEndpoint(s.to_string());
    let (addr_hex, port_hex) = s.split_once(':').ok_or_else(bad)?;
    if addr_hex.len() != 8 || port_hex.is_empty() || port_hex.len() > 4 {
        return Err(bad());
    }
    let raw = u32::from_str_radix(addr_hex, 16).map_err(|_| bad())?;
    let port = u16::from_str_radix(port_hex, 16).map_err(|_| bad())?;
    Ok(SocketAddrV4::new(Ipv4Addr::from(raw.to_ne_bytes()), port))
}

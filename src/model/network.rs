use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::str::FromStr;

/// One row of the TCP table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    pub state: TcpState,
    pub local_address: Ipv4Addr,
    pub local_port: u16,
    pub remote_address: Ipv4Addr,
    pub remote_port: u16,
    /// `None` when no process could be found holding the socket.
    pub owner_pid: Option<u32>,
}

impl ConnectionRecord {
    pub fn local(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.local_address, self.local_port)
    }

    pub fn remote(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.remote_address, self.remote_port)
    }
}

/// One row of the UDP table. UDP endpoints have no peer, so the remote
/// fields are always the unspecified address and port 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRecord {
    pub local_address: Ipv4Addr,
    pub local_port: u16,
    pub remote_address: Ipv4Addr,
    pub remote_port: u16,
    pub owner_pid: Option<u32>,
}

impl EndpointRecord {
    pub fn new(local: SocketAddrV4, owner_pid: Option<u32>) -> Self {
        EndpointRecord {
            local_address: *local.ip(),
            local_port: local.port(),
            remote_address: Ipv4Addr::UNSPECIFIED,
            remote_port: 0,
            owner_pid,
        }
    }

    pub fn local(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.local_address, self.local_port)
    }
}

/// Accessors shared by both record kinds, used by filters and output.
pub trait SocketRecord {
    fn local(&self) -> SocketAddrV4;
    fn remote(&self) -> SocketAddrV4;
    fn owner_pid(&self) -> Option<u32>;
    fn state(&self) -> Option<TcpState>;
}

impl SocketRecord for ConnectionRecord {
    fn local(&self) -> SocketAddrV4 {
        ConnectionRecord::local(self)
    }

    fn remote(&self) -> SocketAddrV4 {
        ConnectionRecord::remote(self)
    }

    fn owner_pid(&self) -> Option<u32> {
        self.owner_pid
    }

    fn state(&self) -> Option<TcpState> {
        Some(self.state)
    }
}

impl SocketRecord for EndpointRecord {
    fn local(&self) -> SocketAddrV4 {
        EndpointRecord::local(self)
    }

    fn remote(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.remote_address, self.remote_port)
    }

    fn owner_pid(&self) -> Option<u32> {
        self.owner_pid
    }

    fn state(&self) -> Option<TcpState> {
        None
    }
}

/// Canonical TCP state, independent of how the platform encodes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TcpState {
    Closed,
    Listen,
    SynSent,
    SynRcvd,
    Established,
    FinWait1,
    FinWait2,
    CloseWait,
    Closing,
    LastAck,
    TimeWait,
    DeleteTcb,
    Unknown,
}

impl TcpState {
    /// Map the `st` column of `/proc/net/tcp` (see `include/net/tcp_states.h`).
    pub fn from_linux(code: u32) -> Self {
        match code {
            0x01 => TcpState::Established,
            0x02 => TcpState::SynSent,
            0x03 => TcpState::SynRcvd,
            0x04 => TcpState::FinWait1,
            0x05 => TcpState::FinWait2,
            0x06 => TcpState::TimeWait,
            0x07 => TcpState::Closed,
            0x08 => TcpState::CloseWait,
            0x09 => TcpState::LastAck,
            0x0A => TcpState::Listen,
            0x0B => TcpState::Closing,
            // TCP_NEW_SYN_RECV: a request socket still in the handshake.
            0x0C => TcpState::SynRcvd,
            _ => TcpState::Unknown,
        }
    }

    /// Map a `MIB_TCP_STATE` value from the IP helper tables.
    pub fn from_mib(code: u32) -> Self {
        match code {
            1 => TcpState::Closed,
            2 => TcpState::Listen,
            3 => TcpState::SynSent,
            4 => TcpState::SynRcvd,
            5 => TcpState::Established,
            6 => TcpState::FinWait1,
            7 => TcpState::FinWait2,
            8 => TcpState::CloseWait,
            9 => TcpState::Closing,
            10 => TcpState::LastAck,
            11 => TcpState::TimeWait,
            12 => TcpState::DeleteTcb,
            _ => TcpState::Unknown,
        }
    }

    /// MIB numbering of the state; `Unknown` is 0.
    pub fn code(self) -> u32 {
        match self {
            TcpState::Closed => 1,
            TcpState::Listen => 2,
            TcpState::SynSent => 3,
            TcpState::SynRcvd => 4,
            TcpState::Established => 5,
            TcpState::FinWait1 => 6,
            TcpState::FinWait2 => 7,
            TcpState::CloseWait => 8,
            TcpState::Closing => 9,
            TcpState::LastAck => 10,
            TcpState::TimeWait => 11,
            TcpState::DeleteTcb => 12,
            TcpState::Unknown => 0,
        }
    }
}

impl fmt::Display for TcpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TcpState::Closed => write!(f, "CLOSED"),
            TcpState::Listen => write!(f, "LISTEN"),
            TcpState::SynSent => write!(f, "SYN_SENT"),
            TcpState::SynRcvd => write!(f, "SYN_RCVD"),
            TcpState::Established => write!(f, "ESTABLISHED"),
            TcpState::FinWait1 => write!(f, "FIN_WAIT1"),
            TcpState::FinWait2 => write!(f, "FIN_WAIT2"),
            TcpState::CloseWait => write!(f, "CLOSE_WAIT"),
            TcpState::Closing => write!(f, "CLOSING"),
            TcpState::LastAck => write!(f, "LAST_ACK"),
            TcpState::TimeWait => write!(f, "TIME_WAIT"),
            TcpState::DeleteTcb => write!(f, "DELETE_TCB"),
            TcpState::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl FromStr for TcpState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let state = match s.trim().to_ascii_uppercase().as_str() {
            "CLOSED" => TcpState::Closed,
            "LISTEN" => TcpState::Listen,
            "SYN_SENT" => TcpState::SynSent,
            "SYN_RCVD" => TcpState::SynRcvd,
            "ESTABLISHED" => TcpState::Established,
            "FIN_WAIT1" => TcpState::FinWait1,
            "FIN_WAIT2" => TcpState::FinWait2,
            "CLOSE_WAIT" => TcpState::CloseWait,
            "CLOSING" => TcpState::Closing,
            "LAST_ACK" => TcpState::LastAck,
            "TIME_WAIT" => TcpState::TimeWait,
            "DELETE_TCB" => TcpState::DeleteTcb,
            "UNKNOWN" => TcpState::Unknown,
            other => return Err(format!("unknown TCP state: {}", other)),
        };
        Ok(state)
    }
}

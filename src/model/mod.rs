pub mod network;
pub mod table;

pub use network::{ConnectionRecord, EndpointRecord, SocketRecord, TcpState};
pub use table::ConnectionTable;

pub type TcpTable = ConnectionTable<ConnectionRecord>;
pub type UdpTable = ConnectionTable<EndpointRecord>;

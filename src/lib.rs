//! List IPv4 TCP and UDP sockets together with the process that owns each.
//!
//! On Linux the tables come from `/proc/net/{tcp,udp}` and owners are found
//! by indexing the socket inodes held in `/proc/<pid>/fd`. On Windows they
//! come from the IP helper owner-PID tables.
//!
//! Every fetch is an independent snapshot of live kernel state. Sockets can
//! open or close while a fetch is running; no attempt is made to prevent
//! that.

pub mod error;
pub mod filter;
pub mod model;
pub mod output;
pub mod platform;

pub use error::{Result, SocktabError};
pub use model::{
    ConnectionRecord, ConnectionTable, EndpointRecord, SocketRecord, TcpState, TcpTable, UdpTable,
};
pub use platform::owner::OwnerIndex;
pub use platform::procnet::{parse_proc_net, ProcNetRow, ProcNetRows};
pub use platform::{create_source, SocketTableSource, SourceConfig};

/// Fetch the TCP table from the platform's default source.
pub fn fetch_tcp_table() -> Result<TcpTable> {
    create_source(SourceConfig::default()).tcp_table()
}

/// Fetch the UDP table from the platform's default source.
pub fn fetch_udp_table() -> Result<UdpTable> {
    create_source(SourceConfig::default()).udp_table()
}

/// Release a table returned by a fetch.
pub fn release<R>(table: ConnectionTable<R>) {
    table.release();
}

use super::SocketTableSource;
use crate::error::{Result, SocktabError};
use crate::model::{TcpTable, UdpTable};

pub struct UnsupportedSource;

impl SocketTableSource for UnsupportedSource {
    fn tcp_table(&self) -> Result<TcpTable> {
        Err(SocktabError::unavailable("tcp", "no socket table source for this platform"))
    }

    fn udp_table(&self) -> Result<UdpTable> {
        Err(SocktabError::unavailable("udp", "no socket table source for this platform"))
    }
}

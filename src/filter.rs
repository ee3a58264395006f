use crate::error::{Result, SocktabError};
use crate::model::{SocketRecord, TcpState};

/// Record filters built from CLI arguments.
#[derive(Debug, Default)]
pub struct FilterConfig {
    pub pids: Option<PidFilter>,
    pub states: Option<Vec<TcpState>>,
    pub port: Option<u16>,
    pub and_mode: bool,
}

/// PID-based filter with include/exclude lists.
#[derive(Debug, Default)]
pub struct PidFilter {
    pub include: Vec<u32>,
    pub exclude: Vec<u32>,
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Parse a PID filter string.
///
/// Format: comma-separated PIDs, prefix `^` to exclude.
/// Examples: "1234,5678", "^1234", "1234,^5678"
pub fn parse_pid_filter(s: &str) -> Result<PidFilter> {
    let mut filter = PidFilter::default();
    for token in s.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if let Some(rest) = token.strip_prefix('^') {
            let pid: u32 = rest
                .parse()
                .map_err(|_| SocktabError::Parse(format!("invalid PID: {}", rest)))?;
            filter.exclude.push(pid);
        } else {
            let pid: u32 = token
                .parse()
                .map_err(|_| SocktabError::Parse(format!("invalid PID: {}", token)))?;
            filter.include.push(pid);
        }
    }
    Ok(filter)
}

/// Parse a comma-separated list of TCP state names, e.g. "LISTEN,time_wait".
pub fn parse_state_filter(s: &str) -> Result<Vec<TcpState>> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<TcpState>().map_err(SocktabError::Parse))
        .collect()
}

impl FilterConfig {
    pub fn new(
        pid: Option<&str>,
        state: Option<&str>,
        port: Option<u16>,
        and_mode: bool,
    ) -> Result<Self> {
        let pids = match pid {
            Some(s) => Some(parse_pid_filter(s)?),
            None => None,
        };
        let states = match state {
            Some(s) => Some(parse_state_filter(s)?),
            None => None,
        };
        Ok(FilterConfig {
            pids,
            states,
            port,
            and_mode,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_none() && self.states.is_none() && self.port.is_none()
    }

    /// In OR mode (default) any active filter matching is enough; in AND
    /// mode every active filter must match.
    pub fn matches<R: SocketRecord>(&self, record: &R) -> bool {
        if self.is_empty() {
            return true;
        }

        let mut results: Vec<bool> = Vec::new();
        if self.pids.is_some() {
            results.push(self.check_pid(record.owner_pid()));
        }
        if self.states.is_some() {
            results.push(self.check_state(record.state()));
        }
        if let Some(port) = self.port {
            results.push(record.local().port() == port || record.remote().port() == port);
        }

        if self.and_mode {
            results.iter().all(|&r| r)
        } else {
            results.iter().any(|&r| r)
        }
    }

    // -- private helpers --

    fn check_pid(&self, owner: Option<u32>) -> bool {
        match &self.pids {
            None => true,
            Some(f) => match owner {
                // Unowned sockets only pass a pure exclude filter.
                None => f.include.is_empty(),
                Some(pid) => {
                    if f.exclude.contains(&pid) {
                        return false;
                    }
                    f.include.is_empty() || f.include.contains(&pid)
                }
            },
        }
    }

    fn check_state(&self, state: Option<TcpState>) -> bool {
        match (&self.states, state) {
            (None, _) => true,
            (Some(states), Some(state)) => states.contains(&state),
            // UDP endpoints have no state to match.
            (Some(_), None) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConnectionRecord, EndpointRecord};
    use std::net::{Ipv4Addr, SocketAddrV4};

    fn make_conn(state: TcpState, local_port: u16, owner: Option<u32>) -> ConnectionRecord {
        ConnectionRecord {
            state,
            local_address: Ipv4Addr::LOCALHOST,
            local_port,
            remote_address: Ipv4Addr::UNSPECIFIED,
            remote_port: 0,
            owner_pid: owner,
        }
    }

    #[test]
    fn test_parse_pid_mixed() {
        let f = parse_pid_filter("1,^2,3").unwrap();
        assert_eq!(f.include, vec![1, 3]);
        assert_eq!(f.exclude, vec![2]);
    }

    #[test]
    fn test_parse_pid_invalid() {
        assert!(parse_pid_filter("abc").is_err());
        assert!(parse_pid_filter("^x").is_err());
    }

    #[test]
    fn test_parse_states() {
        let states = parse_state_filter("LISTEN, established").unwrap();
        assert_eq!(states, vec![TcpState::Listen, TcpState::Established]);
        assert!(parse_state_filter("LISTEN,NOPE").is_err());
    }

    #[test]
    fn test_no_filters_matches_everything() {
        let fc = FilterConfig::default();
        assert!(fc.matches(&make_conn(TcpState::Listen, 22, None)));
    }

    #[test]
    fn test_pid_include() {
        let fc = FilterConfig::new(Some("10"), None, None, false).unwrap();
        assert!(fc.matches(&make_conn(TcpState::Listen, 22, Some(10))));
        assert!(!fc.matches(&make_conn(TcpState::Listen, 22, Some(11))));
        assert!(!fc.matches(&make_conn(TcpState::Listen, 22, None)));
    }

    #[test]
    fn test_pid_exclude_keeps_unowned() {
        let fc = FilterConfig::new(Some("^10"), None, None, false).unwrap();
        assert!(!fc.matches(&make_conn(TcpState::Listen, 22, Some(10))));
        assert!(fc.matches(&make_conn(TcpState::Listen, 22, Some(11))));
        assert!(fc.matches(&make_conn(TcpState::Listen, 22, None)));
    }

    #[test]
    fn test_state_filter_rejects_udp() {
        let fc = FilterConfig::new(None, Some("LISTEN"), None, false).unwrap();
        let ep = EndpointRecord::new(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 53), Some(1));
        assert!(!fc.matches(&ep));
        assert!(fc.matches(&make_conn(TcpState::Listen, 22, None)));
    }

    #[test]
    fn test_port_matches_either_side() {
        let fc = FilterConfig::new(None, None, Some(443), false).unwrap();
        let mut rec = make_conn(TcpState::Established, 50000, None);
        assert!(!fc.matches(&rec));
        rec.remote_port = 443;
        assert!(fc.matches(&rec));
    }

    #[test]
    fn test_or_and_modes() {
        let rec = make_conn(TcpState::Listen, 22, Some(5));
        let or = FilterConfig::new(Some("6"), Some("LISTEN"), None, false).unwrap();
        assert!(or.matches(&rec));
        let and = FilterConfig::new(Some("6"), Some("LISTEN"), None, true).unwrap();
        assert!(!and.matches(&rec));
        let and_ok = FilterConfig::new(Some("5"), Some("LISTEN"), Some(22), true).unwrap();
        assert!(and_ok.matches(&rec));
    }
}

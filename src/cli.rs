use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "socktab", version, about = "List TCP/UDP sockets with their owning processes")]
pub struct CliArgs {
    /// Show the TCP table
    #[arg(short = 't', long = "tcp")]
    pub tcp: bool,

    /// Show the UDP table
    #[arg(short = 'u', long = "udp")]
    pub udp: bool,

    /// Select by owning PID (comma-separated, prefix ^ to exclude)
    #[arg(short = 'p', value_name = "PID")]
    pub pid: Option<String>,

    /// Select TCP sockets by state (comma-separated, e.g. LISTEN,ESTABLISHED)
    #[arg(short = 's', long = "state", value_name = "STATE")]
    pub state: Option<String>,

    /// Select sockets with this local or remote port
    #[arg(long = "port", value_name = "PORT")]
    pub port: Option<u16>,

    /// AND selections (default is OR)
    #[arg(short = 'a')]
    pub and_mode: bool,

    /// Show the owning process name
    #[arg(short = 'c', long = "command")]
    pub show_command: bool,

    /// Terse output: owning PIDs only
    #[arg(short = 'T', long = "terse")]
    pub terse: bool,

    /// Repeat mode interval in seconds
    #[arg(short = 'r', value_name = "SECONDS")]
    pub repeat: Option<u64>,

    /// Do not look up socket owners
    #[arg(long = "no-owners")]
    pub no_owners: bool,

    /// Root of the proc filesystem (Linux)
    #[arg(long = "proc-root", value_name = "DIR", default_value = "/proc")]
    pub proc_root: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl CliArgs {
    /// Neither -t nor -u means both tables.
    pub fn wants_tcp(&self) -> bool {
        self.tcp || !self.udp
    }

    pub fn wants_udp(&self) -> bool {
        self.udp || !self.tcp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::parse_from(std::iter::once("socktab").chain(args.iter().copied()))
    }

    #[test]
    fn test_default_shows_both_tables() {
        let args = parse(&[]);
        assert!(args.wants_tcp());
        assert!(args.wants_udp());
        assert_eq!(args.proc_root, PathBuf::from("/proc"));
    }

    #[test]
    fn test_single_protocol() {
        let args = parse(&["-t"]);
        assert!(args.wants_tcp());
        assert!(!args.wants_udp());
        let args = parse(&["-u"]);
        assert!(!args.wants_tcp());
        assert!(args.wants_udp());
    }

    #[test]
    fn test_filters_and_flags() {
        let args = parse(&["-p", "1,^2", "-s", "LISTEN", "--port", "22", "-a", "-vv", "-c"]);
        assert_eq!(args.pid.as_deref(), Some("1,^2"));
        assert_eq!(args.state.as_deref(), Some("LISTEN"));
        assert_eq!(args.port, Some(22));
        assert!(args.and_mode);
        assert!(args.show_command);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_rejects_bad_port() {
        let res = CliArgs::try_parse_from(["socktab", "--port", "70000"]);
        assert!(res.is_err());
    }
}

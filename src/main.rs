mod cli;

use std::io::{self, Write};

use clap::Parser;
use cli::CliArgs;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use socktab::filter::FilterConfig;
use socktab::output::{terse_pids, ProcessNames, TableFormatter};
use socktab::{create_source, SocketTableSource, SourceConfig, TcpTable, UdpTable};

fn main() {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    let filter_config = match FilterConfig::new(
        args.pid.as_deref(),
        args.state.as_deref(),
        args.port,
        args.and_mode,
    ) {
        Ok(fc) => fc,
        Err(e) => {
            eprintln!("Error parsing filters: {}", e);
            std::process::exit(1);
        }
    };

    let source = create_source(SourceConfig {
        proc_root: args.proc_root.clone(),
        resolve_owners: !args.no_owners,
    });

    loop {
        if let Err(e) = run_once(&*source, &args, &filter_config) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }

        match args.repeat {
            Some(secs) => {
                std::thread::sleep(std::time::Duration::from_secs(secs));
            }
            None => break,
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::registry()
        .with(fmt::layer().compact().without_time().with_writer(io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .init();
}

fn run_once(
    source: &dyn SocketTableSource,
    args: &CliArgs,
    filter_config: &FilterConfig,
) -> socktab::Result<()> {
    // Each iteration is a fresh snapshot.
    let tcp: Option<TcpTable> = if args.wants_tcp() {
        let table = source.tcp_table()?;
        Some(table.into_iter().filter(|r| filter_config.matches(r)).collect())
    } else {
        None
    };
    let udp: Option<UdpTable> = if args.wants_udp() {
        let table = source.udp_table()?;
        Some(table.into_iter().filter(|r| filter_config.matches(r)).collect())
    } else {
        None
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.terse {
        let tcp_records = tcp.iter().flat_map(|t| t.iter());
        let udp_records = udp.iter().flat_map(|t| t.iter());
        let mut pids = terse_pids(tcp_records);
        pids.extend(terse_pids(udp_records));
        pids.sort_unstable();
        pids.dedup();
        for pid in pids {
            writeln!(out, "{}", pid)?;
        }
        return Ok(());
    }

    let names = args.show_command.then(ProcessNames::load);
    let formatter = TableFormatter::new(names.as_ref());

    if let Some(ref table) = tcp {
        formatter.write_tcp(&mut out, table)?;
    }
    if let Some(ref table) = udp {
        if tcp.is_some() {
            writeln!(out)?;
        }
        formatter.write_udp(&mut out, table)?;
    }
    out.flush()?;

    if let Some(table) = tcp {
        socktab::release(table);
    }
    if let Some(table) = udp {
        socktab::release(table);
    }
    Ok(())
}

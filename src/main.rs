use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use anyhow::Context;
use clap::Parser;
use dns_wire::record::ttl_from_secs;
use dns_wire::server::MAX_DATAGRAM_LEN;
use dns_wire::{Name, Responder, ServerConfig, StaticResolver};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dns-responder")]
#[command(version)]
#[command(about = "Answers DNS queries over UDP with fixed addresses")]
struct Cli {
    /// Bind address
    #[arg(short = 'b', long, default_value = "0.0.0.0")]
    bind: IpAddr,

    /// UDP port
    #[arg(short = 'p', long, default_value_t = 1053)]
    port: u16,

    /// Address returned for A queries
    #[arg(long, default_value = "127.0.0.1")]
    answer_v4: Ipv4Addr,

    /// Address returned for AAAA queries; without it they get no data
    #[arg(long)]
    answer_v6: Option<Ipv6Addr>,

    /// TTL of answers in seconds
    #[arg(long, default_value_t = 3600, allow_negative_numbers = true)]
    ttl: i64,

    /// Largest response to send, in octets
    #[arg(long, default_value_t = MAX_DATAGRAM_LEN)]
    max_datagram: usize,

    /// Answer this name with NXDOMAIN (repeatable)
    #[arg(long, value_name = "NAME")]
    nxdomain: Vec<Name>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let mut resolver = StaticResolver::new(cli.answer_v4, ttl_from_secs(cli.ttl));
    if let Some(v6) = cli.answer_v6 {
        resolver = resolver.with_v6(v6);
    }
    for name in cli.nxdomain {
        resolver = resolver.with_nxdomain(name);
    }

    let config = ServerConfig {
        bind: SocketAddr::new(cli.bind, cli.port),
        max_datagram: cli.max_datagram,
    };
    let responder = Responder::bind(&config, resolver)
        .with_context(|| format!("failed to bind {}", config.bind))?;

    info!(
        "Starting dns-responder v{} on {}",
        env!("CARGO_PKG_VERSION"),
        responder.local_addr()?
    );
    responder.run()
}

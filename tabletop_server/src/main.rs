// CLI entry point for the tabletop game server.
//
// Usage:
//   tabletop-server [OPTIONS]
//     --bind <ADDR>   Listen address (default: 127.0.0.1)
//     --port <PORT>   Listen port (default: 5000, or $PORT)
//     --log-json      Emit logs as JSON lines
//
// Log filtering follows RUST_LOG (default: info).

use std::net::IpAddr;
use std::process::ExitCode;

use clap::Parser;
use tabletop_server::server::{ServerConfig, start_server};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "tabletop-server")]
#[command(about = "Real-time TicTacToe and Checkers rooms over TCP")]
struct Args {
    /// Listen address
    #[arg(long, default_value = "127.0.0.1")]
    bind: IpAddr,

    /// Listen port
    #[arg(long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log_json);

    let config = ServerConfig {
        bind: args.bind,
        port: args.port,
        ..ServerConfig::default()
    };
    let (handle, addr) = match start_server(config) {
        Ok(started) => started,
        Err(e) => {
            error!(error = %e, "failed to start server");
            return ExitCode::FAILURE;
        }
    };

    info!(%addr, "listening");
    // Runs until the process is killed.
    handle.wait();
    ExitCode::SUCCESS
}

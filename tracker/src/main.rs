//! Tracker process entry point

use clap::Parser;
use shared::{logging, process_info, ProcessId};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tracker::{
    state::{DEFAULT_ACTIVE_WINDOW, DEFAULT_TRACKER_PORT},
    RealActivityTracker, TrackerConfig, TrackerError, TrackerResult, TrackerServer,
};

#[derive(Parser, Debug)]
#[command(name = "tracker")]
#[command(about = "Peer activity tracker for the vehicle controller")]
struct Args {
    /// Port for the HTTP API
    #[arg(long, env = "TRACKER_PORT", default_value_t = DEFAULT_TRACKER_PORT)]
    port: u16,

    /// Interface to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Seconds since last activity for a peer to count as active
    #[arg(long, default_value_t = DEFAULT_ACTIVE_WINDOW.as_secs())]
    window_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> TrackerResult<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    ProcessId::init_tracker();
    logging::init_tracing_with_level(Some(&args.log_level));

    let host: IpAddr = args
        .host
        .parse()
        .map_err(|e| TrackerError::config(format!("Invalid host {}: {}", args.host, e)))?;
    let config = TrackerConfig {
        bind_address: SocketAddr::new(host, args.port),
        active_window: Duration::from_secs(args.window_secs),
    };

    logging::log_startup(ProcessId::current(), &format!("tracker on {}", config.bind_address));
    process_info!(ProcessId::current(), "⏱️ Active window {}s", args.window_secs);

    let server = TrackerServer::new(config, RealActivityTracker::new());
    if let Err(e) = server.run().await {
        logging::log_error(ProcessId::current(), "Tracker", &e);
        return Err(e);
    }

    logging::log_shutdown(ProcessId::current(), "Received Ctrl+C signal");
    Ok(())
}

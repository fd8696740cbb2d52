//! Controller process entry point
//!
//! Runs the controller loop and a line-oriented operator console on stdin.

use clap::Parser;
use shared::{logging, process_info, process_warn, ProcessId};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;

use controller::{
    console::{self, ConsoleCommand},
    services::endpoint_store::DEFAULT_STATE_FILE,
    ActivityHeartbeat, Controller, ControllerConfig, ControllerResult, EndpointStore, RealActivityReporter,
    RealEndpointStore, RealWebSocketConnector, DEFAULT_JOYSTICK_SIZE, DEFAULT_VEHICLE_PORT,
};

#[derive(Parser, Debug)]
#[command(name = "controller")]
#[command(about = "Operator console for the remote vehicle")]
struct Args {
    /// Vehicle host to connect to at startup (defaults to the saved one)
    #[arg(long, env = "VEHICLE_ENDPOINT")]
    endpoint: Option<String>,

    /// Port the vehicle firmware listens on
    #[arg(long, default_value_t = DEFAULT_VEHICLE_PORT)]
    port: u16,

    /// File remembering the last endpoint
    #[arg(long, default_value = DEFAULT_STATE_FILE)]
    state_file: String,

    /// Activity tracker base URL, e.g. http://127.0.0.1:3001
    #[arg(long, env = "TRACKER_URL")]
    tracker_url: Option<String>,

    /// Joystick pad size in pixels
    #[arg(long, default_value_t = DEFAULT_JOYSTICK_SIZE)]
    joystick_size: f64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ControllerResult<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    ProcessId::init_controller();
    logging::init_tracing_with_level(Some(&args.log_level));
    logging::log_startup(ProcessId::current(), &format!("controller (vehicle port {})", args.port));

    let config = ControllerConfig {
        vehicle_port: args.port,
        joystick_size: args.joystick_size,
        ..ControllerConfig::default()
    };

    let store = RealEndpointStore::with_path(&args.state_file);
    let startup_endpoint = match args.endpoint.clone() {
        Some(endpoint) => Some(endpoint),
        None => match store.load().await {
            Ok(saved) => saved.map(|endpoint| endpoint.to_string()),
            Err(e) => {
                process_warn!(ProcessId::current(), "⚠️ Ignoring saved endpoint: {}", e);
                None
            }
        },
    };

    let (controller, handle) = Controller::new(config.clone(), RealWebSocketConnector::new(), store);
    let controller_task = controller.spawn();

    // Notices go straight to the operator
    let mut notices = handle.subscribe_notices();
    let printer = tokio::spawn(async move {
        loop {
            match notices.recv().await {
                Ok(notice) => println!("{notice}"),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    println!("[warn] {skipped} notices skipped");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let heartbeat = args.tracker_url.as_ref().map(|url| {
        process_info!(ProcessId::current(), "📡 Reporting activity to {}", url);
        ActivityHeartbeat::start(Arc::new(RealActivityReporter::new(url.clone())), config.heartbeat_interval)
    });

    if let Some(endpoint) = startup_endpoint {
        if let Err(e) = handle.connect(&endpoint).await {
            process_warn!(ProcessId::current(), "⚠️ Startup connect to {} failed: {}", endpoint, e);
        }
    }

    println!("{}", console::HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let reason = loop {
        tokio::select! {
            _ = signal::ctrl_c() => break "interrupted",
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break "stdin closed",
                    Err(e) => {
                        logging::log_error(ProcessId::current(), "Reading stdin", &e);
                        break "stdin error";
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                match line.parse::<ConsoleCommand>() {
                    Ok(ConsoleCommand::Quit) => break "operator quit",
                    Ok(command) => match console::execute(&handle, command).await {
                        Ok(Some(output)) => println!("{output}"),
                        Ok(None) => {}
                        Err(e) => println!("error: {e}"),
                    },
                    Err(e) => println!("error: {e}"),
                }
            }
        }
    };

    logging::log_shutdown(ProcessId::current(), reason);
    drop(heartbeat);
    handle.shutdown().await?;
    let _ = tokio::time::timeout(Duration::from_secs(2), controller_task).await;
    printer.abort();

    Ok(())
}

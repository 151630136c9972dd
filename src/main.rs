//! authgate binary entry point.
//!
//! Startup order: parse args → load and validate config (fatal on error) →
//! init logging and metrics → bind listener → spawn config watcher and
//! signal handler → run the server until shutdown.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use authgate::config::loader::load_config;
use authgate::config::watcher::ConfigWatcher;
use authgate::http::HttpServer;
use authgate::lifecycle::{signals, Shutdown};
use authgate::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "authgate")]
#[command(about = "Session-gated reverse proxy", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "authgate.toml")]
    config: PathBuf,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("authgate: invalid configuration {}: {}", cli.config.display(), e);
            std::process::exit(2);
        }
    };

    if cli.check {
        println!("{}: configuration OK", cli.config.display());
        return Ok(());
    }

    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        require_session = config.session.require_session,
        "authgate v0.1.0 starting"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    let (watcher, config_updates) = ConfigWatcher::new(&cli.config);
    let _watcher = match watcher.run() {
        Ok(w) => Some(w),
        Err(e) => {
            tracing::warn!(error = %e, "Config watcher failed to start, hot reload disabled");
            None
        }
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::shutdown_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

//! Progressive image edge service.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                 PROGRESSIVE EDGE                     │
//!   GET /images/{id}  │  ┌────────┐   ┌──────────┐   ┌──────────────────┐    │
//!   ──────────────────┼─▶│  http  │──▶│ delivery │──▶│ origin fetcher   │◀───┼── Upstream
//!                     │  │ server │   │          │   └──────────────────┘    │   origin
//!                     │  └────────┘   │          │   ┌──────────────────┐    │
//!                     │      ▲        │          │──▶│ variant deriver  │    │
//!                     │      │        └────┬─────┘   └──────────────────┘    │
//!   multipart frames  │  ┌───┴─────────┐    │                                │
//!   ◀─────────────────┼──│  streaming  │◀───┘                                │
//!                     │  │  emitter    │                                     │
//!                     │  └─────────────┘                                     │
//!                     │  config · observability · lifecycle                  │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use progressive_edge::config::{ConfigOverrides, ConfigSource, ConfigWatcher};
use progressive_edge::http::HttpServer;
use progressive_edge::lifecycle::{shutdown_signal, Shutdown};
use progressive_edge::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "progressive-edge")]
#[command(about = "Streams a small image variant, then the original, in one multipart response", long_about = None)]
struct Cli {
    /// TOML configuration file; watched for changes.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override origin.base_url (takes precedence over IMAGE_URL).
    #[arg(short, long)]
    origin: Option<String>,
}

impl Cli {
    fn config_source(&self) -> ConfigSource {
        ConfigSource::new(
            self.config.clone(),
            ConfigOverrides {
                bind_address: self.bind.clone(),
                origin_base_url: self.origin.clone(),
            },
        )
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let source = Cli::parse().config_source();
    let config = source.resolve()?;

    logging::init_logging(&config.observability);

    tracing::info!("progressive-edge v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        origin = %config.origin.base_url,
        variant_width = config.variant.width,
        variant_format = %config.variant.format,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Hot reload only applies when running from a file; the watcher must outlive the server.
    let (_watcher, config_updates) = match ConfigWatcher::new(source) {
        Some((watcher, updates)) => (Some(watcher.run()?), updates),
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on(shutdown_signal());

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

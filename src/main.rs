//! http-rewrite server.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ RewriteService ──▶ Router ──▶ ServeDir / echo
//!                         │
//!                         ├─ rule matched, rewrite  → URI replaced, routed
//!                         ├─ rule matched, redirect → 30x + Location
//!                         └─ no match               → routed unchanged
//!
//!     Admin API (optional) ──▶ RuleStore ◀── config watcher (--watch)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use http_rewrite::admin::{setup_admin_router, AdminState};
use http_rewrite::config::{load_config, ConfigWatcher, RewriteConfig};
use http_rewrite::http::HttpServer;
use http_rewrite::lifecycle::{shutdown_signal, Shutdown};
use http_rewrite::observability::{init_tracing, logger_from_options, metrics};
use http_rewrite::rules::RuleStore;

#[derive(Parser)]
#[command(name = "http-rewrite")]
#[command(about = "HTTP server applying URL rewrite and redirect rules", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Suppress rule logging
    #[arg(long)]
    silent: bool,

    /// Log every rule match
    #[arg(short, long)]
    verbose: bool,

    /// Reload rules when the configuration file changes
    #[arg(short, long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => RewriteConfig::default(),
    };
    config.logging.silent |= args.silent;
    config.logging.verbose |= args.verbose;

    init_tracing(&config.logging.level);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "http-rewrite starting");

    // The exporter must be installed before the store publishes its
    // initial rule count.
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let logger = logger_from_options(config.logging.silent, config.logging.verbose);
    let store = Arc::new(RuleStore::new(config.rules.clone(), logger));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        rules = store.len(),
        "Configuration loaded"
    );

    // Keep the watcher alive for the lifetime of the server.
    let _watcher = match (&args.config, args.watch) {
        (Some(path), true) => {
            let (watcher, mut updates) = ConfigWatcher::new(path);
            let handle = watcher.run()?;
            let store = store.clone();
            tokio::spawn(async move {
                while let Some(new_config) = updates.recv().await {
                    let accepted = store.replace(new_config.rules);
                    tracing::info!(rules = accepted, "Rewrite rules reloaded");
                }
            });
            Some(handle)
        }
        (None, true) => {
            tracing::warn!("--watch has no effect without --config");
            None
        }
        _ => None,
    };

    let shutdown = Shutdown::new();

    if config.admin.enabled {
        let admin_listener = TcpListener::bind(&config.admin.bind_address).await?;
        let app = setup_admin_router(AdminState::new(store.clone(), &config.admin.api_key));
        let mut shutdown_rx = shutdown.subscribe();

        tracing::info!(address = %admin_listener.local_addr()?, "Admin API listening");
        tokio::spawn(async move {
            let result = axum::serve(admin_listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "Admin API failed");
            }
        });
    }

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            tracing::info!(servers = shutdown.receiver_count(), "Stopping servers");
            shutdown.trigger();
        });
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, store);
    server.run(listener, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

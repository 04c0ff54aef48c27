//! gridsourced: the gridsource daemon.
//!
//! Serves the generic metrics datasource protocol over HTTP:
//! - Loads `gridsource.toml` (all sections optional)
//! - Builds the source registry, with the demo sources when enabled
//! - Mounts the datasource router and serves until Ctrl-C
//!
//! # Usage
//!
//! ```text
//! gridsourced serve --config gridsource.toml --port 3003 --demo
//! gridsourced config > gridsource.toml
//! ```

mod demo;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use gridsource_core::ServiceConfig;
use gridsource_core::config::LogConfig;
use gridsource_registry::Registry;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,gridsourced=debug,gridsource=debug";

#[derive(Parser)]
#[command(name = "gridsourced", about = "Generic metrics datasource daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the datasource protocol.
    Serve {
        /// Path to gridsource.toml. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Address to bind, overriding the config.
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on, overriding the config.
        #[arg(long)]
        port: Option<u16>,

        /// Register the built-in synthetic sources.
        #[arg(long)]
        demo: bool,
    },

    /// Print the effective configuration as TOML.
    Config {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            demo,
        } => {
            let mut config = load_config(config.as_deref())?;
            init_tracing(&config.log);
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.demo.enabled |= demo;
            serve(config).await
        }
        Command::Config { config } => {
            print!("{}", load_config(config.as_deref())?.to_toml_string()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ServiceConfig> {
    match path {
        Some(path) => ServiceConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(ServiceConfig::default()),
    }
}

/// `RUST_LOG` wins, then the config's filter, then the built-in default.
fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = log.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER);
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn serve(config: ServiceConfig) -> anyhow::Result<()> {
    info!("gridsource daemon starting");

    // ── Registry ───────────────────────────────────────────────

    let registry = Registry::new();
    if config.demo.enabled {
        demo::register(&registry, &config.demo);
    }
    info!(sources = ?registry.source_names(), "registry ready");

    // ── API server ─────────────────────────────────────────────

    let router = gridsource_api::build_router(registry, config.server.cors);
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}", config.server.host))?;

    info!(%addr, cors = config.server.cors, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to install Ctrl-C handler");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("gridsource daemon stopped");
    Ok(())
}

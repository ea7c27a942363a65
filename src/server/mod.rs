//! HTTP server for tablescope
//!
//! [`Server`] opens every configured database, runs the startup checks and
//! then serves the browse API until Ctrl-C.

pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::browser::Browser;
use crate::config::ServerConfig;
use crate::error::{BrowseError, Result};
use crate::sqlite::FunctionRegistry;

pub use routes::{create_router, ApiError, AppState};

/// A configured, ready-to-run server.
pub struct Server {
    config: ServerConfig,
    browser: Arc<Browser>,
}

impl Server {
    /// Open the databases named in `config`, installing `functions` on each.
    pub fn new(config: ServerConfig, functions: &FunctionRegistry) -> Result<Self> {
        let browser = Browser::open(config.browser, &config.files, functions)?;
        Ok(Self {
            config,
            browser: Arc::new(browser),
        })
    }

    /// Serve until a shutdown signal arrives.
    pub async fn run(self) -> Result<()> {
        start_http_server(self.config.http_addr, self.browser).await
    }
}

/// Start HTTP server
pub async fn start_http_server(addr: SocketAddr, browser: Arc<Browser>) -> Result<()> {
    let app = create_router(AppState { browser });

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::AddrInUse {
            BrowseError::Server(format!(
                "HTTP port {} is already in use. \
                 Fix: Use --http-addr to pick a different address, \
                 or stop the existing process.",
                addr.port()
            ))
        } else {
            BrowseError::Server(format!("Failed to bind HTTP server to {}: {}", addr, e))
        }
    })?;

    info!(addr = %addr, "Serving databases");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Unable to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

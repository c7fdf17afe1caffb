//! Binding and serving a booted application.
//!
//! # Responsibilities
//! - Pick the port (argument, then `app.port`, then the default)
//! - Bind the listener and start `axum::serve` in the background
//! - Hand back a handle that can stop the server gracefully

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::schema::DEFAULT_PORT;
use crate::error::{BootError, BootResult};
use crate::http::app::App;
use crate::lifecycle::Shutdown;

/// A server that is accepting connections.
pub struct RunningServer {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    handle: JoinHandle<std::io::Result<()>>,
}

impl RunningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Shutdown coordinator driving graceful stop.
    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Wait for the server task to finish.
    pub async fn wait(self) -> std::io::Result<()> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(std::io::Error::other(e)),
        }
    }

    /// Trigger graceful shutdown and wait for in-flight requests to drain.
    pub async fn stop(self) -> std::io::Result<()> {
        self.shutdown.trigger();
        self.wait().await
    }
}

impl App {
    /// Resolve the port `serve` would bind. A configured `app.port` of `0`
    /// counts as unset.
    pub fn port(&self, port: Option<u16>) -> u16 {
        port.or(self.context().settings().port.filter(|&p| p != 0))
            .unwrap_or(DEFAULT_PORT)
    }

    /// Bind and start serving. Resolves once the listener is bound.
    pub async fn serve(self, port: Option<u16>) -> BootResult<RunningServer> {
        let port = self.port(port);
        let listener = TcpListener::bind(("0.0.0.0", port))
            .await
            .map_err(|source| BootError::Bind { port, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| BootError::Bind { port, source })?;

        tracing::info!(address = %local_addr, "Listening on port {}", local_addr.port());

        let shutdown = Shutdown::new();
        let stop = shutdown.clone();
        let router = self.router();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    stop.signalled().await;
                    tracing::info!("Shutdown signal received");
                })
                .await?;
            tracing::info!("HTTP server stopped");
            Ok::<(), std::io::Error>(())
        });

        Ok(RunningServer {
            local_addr,
            shutdown,
            handle,
        })
    }
}

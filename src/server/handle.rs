//! Programmatic embedding API: start the runtime from a host process without
//! going through the CLI, and stop it the same way the CLI's signal handler
//! does.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::server::orchestrator::Server;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// A running server, started in the background. `stop()` requests graceful
/// shutdown; `wait_closed()` resolves once it has actually finished.
pub struct ServerHandle {
    shutdown_tx: watch::Sender<bool>,
    join_handle: Mutex<Option<JoinHandle<Result<()>>>>,
    stop_requested: AtomicBool,
}

impl ServerHandle {
    /// Builds the server from `config` and starts it on a background task.
    pub fn start(config: Config) -> Result<Self> {
        let server = Server::new(config)?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join_handle = tokio::spawn(server.run(shutdown_rx));

        Ok(Self {
            shutdown_tx,
            join_handle: Mutex::new(Some(join_handle)),
            stop_requested: AtomicBool::new(false),
        })
    }

    /// Requests graceful shutdown. Idempotent: a second call is a no-op.
    pub fn stop(&self) {
        if !self.stop_requested.swap(true, Ordering::SeqCst) {
            let _ = self.shutdown_tx.send(true);
        }
    }

    /// Resolves once the server has finished shutting down. Safe to call
    /// more than once; later calls resolve immediately.
    pub async fn wait_closed(&self) -> Result<()> {
        let handle = self.join_handle.lock().await.take();
        match handle {
            Some(handle) => handle
                .await
                .map_err(|e| Error::Other(format!("server task panicked: {}", e)))?,
            None => Ok(()),
        }
    }
}

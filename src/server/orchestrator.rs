//! Owns the connection manager and the executor (which holds the registry
//! pointer). Runs the accept loop, spawns one task per inbound message, and
//! drives graceful shutdown.

use crate::config::Config;
use crate::core_tools;
use crate::error::Result;
use crate::server::connection_manager::ConnectionManager;
use crate::server::executor::ToolExecutor;
use crate::server::loader::{ToolLoader, ToolWatcher};
use crate::server::registry::ToolRegistry;
use crate::server::session;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinSet;

/// The server runtime: accepts WebSocket connections and dispatches
/// `tool_call` requests against the currently published tool registry.
pub struct Server {
    config: Config,
    connection_manager: Arc<ConnectionManager>,
    executor: Arc<ToolExecutor>,
    loader: Arc<ToolLoader>,
    running_tasks: Arc<Mutex<JoinSet<()>>>,
    connection_tasks: Mutex<JoinSet<()>>,
}

impl Server {
    /// Builds the initial registry (bundled core tools plus whatever dynamic
    /// tools are present in the configured repos right now) and prepares the
    /// orchestrator. Does not bind a socket yet.
    pub fn new(config: Config) -> Result<Self> {
        let loader = Arc::new(ToolLoader::new(
            config.tool_repos.clone(),
            core_tools::seed_native_tools,
        ));
        let initial_registry = Arc::new(loader.load_registry()?);
        tracing::info!(tool_count = initial_registry.len(), "initial tool registry built");
        let executor = Arc::new(ToolExecutor::new(initial_registry));

        Ok(Self {
            config,
            connection_manager: Arc::new(ConnectionManager::new()),
            executor,
            loader,
            running_tasks: Arc::new(Mutex::new(JoinSet::new())),
            connection_tasks: Mutex::new(JoinSet::new()),
        })
    }

    pub fn connection_count(&self) -> usize {
        self.connection_manager.connection_count()
    }

    /// Binds the configured address, starts the hot-reload watcher, and
    /// accepts connections until `shutdown` is signaled.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!(%addr, "listening for WebSocket connections");

        let executor_for_watch = self.executor.clone();
        let watcher = ToolWatcher::start(self.loader.clone(), move |new_registry: Arc<ToolRegistry>| {
            tracing::info!(tool_count = new_registry.len(), "tool registry hot-reloaded");
            executor_for_watch.update_registry(new_registry);
        })?;

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }

                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer_addr)) => {
                            let connection_manager = self.connection_manager.clone();
                            let executor = self.executor.clone();
                            let running_tasks = self.running_tasks.clone();
                            self.connection_tasks.lock().await.spawn(async move {
                                if let Err(e) = session::handle_connection(
                                    stream,
                                    peer_addr,
                                    connection_manager,
                                    executor,
                                    running_tasks,
                                )
                                .await
                                {
                                    tracing::warn!(error = %e, "connection ended with an error");
                                }
                            });
                        }
                        Err(e) => tracing::warn!(error = %e, "failed to accept a connection"),
                    }
                }
            }
        }

        tracing::info!("shutting down: draining in-flight per-message tasks");
        {
            let mut tasks = self.running_tasks.lock().await;
            let drained = tokio::time::timeout(Duration::from_secs(5), async {
                while tasks.join_next().await.is_some() {}
            })
            .await;
            if drained.is_err() {
                tracing::warn!("shutdown timeout reached with tasks still in flight; aborting them");
                tasks.shutdown().await;
            }
        }

        tracing::info!("shutting down: closing open connections");
        self.connection_tasks.lock().await.shutdown().await;

        watcher.stop().await;
        tracing::info!("server stopped");
        Ok(())
    }
}

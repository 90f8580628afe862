//! Per-connection task: reads frames serially, spawns one task per inbound
//! message so a slow tool never blocks the connection's next message, and
//! writes outbound frames as they become ready.

use crate::error::Result;
use crate::network::{NetworkAdapter, WebSocketAdapter};
use crate::server::connection_manager::ConnectionManager;
use crate::server::executor::ToolExecutor;
use crate::server::router::{route, RouterDecision};
use crate::server::validator::validate;
use crate::wire::ServerMessage;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

/// Drives one accepted WebSocket connection until it closes.
pub async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    connection_manager: Arc<ConnectionManager>,
    executor: Arc<ToolExecutor>,
    running_tasks: Arc<Mutex<JoinSet<()>>>,
) -> Result<()> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let mut adapter = WebSocketAdapter::new(ws_stream);

    let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(64);
    let id = connection_manager.connect(peer_addr, outbound_tx);

    loop {
        tokio::select! {
            biased;

            outgoing = outbound_rx.recv() => {
                match outgoing {
                    Some(payload) => {
                        if adapter.send(&payload).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            incoming = adapter.recv() => {
                match incoming {
                    Ok(Some(raw)) => {
                        let connection_manager = connection_manager.clone();
                        let executor = executor.clone();
                        let mut tasks = running_tasks.lock().await;
                        tasks.spawn(async move {
                            let response = dispatch_message(&raw, &executor).await;
                            let _ = connection_manager.send(id, &response).await;
                        });
                        while tasks.try_join_next().is_some() {}
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, %id, "error reading from connection, closing");
                        break;
                    }
                }
            }
        }
    }

    connection_manager.disconnect(id);
    Ok(())
}

async fn dispatch_message(raw: &str, executor: &ToolExecutor) -> ServerMessage {
    let request = match validate(raw) {
        Ok(request) => request,
        Err(error_message) => return error_message,
    };
    match route(request) {
        RouterDecision::Immediate(message) => message,
        RouterDecision::Proceed { header, body } => executor.execute(header, body).await,
    }
}

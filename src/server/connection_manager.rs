//! Tracks live client connections by an opaque id and routes outbound sends
//! to the session task that owns the actual socket.

use crate::error::Result;
use crate::wire::ServerMessage;
use dashmap::DashMap;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use uuid::Uuid;

/// A mapping from connection id to the outbound-frame channel for that
/// connection's session task. Mutated only from the event loop that owns
/// accept/read, per the single-writer policy.
#[derive(Default)]
pub struct ConnectionManager {
    connections: DashMap<Uuid, mpsc::Sender<String>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Mints a fresh connection id, stores the socket's outbound sender, and
    /// logs the peer address.
    pub fn connect(&self, peer_addr: SocketAddr, sender: mpsc::Sender<String>) -> Uuid {
        let id = Uuid::new_v4();
        tracing::info!(%id, %peer_addr, "connection established");
        self.connections.insert(id, sender);
        id
    }

    /// Removes the entry if present. Idempotent.
    pub fn disconnect(&self, id: Uuid) {
        if self.connections.remove(&id).is_some() {
            tracing::info!(%id, "connection closed");
        }
    }

    /// Serializes `message` and writes one frame to the connection's outbound
    /// channel. A closed channel (the socket is already gone) removes the
    /// entry and drops the message rather than propagating an error: the
    /// other end is already gone, so there is nothing left to do.
    pub async fn send(&self, id: Uuid, message: &ServerMessage) -> Result<()> {
        let sender = match self.connections.get(&id) {
            Some(entry) => entry.value().clone(),
            None => return Ok(()),
        };
        let payload = serde_json::to_string(message)?;
        if sender.send(payload).await.is_err() {
            self.connections.remove(&id);
        }
        Ok(())
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

//! The pluggable network transport trait and its WebSocket implementation.
//!
//! Framing is restricted to WebSocket text frames carrying one JSON document
//! per frame, so this is the sole transport; the trait is kept as a seam
//! rather than collapsed into the session code, since it is a natural place
//! to stub a transport in tests.

pub mod websocket;

pub use websocket::WebSocketAdapter;

use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait NetworkAdapter: Send {
    async fn send(&mut self, msg: &str) -> Result<()>;

    /// Returns `Ok(None)` when the peer closed the connection gracefully.
    async fn recv(&mut self) -> Result<Option<String>>;
}

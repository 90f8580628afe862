//! `NetworkAdapter` over a `tokio-tungstenite` WebSocket stream.

use crate::error::Result;
use crate::network::NetworkAdapter;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

pub struct WebSocketAdapter<S> {
    stream: WebSocketStream<S>,
}

impl<S> WebSocketAdapter<S> {
    pub fn new(stream: WebSocketStream<S>) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl<S> NetworkAdapter for WebSocketAdapter<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, msg: &str) -> Result<()> {
        self.stream.send(Message::Text(msg.to_string())).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<String>> {
        loop {
            return match self.stream.next().await {
                Some(Ok(Message::Text(text))) => Ok(Some(text)),
                Some(Ok(Message::Close(_))) | None => Ok(None),
                Some(Ok(_other_frame_kind)) => continue,
                Some(Err(e)) => Err(e.into()),
            };
        }
    }
}

//! The public client entry point: connect to a server, issue tool calls, and
//! close the connection.

use super::session::{ClientSession, PendingRequestMap, ResponseSender};
use crate::error::{Error, Result};
use crate::network::WebSocketAdapter;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::MaybeTlsStream;
use uuid::Uuid;

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

type OutgoingCall = (Uuid, String, Map<String, Value>, ResponseSender);

/// A connected client session. Tool calls may be issued concurrently from
/// multiple tasks sharing the same `Client`; each gets its own response
/// future multiplexed over the single underlying connection.
pub struct Client {
    outgoing_tx: mpsc::Sender<OutgoingCall>,
    pending_requests: PendingRequestMap,
    session_task: Mutex<Option<JoinHandle<()>>>,
    call_timeout: Duration,
}

impl Client {
    /// Connects to `url` (e.g. `ws://localhost:8765`) and starts the
    /// background session task that owns the socket.
    pub async fn connect(url: &str) -> Result<Self> {
        let (ws_stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(Error::from)?;
        Ok(Self::from_stream(ws_stream))
    }

    fn from_stream(ws_stream: tokio_tungstenite::WebSocketStream<MaybeTlsStream<TcpStream>>) -> Self {
        let adapter = WebSocketAdapter::new(ws_stream);
        let pending_requests: PendingRequestMap = Arc::new(Mutex::new(HashMap::new()));
        let (outgoing_tx, outgoing_rx) = mpsc::channel(64);

        let session = ClientSession::new(adapter, pending_requests.clone(), outgoing_rx);
        let session_task = tokio::spawn(session.run());

        Self {
            outgoing_tx,
            pending_requests,
            session_task: Mutex::new(Some(session_task)),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Overrides the default 30-second per-call timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Invokes `tool` with `args` and awaits its result, minting a fresh
    /// correlation id for this call. Times out after the configured call
    /// timeout, at which point the pending entry is unregistered before the
    /// timeout error is returned, so a response that arrives late is simply
    /// dropped rather than delivered to a caller who has moved on.
    pub async fn call(&self, tool: &str, args: Map<String, Value>) -> Result<Value> {
        let correlation_id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();

        self.outgoing_tx
            .send((correlation_id, tool.to_string(), args, tx))
            .await
            .map_err(|_| Error::ConnectionClosed)?;

        match tokio::time::timeout(self.call_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                self.pending_requests.lock().await.remove(&correlation_id);
                Err(Error::Timeout)
            }
        }
    }

    /// Aborts the background session task (dropping its `NetworkAdapter` and
    /// so closing the socket) and fails every outstanding call with
    /// `Error::ConnectionClosed`. Idempotent: a second call finds no session
    /// task and an already-empty pending map, and returns immediately.
    ///
    /// An abort, not a graceful shutdown: the task is parked in `select!`
    /// waiting on the socket or the next outgoing call, neither of which a
    /// well-behaved server is guaranteed to produce on its own, so there is
    /// no "let it finish naturally" path here.
    pub async fn close(&self) -> Result<()> {
        let task = self.session_task.lock().await.take();
        if let Some(task) = task {
            task.abort();
            let _ = task.await;
        }

        let mut pending = self.pending_requests.lock().await;
        for (_, sender) in pending.drain() {
            let _ = sender.send(Err(Error::ConnectionClosed));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn call_on_a_closed_outgoing_channel_reports_connection_closed() {
        let (outgoing_tx, outgoing_rx) = mpsc::channel::<OutgoingCall>(1);
        drop(outgoing_rx);
        let client = Client {
            outgoing_tx,
            pending_requests: Arc::new(Mutex::new(HashMap::new())),
            session_task: Mutex::new(None),
            call_timeout: Duration::from_millis(100),
        };

        let result = client.call("ping", Map::new()).await;
        assert!(matches!(result, Err(Error::ConnectionClosed)));
    }

    #[tokio::test]
    async fn call_times_out_and_unregisters_the_pending_entry() {
        let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<OutgoingCall>(1);
        let pending_requests: PendingRequestMap = Arc::new(Mutex::new(HashMap::new()));
        let client = Client {
            outgoing_tx,
            pending_requests: pending_requests.clone(),
            session_task: Mutex::new(None),
            call_timeout: Duration::from_millis(50),
        };

        // Drain the channel but never respond, simulating a server that never replies.
        let drain = tokio::spawn(async move {
            let _ = outgoing_rx.recv().await;
        });

        let result = client.call("slow_tool", Map::new()).await;
        assert!(matches!(result, Err(Error::Timeout)));
        assert!(pending_requests.lock().await.is_empty());
        drain.await.unwrap();
    }

    #[tokio::test]
    async fn close_aborts_the_session_task_and_fails_pending_calls_without_hanging() {
        let (outgoing_tx, outgoing_rx) = mpsc::channel::<OutgoingCall>(1);
        let pending_requests: PendingRequestMap = Arc::new(Mutex::new(HashMap::new()));

        // A task standing in for the session: never resolves on its own, the
        // way a real session parked in `select!` on a live socket wouldn't
        // either, so `close()` must not simply wait for it to finish.
        let session_task = tokio::spawn(async move {
            let _keep_alive = outgoing_rx;
            std::future::pending::<()>().await;
        });

        let (tx, rx) = oneshot::channel();
        pending_requests.lock().await.insert(Uuid::new_v4(), tx);

        let client = Client {
            outgoing_tx,
            pending_requests: pending_requests.clone(),
            session_task: Mutex::new(Some(session_task)),
            call_timeout: Duration::from_secs(30),
        };

        tokio::time::timeout(Duration::from_secs(1), client.close())
            .await
            .expect("close() should not hang waiting on a live session task")
            .unwrap();

        assert!(pending_requests.lock().await.is_empty());
        match rx.await.unwrap() {
            Err(Error::ConnectionClosed) => {}
            other => panic!("expected ConnectionClosed, got {:?}", other),
        }

        // Idempotent: a second close() finds nothing left to do.
        tokio::time::timeout(Duration::from_secs(1), client.close())
            .await
            .expect("second close() should also not hang")
            .unwrap();
    }
}

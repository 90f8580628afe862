//! The background task that owns the socket: sends outgoing requests as they
//! arrive on a channel, and demultiplexes incoming response frames to the
//! pending request waiting for that correlation id.

use crate::error::{Error, Result};
use crate::network::NetworkAdapter;
use crate::wire::{Header, RequestBody, ServerMessage, ToolCallBody};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use uuid::Uuid;

pub(crate) type ResponseResult = std::result::Result<Value, Error>;
pub(crate) type ResponseSender = oneshot::Sender<ResponseResult>;
pub(crate) type PendingRequestMap = Arc<Mutex<HashMap<Uuid, ResponseSender>>>;

#[derive(Debug, Clone, serde::Serialize)]
struct OutgoingFrame {
    header: Header,
    #[serde(flatten)]
    body: RequestBody,
}

pub(crate) struct ClientSession<A: NetworkAdapter> {
    adapter: A,
    pending_requests: PendingRequestMap,
    outgoing_rx: mpsc::Receiver<(Uuid, String, serde_json::Map<String, Value>, ResponseSender)>,
}

impl<A: NetworkAdapter + Send + 'static> ClientSession<A> {
    pub(crate) fn new(
        adapter: A,
        pending_requests: PendingRequestMap,
        outgoing_rx: mpsc::Receiver<(Uuid, String, serde_json::Map<String, Value>, ResponseSender)>,
    ) -> Self {
        Self {
            adapter,
            pending_requests,
            outgoing_rx,
        }
    }

    pub(crate) async fn run(mut self) {
        loop {
            tokio::select! {
                biased;

                next_call = self.outgoing_rx.recv() => {
                    match next_call {
                        Some((correlation_id, tool, args, responder)) => {
                            self.pending_requests.lock().await.insert(correlation_id, responder);
                            let frame = OutgoingFrame {
                                header: Header::new(correlation_id),
                                body: RequestBody::ToolCall(ToolCallBody { tool, args }),
                            };
                            match serde_json::to_string(&frame) {
                                Ok(payload) => {
                                    if let Err(e) = self.adapter.send(&payload).await {
                                        tracing::warn!(error = %e, "failed to send request, closing session");
                                        Self::fail_all_pending(&self.pending_requests, Error::ConnectionClosed).await;
                                        break;
                                    }
                                }
                                Err(e) => {
                                    Self::resolve(&self.pending_requests, correlation_id, Err(Error::from(e))).await;
                                }
                            }
                        }
                        None => break,
                    }
                }

                incoming = self.adapter.recv() => {
                    match incoming {
                        Ok(Some(raw)) => self.handle_incoming(&raw).await,
                        Ok(None) => {
                            tracing::info!("server closed the connection");
                            break;
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "error reading from server, closing session");
                            break;
                        }
                    }
                }
            }
        }

        Self::fail_all_pending(&self.pending_requests, Error::ConnectionClosed).await;
    }

    async fn handle_incoming(&self, raw: &str) {
        let message: ServerMessage = match serde_json::from_str(raw) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "received a malformed frame from the server");
                return;
            }
        };

        let correlation_id = message.header().correlation_id;
        let outcome: ResponseResult = match message {
            ServerMessage::Success { body, .. } => Ok(body.result),
            ServerMessage::Error { error, .. } => Err(Error::ToolExecution(crate::wire::ToolExecutionError {
                code: error.code,
                message: error.message,
            })),
        };

        Self::resolve(&self.pending_requests, correlation_id, outcome).await;
    }

    async fn resolve(pending: &PendingRequestMap, correlation_id: Uuid, outcome: ResponseResult) {
        let sender = pending.lock().await.remove(&correlation_id);
        match sender {
            Some(sender) => {
                let _ = sender.send(outcome);
            }
            None => {
                tracing::debug!(%correlation_id, "dropped an unsolicited or late response");
            }
        }
    }

    async fn fail_all_pending(pending: &PendingRequestMap, error_factory: Error) {
        let mut guard = pending.lock().await;
        for (_, sender) in guard.drain() {
            let _ = sender.send(Err(match &error_factory {
                Error::ConnectionClosed => Error::ConnectionClosed,
                other => Error::Other(other.to_string()),
            }));
        }
    }
}

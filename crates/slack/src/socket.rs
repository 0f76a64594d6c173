//! Socket Mode connection lifecycle.
//!
//! The [`SocketTransport`] trait hands raw text frames to the
//! [`SocketModeRunner`], which decodes them, acknowledges envelopes before
//! dispatching, and contains handler failures to the single event that
//! caused them. Reconnects follow a bounded exponential backoff and never
//! crash the process.

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use secrecy::SecretString;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::Message as WsMessage, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

use crate::events::{EventContext, EventDispatcher};
use crate::gateway::SlackWebClient;
use crate::payload::{parse_frame, SocketFrame};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport ack failed: {0}")]
    Acknowledge(String),
    #[error("transport disconnect failed: {0}")]
    Disconnect(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// A source of raw Socket Mode text frames plus the ack channel back.
#[async_trait]
pub trait SocketTransport: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;
    /// Next text frame, or `None` when the connection closed cleanly.
    async fn next_frame(&self) -> Result<Option<String>, TransportError>;
    async fn acknowledge(&self, envelope_id: &str) -> Result<(), TransportError>;
    async fn disconnect(&self) -> Result<(), TransportError>;
}

/// Stand-in transport used when socket mode is disabled in config; the
/// runner connects, sees a closed stream, and returns immediately.
#[derive(Default)]
pub struct NoopSocketTransport;

#[async_trait]
impl SocketTransport for NoopSocketTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn next_frame(&self) -> Result<Option<String>, TransportError> {
        Ok(None)
    }

    async fn acknowledge(&self, _envelope_id: &str) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Live Socket Mode transport: asks the Web API for a WebSocket URL with
/// the app-level token, then pumps frames over tokio-tungstenite. Pings are
/// answered inline; control frame semantics live in the runner.
pub struct WebSocketTransport {
    client: SlackWebClient,
    app_token: SecretString,
    stream: tokio::sync::Mutex<Option<WsStream>>,
}

impl WebSocketTransport {
    pub fn new(client: SlackWebClient, app_token: SecretString) -> Self {
        Self { client, app_token, stream: tokio::sync::Mutex::new(None) }
    }
}

#[async_trait]
impl SocketTransport for WebSocketTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        let url = self
            .client
            .connections_open(&self.app_token)
            .await
            .map_err(|error| TransportError::Connect(error.to_string()))?;

        let (stream, _response) = connect_async(url)
            .await
            .map_err(|error| TransportError::Connect(error.to_string()))?;

        *self.stream.lock().await = Some(stream);
        Ok(())
    }

    async fn next_frame(&self) -> Result<Option<String>, TransportError> {
        let mut guard = self.stream.lock().await;
        let Some(stream) = guard.as_mut() else {
            return Ok(None);
        };

        loop {
            match stream.next().await {
                Some(Ok(WsMessage::Text(text))) => return Ok(Some(text)),
                Some(Ok(WsMessage::Ping(data))) => {
                    stream
                        .send(WsMessage::Pong(data))
                        .await
                        .map_err(|error| TransportError::Receive(error.to_string()))?;
                }
                // A close without a preceding `disconnect` frame is the
                // server dropping us; report it as a read failure so the
                // runner's reconnect policy applies instead of ending the
                // loop. `Ok(None)` is reserved for an already-closed stream.
                Some(Ok(WsMessage::Close(_))) | None => {
                    *guard = None;
                    return Err(TransportError::Receive(
                        "connection closed by server".to_owned(),
                    ));
                }
                Some(Ok(_)) => continue,
                Some(Err(error)) => {
                    *guard = None;
                    return Err(TransportError::Receive(error.to_string()));
                }
            }
        }
    }

    async fn acknowledge(&self, envelope_id: &str) -> Result<(), TransportError> {
        let mut guard = self.stream.lock().await;
        let Some(stream) = guard.as_mut() else {
            return Err(TransportError::Acknowledge("connection is closed".to_owned()));
        };

        let ack = serde_json::json!({ "envelope_id": envelope_id }).to_string();
        stream
            .send(WsMessage::Text(ack))
            .await
            .map_err(|error| TransportError::Acknowledge(error.to_string()))
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let mut guard = self.stream.lock().await;
        if let Some(mut stream) = guard.take() {
            stream
                .close(None)
                .await
                .map_err(|error| TransportError::Disconnect(error.to_string()))?;
        }
        Ok(())
    }
}

pub struct SocketModeRunner {
    transport: Arc<dyn SocketTransport>,
    dispatcher: EventDispatcher,
    reconnect_policy: ReconnectPolicy,
}

impl SocketModeRunner {
    pub fn new(
        transport: Arc<dyn SocketTransport>,
        dispatcher: EventDispatcher,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, dispatcher, reconnect_policy }
    }

    pub async fn start(&self) -> Result<()> {
        let mut attempt = 0;
        loop {
            match self.connect_and_pump(attempt).await {
                Ok(()) => return Ok(()),
                Err(transport_error) => {
                    warn!(
                        attempt,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %transport_error,
                        "socket mode transport failed"
                    );

                    if attempt >= self.reconnect_policy.max_retries {
                        warn!(
                            max_retries = self.reconnect_policy.max_retries,
                            "socket mode retries exhausted; continuing process without crash"
                        );
                        return Ok(());
                    }

                    let delay = self.reconnect_policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }

    async fn connect_and_pump(&self, attempt: u32) -> Result<(), TransportError> {
        info!(attempt, "opening socket mode transport connection");
        self.transport.connect().await?;
        info!(attempt, "socket mode transport connected");

        loop {
            let Some(raw) = self.transport.next_frame().await? else {
                info!(attempt, "socket mode transport stream closed");
                self.transport.disconnect().await?;
                return Ok(());
            };

            let envelope = match parse_frame(&raw) {
                Ok(SocketFrame::Hello) => {
                    debug!(event_name = "socket_hello", "socket mode session established");
                    continue;
                }
                Ok(SocketFrame::Disconnect { reason }) => {
                    info!(
                        reason = reason.as_deref().unwrap_or("unspecified"),
                        event_name = "socket_disconnect_requested",
                        "server requested reconnect"
                    );
                    self.transport.disconnect().await?;
                    return Err(TransportError::Receive(format!(
                        "server requested disconnect: {}",
                        reason.as_deref().unwrap_or("unspecified")
                    )));
                }
                Ok(SocketFrame::Envelope(envelope)) => envelope,
                Err(error) => {
                    warn!(
                        error = %error,
                        event_name = "frame_decode_failed",
                        "skipping undecodable frame"
                    );
                    continue;
                }
            };

            info!(
                event_name = "envelope_received",
                envelope_id = %envelope.envelope_id,
                event_type = ?envelope.event.event_type(),
                "received slack envelope"
            );

            // Acknowledge first; Slack redelivers unacked envelopes and the
            // handler outcome must not delay or suppress the ack. An ack
            // failure is fatal to this interaction: dispatching anyway would
            // duplicate the side effects when the envelope is redelivered.
            if let Err(error) = self.transport.acknowledge(&envelope.envelope_id).await {
                warn!(
                    event_name = "envelope_ack_failed",
                    envelope_id = %envelope.envelope_id,
                    error = %error,
                    "failed to acknowledge slack envelope; skipping dispatch"
                );
                continue;
            }
            debug!(
                event_name = "envelope_acked",
                envelope_id = %envelope.envelope_id,
                "acknowledged slack envelope"
            );

            let context = EventContext { correlation_id: envelope.envelope_id.clone() };
            if let Err(error) = self.dispatcher.dispatch(&envelope, &context).await {
                warn!(
                    envelope_id = %envelope.envelope_id,
                    error = %error,
                    "event dispatch failed; continuing socket loop"
                );
            }
        }
    }
}

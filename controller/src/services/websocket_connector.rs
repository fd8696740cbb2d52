//! Real socket connector backed by tokio-tungstenite
//!
//! Each successful handshake spawns one pump task that owns the stream. The
//! controller talks to it only through the channels inside `TransportLink`;
//! dropping the link makes the pump send a close frame and exit.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::error::{ControllerError, ControllerResult};
use crate::traits::Connector;
use crate::types::{LinkEvent, TransportLink, OUTBOUND_BUFFER};
use shared::{process_debug, process_error, process_info, process_warn, ProcessId};

type VehicleStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct RealWebSocketConnector {
    handshake_timeout: Duration,
}

impl RealWebSocketConnector {
    pub fn new() -> Self {
        Self { handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT }
    }

    pub fn with_timeout(handshake_timeout: Duration) -> Self {
        Self { handshake_timeout }
    }
}

impl Default for RealWebSocketConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for RealWebSocketConnector {
    async fn connect(&self, url: &str) -> ControllerResult<TransportLink> {
        process_debug!(ProcessId::current(), "🔌 Opening socket to {}", url);

        let (stream, _response) = tokio::time::timeout(self.handshake_timeout, connect_async(url))
            .await
            .map_err(|_| ControllerError::handshake(url, "handshake timed out"))?
            .map_err(|e| ControllerError::handshake(url, e.to_string()))?;

        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        tokio::spawn(pump(stream, outbound_rx, events_tx, url.to_string()));

        process_info!(ProcessId::current(), "🔗 Socket open to {}", url);
        Ok(TransportLink::new(outbound_tx, events_rx))
    }
}

/// Shuttle frames between the socket and the link channels until either side ends
async fn pump(
    stream: VehicleStream,
    mut outbound: mpsc::Receiver<String>,
    events: mpsc::UnboundedSender<LinkEvent>,
    url: String,
) {
    let (mut sink, mut source) = stream.split();

    let reason = loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(text) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        process_error!(ProcessId::current(), "❌ Write to {} failed: {}", url, e);
                        break Some(e.to_string());
                    }
                }
                None => {
                    // Link dropped on our side
                    let _ = sink.send(Message::Close(None)).await;
                    process_debug!(ProcessId::current(), "🔌 Closed socket to {}", url);
                    return;
                }
            },
            incoming = source.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(LinkEvent::Message(text));
                }
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => {
                        let _ = events.send(LinkEvent::Message(text));
                    }
                    Err(_) => {
                        process_warn!(ProcessId::current(), "⚠️ Dropping non-UTF-8 binary frame from {}", url);
                    }
                },
                Some(Ok(Message::Close(frame))) => break frame.map(|f| f.reason.to_string()),
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    process_error!(ProcessId::current(), "❌ Socket to {} errored: {}", url, e);
                    break Some(e.to_string());
                }
                None => break None,
            },
        }
    };

    process_debug!(ProcessId::current(), "🔌 Socket to {} ended: {:?}", url, reason);
    let _ = events.send(LinkEvent::Closed { reason });
}

//! The single link to the vehicle and its connection state

use shared::{ConnectionState, ControlMessage};

use crate::error::{ControllerError, ControllerResult};
use crate::types::{Endpoint, LinkEvent, LinkSendError, TransportLink};

/// Issued by `open`; the handshake result must come back with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTicket {
    pub generation: u64,
    pub url: String,
    pub endpoint: Endpoint,
}

#[derive(Debug)]
pub enum HandshakeOutcome {
    Established,
    Failed(ControllerError),
    /// Superseded by a later open or close; the link was dropped
    Stale,
}

/// Sole owner of the connection state and of the live transport.
///
/// Each `open` bumps a generation counter so a handshake that finishes after
/// it was superseded is discarded instead of producing a second link.
#[derive(Debug)]
pub struct SocketSession {
    port: u16,
    state: ConnectionState,
    endpoint: Option<Endpoint>,
    link: Option<TransportLink>,
    generation: u64,
    handshake_pending: bool,
}

impl SocketSession {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            state: ConnectionState::Disconnected,
            endpoint: None,
            link: None,
            generation: 0,
            handshake_pending: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    /// Tear down whatever exists and start a handshake towards `endpoint`
    pub fn open(&mut self, endpoint: Endpoint, retry: bool) -> ConnectTicket {
        self.link = None;
        self.generation += 1;
        self.handshake_pending = true;
        self.state = if retry { ConnectionState::Reconnecting } else { ConnectionState::Connecting };

        let url = endpoint.socket_url(self.port);
        self.endpoint = Some(endpoint.clone());
        ConnectTicket { generation: self.generation, url, endpoint }
    }

    /// Feed back the result of the handshake started for `generation`
    pub fn complete_handshake(
        &mut self,
        generation: u64,
        result: ControllerResult<TransportLink>,
    ) -> HandshakeOutcome {
        if generation != self.generation || !self.handshake_pending {
            return HandshakeOutcome::Stale;
        }

        self.handshake_pending = false;
        match result {
            Ok(link) => {
                self.link = Some(link);
                self.state = ConnectionState::Connected;
                HandshakeOutcome::Established
            }
            Err(error) => {
                self.state = ConnectionState::Disconnected;
                HandshakeOutcome::Failed(error)
            }
        }
    }

    /// The transport reported the link gone
    pub fn on_link_closed(&mut self) {
        self.link = None;
        self.state = ConnectionState::Disconnected;
    }

    /// A retry is scheduled but its handshake has not started yet
    pub fn mark_reconnecting(&mut self) {
        if self.link.is_none() && !self.handshake_pending {
            self.state = ConnectionState::Reconnecting;
        }
    }

    /// A scheduled retry was cancelled before it started
    pub fn mark_idle(&mut self) {
        if self.link.is_none() && !self.handshake_pending {
            self.state = ConnectionState::Disconnected;
        }
    }

    /// Write one frame. State is checked right before the write.
    pub fn send(&self, message: &ControlMessage) -> ControllerResult<()> {
        if self.state != ConnectionState::Connected {
            return Err(ControllerError::NotConnected);
        }
        let link = self.link.as_ref().ok_or(ControllerError::NotConnected)?;
        let frame = message.to_frame()?;

        // A dead pump also surfaces as a Closed event; that drives reconnect.
        link.send_text(frame).map_err(|e| match e {
            LinkSendError::Full => ControllerError::OutboundFull,
            LinkSendError::Closed => ControllerError::NotConnected,
        })
    }

    /// Close the link and invalidate any handshake in flight
    pub fn close(&mut self) {
        self.link = None;
        self.generation += 1;
        self.handshake_pending = false;
        self.state = ConnectionState::Disconnected;
    }

    /// Next event from the live link; never resolves while there is none
    pub async fn next_event(&mut self) -> LinkEvent {
        match self.link.as_mut() {
            Some(link) => link.next_event().await,
            None => std::future::pending().await,
        }
    }
}

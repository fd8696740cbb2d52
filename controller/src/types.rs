//! Controller-side types: configuration, notices, link plumbing

use serde::{Deserialize, Serialize};
use shared::{ConfigData, ConnectionState, JoystickVector, OperatingMode, RouteStep};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use url::Url;

use crate::error::{ControllerError, ControllerResult};

/// Port the vehicle firmware listens on
pub const DEFAULT_VEHICLE_PORT: u16 = 81;

/// Edge length of the on-screen joystick pad, in pixels
pub const DEFAULT_JOYSTICK_SIZE: f64 = 180.0;

/// Frames a link buffers before writes start failing with `OutboundFull`
pub const OUTBOUND_BUFFER: usize = 32;

/// Runtime knobs for the controller loop
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub vehicle_port: u16,
    pub max_reconnect_attempts: u32,
    pub reconnect_delay: Duration,
    pub joystick_period: Duration,
    pub joystick_size: f64,
    pub heartbeat_interval: Duration,
    pub command_buffer: usize,
    pub notice_buffer: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            vehicle_port: DEFAULT_VEHICLE_PORT,
            max_reconnect_attempts: 10,
            reconnect_delay: Duration::from_millis(3000),
            joystick_period: Duration::from_millis(50),
            joystick_size: DEFAULT_JOYSTICK_SIZE,
            heartbeat_interval: Duration::from_secs(30),
            command_buffer: 64,
            notice_buffer: 128,
        }
    }
}

/// Host of the vehicle as entered by the operator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Endpoint(String);

impl Endpoint {
    /// Accepts a bare host or IP; a leading `ws://` and trailing `/` are tolerated.
    pub fn parse(input: &str) -> ControllerResult<Self> {
        let trimmed = input.trim();
        let host = trimmed
            .strip_prefix("ws://")
            .unwrap_or(trimmed)
            .trim_end_matches('/');

        let invalid = || ControllerError::InvalidEndpoint { input: input.to_string() };
        if host.is_empty() || host.contains('/') {
            return Err(invalid());
        }

        let parsed = Url::parse(&format!("ws://{host}:{DEFAULT_VEHICLE_PORT}")).map_err(|_| invalid())?;
        if parsed.host_str().is_none() || parsed.port() != Some(DEFAULT_VEHICLE_PORT) {
            return Err(invalid());
        }

        Ok(Self(host.to_string()))
    }

    pub fn host(&self) -> &str {
        &self.0
    }

    /// Socket URL for this host on the given port
    pub fn socket_url(&self, port: u16) -> String {
        format!("ws://{}:{}", self.0, port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Endpoint {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Endpoint::parse(s)
    }
}

/// Which of the two sticks on the manual pad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StickId {
    /// Left pad; Y is inverted before it goes on the wire
    Primary,
    /// Right pad
    Secondary,
}

impl FromStr for StickId {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" | "joy1" => Ok(StickId::Primary),
            "2" | "joy2" => Ok(StickId::Secondary),
            other => Err(ControllerError::invalid_command(format!("unknown joystick {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeLevel::Success => write!(f, "ok"),
            NoticeLevel::Info => write!(f, "info"),
            NoticeLevel::Warning => write!(f, "warn"),
            NoticeLevel::Error => write!(f, "error"),
        }
    }
}

/// Operator-facing notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// Read-only view of the whole controller state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub connection: ConnectionState,
    pub endpoint: Option<Endpoint>,
    pub mode: Option<OperatingMode>,
    pub route: Vec<RouteStep>,
    pub encoded_route: String,
    pub desired_config: ConfigData,
    pub observed_config: ConfigData,
    pub joy1: JoystickVector,
    pub joy2: JoystickVector,
    pub reconnect_attempts: u32,
    pub auto_reconnect: bool,
    pub retry_pending: bool,
}

/// Something the transport observed on an open link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// One inbound text frame
    Message(String),
    /// The link is gone; no further events follow
    Closed { reason: Option<String> },
}

/// Why a frame could not be queued on a link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSendError {
    /// The transport is behind; the frame was dropped
    Full,
    /// The transport has shut down
    Closed,
}

/// Live link handed out by a `Connector` after a successful handshake.
///
/// Outbound frames go through `send_text` into a queue of `OUTBOUND_BUFFER`
/// frames; everything the peer does comes back through `next_event`.
/// Dropping the link closes the socket.
#[derive(Debug)]
pub struct TransportLink {
    outbound: mpsc::Sender<String>,
    events: mpsc::UnboundedReceiver<LinkEvent>,
}

impl TransportLink {
    pub fn new(outbound: mpsc::Sender<String>, events: mpsc::UnboundedReceiver<LinkEvent>) -> Self {
        Self { outbound, events }
    }

    /// In-memory link plus the far end, for wiring without a socket
    pub fn pair() -> (TransportLink, RemoteEnd) {
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (
            TransportLink::new(outbound_tx, events_rx),
            RemoteEnd { frames: outbound_rx, events: events_tx },
        )
    }

    /// Queue a frame without waiting for room
    pub fn send_text(&self, frame: String) -> Result<(), LinkSendError> {
        self.outbound.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => LinkSendError::Full,
            TrySendError::Closed(_) => LinkSendError::Closed,
        })
    }

    pub async fn next_event(&mut self) -> LinkEvent {
        match self.events.recv().await {
            Some(event) => event,
            None => LinkEvent::Closed { reason: Some("transport dropped".to_string()) },
        }
    }
}

/// Far side of an in-memory `TransportLink`
#[derive(Debug)]
pub struct RemoteEnd {
    frames: mpsc::Receiver<String>,
    events: mpsc::UnboundedSender<LinkEvent>,
}

impl RemoteEnd {
    /// Push an inbound frame to the controller
    pub fn deliver(&self, frame: impl Into<String>) -> bool {
        self.events.send(LinkEvent::Message(frame.into())).is_ok()
    }

    /// Simulate the peer closing the socket
    pub fn close(&self, reason: Option<&str>) -> bool {
        self.events
            .send(LinkEvent::Closed { reason: reason.map(str::to_string) })
            .is_ok()
    }

    pub async fn next_frame(&mut self) -> Option<String> {
        self.frames.recv().await
    }

    /// Everything sent so far, without waiting
    pub fn drain_frames(&mut self) -> Vec<String> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.frames.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// True once the controller side dropped its link
    pub fn is_released(&self) -> bool {
        self.events.is_closed()
    }
}

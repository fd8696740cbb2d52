//! Fake connector, in-memory store and a socket-level fake vehicle

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;

use controller::{
    Connector, Controller, ControllerConfig, ControllerError, ControllerHandle, ControllerResult, Endpoint,
    EndpointStore, RemoteEnd, TransportLink,
};

/// One call the controller made to `connect`
#[derive(Debug, Clone)]
pub struct ConnectAttempt {
    pub url: String,
    pub at: Instant,
}

/// Connector that hands every link's far end to the test
pub struct FakeConnector {
    attempts: mpsc::UnboundedSender<ConnectAttempt>,
    remotes: mpsc::UnboundedSender<RemoteEnd>,
    refuse: Arc<AtomicBool>,
}

/// Test side of a `FakeConnector`
pub struct ConnectorControl {
    pub attempts: mpsc::UnboundedReceiver<ConnectAttempt>,
    pub remotes: mpsc::UnboundedReceiver<RemoteEnd>,
    refuse: Arc<AtomicBool>,
}

impl FakeConnector {
    pub fn new() -> (Self, ConnectorControl) {
        let (attempts_tx, attempts) = mpsc::unbounded_channel();
        let (remotes_tx, remotes) = mpsc::unbounded_channel();
        let refuse = Arc::new(AtomicBool::new(false));

        let connector = Self { attempts: attempts_tx, remotes: remotes_tx, refuse: refuse.clone() };
        (connector, ConnectorControl { attempts, remotes, refuse })
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, url: &str) -> ControllerResult<TransportLink> {
        let _ = self.attempts.send(ConnectAttempt { url: url.to_string(), at: Instant::now() });

        if self.refuse.load(Ordering::SeqCst) {
            return Err(ControllerError::handshake(url, "connection refused"));
        }

        let (link, remote) = TransportLink::pair();
        let _ = self.remotes.send(remote);
        Ok(link)
    }
}

impl ConnectorControl {
    pub fn refuse_connections(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Far end of the next successful handshake
    pub async fn next_remote(&mut self) -> RemoteEnd {
        tokio::time::timeout(Duration::from_secs(2), self.remotes.recv())
            .await
            .expect("no link was handed out")
            .expect("connector dropped")
    }

    pub async fn next_attempt(&mut self) -> ConnectAttempt {
        tokio::time::timeout(Duration::from_secs(60), self.attempts.recv())
            .await
            .expect("no connect attempt")
            .expect("connector dropped")
    }

    /// Every attempt recorded so far
    pub fn drain_attempts(&mut self) -> Vec<ConnectAttempt> {
        let mut seen = Vec::new();
        while let Ok(attempt) = self.attempts.try_recv() {
            seen.push(attempt);
        }
        seen
    }
}

/// Endpoint store kept in memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    saved: Arc<Mutex<Option<Endpoint>>>,
}

impl MemoryStore {
    pub fn saved(&self) -> Option<Endpoint> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl EndpointStore for MemoryStore {
    async fn load(&self) -> ControllerResult<Option<Endpoint>> {
        Ok(self.saved())
    }

    async fn save(&self, endpoint: &Endpoint) -> ControllerResult<()> {
        *self.saved.lock().unwrap() = Some(endpoint.clone());
        Ok(())
    }
}

/// A running controller wired to fakes
pub struct TestController {
    pub handle: ControllerHandle,
    pub link_control: ConnectorControl,
    pub store: MemoryStore,
    pub task: JoinHandle<()>,
}

pub fn spawn_controller(config: ControllerConfig) -> TestController {
    let (connector, link_control) = FakeConnector::new();
    let store = MemoryStore::default();
    let (controller, handle) = Controller::new(config, connector, store.clone());

    TestController { handle, link_control, store, task: controller.spawn() }
}

/// Config with timings short enough for wall-clock tests
pub fn fast_config() -> ControllerConfig {
    ControllerConfig {
        reconnect_delay: Duration::from_millis(50),
        joystick_period: Duration::from_millis(20),
        ..ControllerConfig::default()
    }
}

/// Something the fake vehicle should do to its one client
#[derive(Debug)]
pub enum VehicleAction {
    Send(String),
    SendBinary(Vec<u8>),
    Close,
    /// Drop the TCP stream without a close frame
    Abort,
}

/// Socket server standing in for the vehicle firmware; serves one client
pub struct FakeVehicle {
    pub addr: SocketAddr,
    /// Text frames the controller sent; closes when the client goes away
    pub received: mpsc::UnboundedReceiver<String>,
    pub actions: mpsc::UnboundedSender<VehicleAction>,
}

impl FakeVehicle {
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub fn send(&self, text: &str) {
        self.actions.send(VehicleAction::Send(text.to_string())).unwrap();
    }
}

/// Accept exactly one client on an ephemeral port
pub async fn spawn_fake_vehicle() -> FakeVehicle {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (received_tx, received) = mpsc::unbounded_channel();
    let (actions, mut actions_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let Ok((stream, _)) = listener.accept().await else { return };
        let Ok(socket) = tokio_tungstenite::accept_async(stream).await else { return };
        let (mut sink, mut source) = socket.split();

        loop {
            tokio::select! {
                action = actions_rx.recv() => match action {
                    Some(VehicleAction::Send(text)) => {
                        if sink.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Some(VehicleAction::SendBinary(bytes)) => {
                        if sink.send(Message::Binary(bytes)).await.is_err() {
                            break;
                        }
                    }
                    Some(VehicleAction::Close) | None => {
                        let _ = sink.close().await;
                        break;
                    }
                    Some(VehicleAction::Abort) => break,
                },
                incoming = source.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let _ = received_tx.send(text);
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                },
            }
        }
    });

    FakeVehicle { addr, received, actions }
}

/// A port nothing listens on
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

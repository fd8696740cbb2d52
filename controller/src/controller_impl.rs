//! Controller actor: one task owning the session state and the socket
//!
//! Every operation reaches the loop as a command and is handled to completion
//! before the next event is looked at, so the connection-state check and the
//! write that depends on it never straddle a suspension point. Handshakes run
//! in spawned tasks and report back with the generation they were issued for.

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};

use shared::{
    logging::log_error, process_debug, process_info, process_warn, ConfigField, ConnectionState, ControlMessage,
    InboundMessage, JoystickVector, OperatingMode, ProcessId, RouteStep, RouteStepKind, StepId,
};

use crate::core::{HandshakeOutcome, ReconnectDecision};
use crate::error::{ControllerError, ControllerResult};
use crate::state::SessionState;
use crate::traits::{Connector, EndpointStore};
use crate::types::{ControllerConfig, Endpoint, LinkEvent, Notice, StatusSnapshot, StickId, TransportLink};

type Reply<T> = oneshot::Sender<ControllerResult<T>>;

enum Command {
    Connect { endpoint: String, reply: Reply<Endpoint> },
    Disconnect { reply: Reply<()> },
    StopAutoReconnect { reply: Reply<bool> },
    ActivateMode { mode: OperatingMode, reply: Reply<bool> },
    AppendStep { kind: RouteStepKind, reply: Reply<StepId> },
    RemoveLastStep { reply: Reply<Option<RouteStep>> },
    RemoveStep { id: StepId, reply: Reply<Option<RouteStep>> },
    ClearRoute { reply: Reply<usize> },
    SendRoute { reply: Reply<String> },
    StartRoute { reply: Reply<()> },
    ResetRoute { reply: Reply<()> },
    SetConfigField { field: ConfigField, value: i32, reply: Reply<()> },
    SetConfigInput { field: ConfigField, raw: String, reply: Reply<i32> },
    SendConfig { reply: Reply<ControlMessage> },
    MoveJoystick { stick: StickId, dx: f64, dy: f64, reply: Reply<JoystickVector> },
    ReleaseJoystick { stick: StickId, reply: Reply<()> },
    Snapshot { reply: Reply<StatusSnapshot> },
    Shutdown { reply: Reply<()> },
}

struct HandshakeReport {
    generation: u64,
    result: ControllerResult<TransportLink>,
}

/// The event loop. Build with `new`, then `run` or `spawn` it.
pub struct Controller<C, S>
where
    C: Connector + 'static,
    S: EndpointStore + 'static,
{
    config: ControllerConfig,
    state: SessionState,

    // Injected dependencies (mockable for testing)
    connector: Arc<C>,
    store: Arc<S>,

    commands: mpsc::Receiver<Command>,
    saves_tx: mpsc::UnboundedSender<Endpoint>,
    saves_rx: Option<mpsc::UnboundedReceiver<Endpoint>>,
    handshakes_tx: mpsc::UnboundedSender<HandshakeReport>,
    handshakes_rx: mpsc::UnboundedReceiver<HandshakeReport>,
    joystick_timer: Option<Interval>,

    connection_tx: watch::Sender<ConnectionState>,
    notices: broadcast::Sender<Notice>,
}

impl<C, S> Controller<C, S>
where
    C: Connector + 'static,
    S: EndpointStore + 'static,
{
    pub fn new(config: ControllerConfig, connector: C, store: S) -> (Self, ControllerHandle) {
        let (commands_tx, commands) = mpsc::channel(config.command_buffer.max(1));
        let (handshakes_tx, handshakes_rx) = mpsc::unbounded_channel();
        let (saves_tx, saves_rx) = mpsc::unbounded_channel();
        let (connection_tx, connection_rx) = watch::channel(ConnectionState::Disconnected);
        let (notices, _) = broadcast::channel(config.notice_buffer.max(1));

        let handle = ControllerHandle {
            commands: commands_tx,
            connection: connection_rx,
            notices: notices.clone(),
        };

        let controller = Self {
            state: SessionState::new(&config),
            config,
            connector: Arc::new(connector),
            store: Arc::new(store),
            commands,
            saves_tx,
            saves_rx: Some(saves_rx),
            handshakes_tx,
            handshakes_rx,
            joystick_timer: None,
            connection_tx,
            notices,
        };

        (controller, handle)
    }

    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Main control loop; returns after shutdown or when every handle is gone
    pub async fn run(mut self) {
        process_info!(ProcessId::current(), "🎮 Controller loop started");
        if let Some(pending) = self.saves_rx.take() {
            tokio::spawn(write_endpoints(Arc::clone(&self.store), pending));
        }

        loop {
            let retry_deadline = self.state.reconnect.next_deadline();

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown { reply }) => {
                        self.teardown();
                        let _ = reply.send(Ok(()));
                        break;
                    }
                    Some(command) => self.handle_command(command),
                    None => {
                        self.teardown();
                        break;
                    }
                },
                Some(report) = self.handshakes_rx.recv() => self.on_handshake(report),
                event = self.state.session.next_event() => self.on_link_event(event),
                _ = sleep_until_deadline(retry_deadline) => self.on_retry_due(),
                _ = next_tick(&mut self.joystick_timer) => self.on_joystick_tick(),
            }
        }

        process_info!(ProcessId::current(), "🛑 Controller loop stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect { endpoint, reply } => {
                let result = Endpoint::parse(&endpoint).map(|endpoint| {
                    self.connect_to(endpoint.clone());
                    endpoint
                });
                self.report_failure(&result);
                let _ = reply.send(result);
            }
            Command::Disconnect { reply } => {
                self.state.reconnect.stop_auto_reconnect();
                self.state.session.close();
                self.state.announcer.on_link_lost();
                process_info!(ProcessId::current(), "🔌 Disconnected by operator");
                self.notify(Notice::info("Disconnected"));
                self.after_transition();
                let _ = reply.send(Ok(()));
            }
            Command::StopAutoReconnect { reply } => {
                let cancelled = self.state.reconnect.stop_auto_reconnect();
                if cancelled {
                    self.state.session.mark_idle();
                    process_info!(ProcessId::current(), "⏹️ Pending reconnect cancelled");
                }
                self.notify(Notice::info("Auto-reconnect stopped"));
                self.after_transition();
                let _ = reply.send(Ok(cancelled));
            }
            Command::ActivateMode { mode, reply } => {
                let announced = self.activate_mode(mode);
                let _ = reply.send(Ok(announced));
            }
            Command::AppendStep { kind, reply } => {
                let id = self.state.route.append(kind);
                process_debug!(ProcessId::current(), "➕ Route step {} ({})", kind, id);
                let _ = reply.send(Ok(id));
            }
            Command::RemoveLastStep { reply } => {
                let _ = reply.send(Ok(self.state.route.remove_last()));
            }
            Command::RemoveStep { id, reply } => {
                let _ = reply.send(Ok(self.state.route.remove_by_id(id)));
            }
            Command::ClearRoute { reply } => {
                let _ = reply.send(Ok(self.state.route.clear()));
            }
            Command::SendRoute { reply } => {
                let result = self.send_route();
                match &result {
                    Ok(letters) => self.notify(Notice::success(format!("Route sent: {letters}"))),
                    Err(_) => self.report_failure(&result),
                }
                let _ = reply.send(result);
            }
            Command::StartRoute { reply } => {
                let result = self.transmit(&ControlMessage::start_route());
                match &result {
                    Ok(()) => self.notify(Notice::success("Route started")),
                    Err(_) => self.report_failure(&result),
                }
                let _ = reply.send(result);
            }
            Command::ResetRoute { reply } => {
                let result = self.transmit(&ControlMessage::reset_route());
                match &result {
                    Ok(()) => self.notify(Notice::success("Route reset")),
                    Err(_) => self.report_failure(&result),
                }
                let _ = reply.send(result);
            }
            Command::SetConfigField { field, value, reply } => {
                self.state.config.set_field(field, value);
                let _ = reply.send(Ok(()));
            }
            Command::SetConfigInput { field, raw, reply } => {
                let value = self.state.config.set_field_from_input(field, &raw);
                let _ = reply.send(Ok(value));
            }
            Command::SendConfig { reply } => {
                let message = self.state.config.encode_desired();
                let result = self.transmit(&message).map(|()| {
                    self.state.config.mark_sent();
                    message
                });
                match &result {
                    Ok(_) => self.notify(Notice::success("Configuration sent")),
                    Err(_) => self.report_failure(&result),
                }
                let _ = reply.send(result);
            }
            Command::MoveJoystick { stick, dx, dy, reply } => {
                let _ = reply.send(Ok(self.state.joysticks.move_stick(stick, dx, dy)));
            }
            Command::ReleaseJoystick { stick, reply } => {
                self.state.joysticks.release(stick);
                if self.joystick_timer.is_some() {
                    // Best effort; the next tick carries the same value anyway
                    let _ = self.state.session.send(&self.state.joysticks.frame());
                }
                let _ = reply.send(Ok(()));
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(Ok(self.state.snapshot()));
            }
            Command::Shutdown { reply } => {
                // Handled in `run`
                let _ = reply.send(Ok(()));
            }
        }
    }

    fn connect_to(&mut self, endpoint: Endpoint) {
        self.state.reconnect.on_manual_open();
        process_info!(ProcessId::current(), "🔌 Connecting to {}", endpoint);
        self.notify(Notice::info(format!("Connecting to {endpoint}...")));
        self.persist_endpoint(&endpoint);
        self.begin_open(endpoint, false);
    }

    fn persist_endpoint(&self, endpoint: &Endpoint) {
        // Writer only goes away with the loop
        let _ = self.saves_tx.send(endpoint.clone());
    }

    fn begin_open(&mut self, endpoint: Endpoint, retry: bool) {
        let ticket = self.state.session.open(endpoint, retry);
        self.state.announcer.on_link_lost();

        let connector = Arc::clone(&self.connector);
        let reports = self.handshakes_tx.clone();
        tokio::spawn(async move {
            let result = connector.connect(&ticket.url).await;
            let _ = reports.send(HandshakeReport { generation: ticket.generation, result });
        });

        self.after_transition();
    }

    fn on_handshake(&mut self, report: HandshakeReport) {
        let streak = self.state.reconnect.attempt_count();

        match self.state.session.complete_handshake(report.generation, report.result) {
            HandshakeOutcome::Stale => {
                process_debug!(ProcessId::current(), "🗑️ Discarding superseded handshake (generation {})", report.generation);
                return;
            }
            HandshakeOutcome::Established => {
                self.state.reconnect.on_connected();
                let endpoint = self.state.session.endpoint().map(ToString::to_string).unwrap_or_default();
                process_info!(ProcessId::current(), "✅ Connected to {}", endpoint);
                self.notify(Notice::success("Connected successfully!"));

                if let Some(message) = self.state.announcer.on_link_established() {
                    if self.transmit(&message).is_err() {
                        self.state.announcer.on_announce_failed();
                    }
                }
            }
            HandshakeOutcome::Failed(error) => {
                process_warn!(ProcessId::current(), "⚠️ {}", error);
                if streak == 0 {
                    self.notify(Notice::error(format!("Failed to connect: {error}")));
                }
                self.schedule_reconnect();
            }
        }

        self.after_transition();
    }

    fn on_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Message(frame) => match InboundMessage::parse(&frame) {
                Ok(InboundMessage::ObservedConfig(report)) => {
                    process_debug!(ProcessId::current(), "📥 Observed config {:?}", report);
                    self.state.config.apply_observed(report);
                }
                Err(e) => {
                    process_warn!(ProcessId::current(), "⚠️ Dropping frame {:?}: {}", frame, e);
                }
            },
            LinkEvent::Closed { reason } => {
                self.state.session.on_link_closed();
                self.state.announcer.on_link_lost();
                process_warn!(
                    ProcessId::current(),
                    "🔌 Connection lost: {}",
                    reason.as_deref().unwrap_or("no reason given")
                );
                self.notify(Notice::warning("Connection lost"));
                self.schedule_reconnect();
                self.after_transition();
            }
        }
    }

    fn schedule_reconnect(&mut self) {
        match self.state.reconnect.on_closed(Instant::now()) {
            ReconnectDecision::Scheduled(retry) => {
                self.state.session.mark_reconnecting();
                process_info!(
                    ProcessId::current(),
                    "🔄 Reconnect attempt {}/{} in {:?}",
                    retry.attempt,
                    self.state.reconnect.max_attempts(),
                    self.state.reconnect.delay()
                );
                self.notify(Notice::info(format!(
                    "Reconnecting ({}/{})...",
                    retry.attempt,
                    self.state.reconnect.max_attempts()
                )));
            }
            ReconnectDecision::Disabled => {
                process_debug!(ProcessId::current(), "Auto-reconnect disabled; staying disconnected");
            }
            ReconnectDecision::Exhausted { attempts } => {
                let error = ControllerError::ExhaustedRetries { attempts };
                process_warn!(ProcessId::current(), "⚠️ {}", error);
                self.notify(Notice::warning(error.to_string()));
            }
        }
    }

    fn on_retry_due(&mut self) {
        let Some(retry) = self.state.reconnect.take_due(Instant::now()) else {
            return;
        };
        let Some(endpoint) = self.state.session.endpoint().cloned() else {
            self.state.session.mark_idle();
            self.after_transition();
            return;
        };

        process_info!(ProcessId::current(), "🔄 Reconnecting to {} (attempt {})", endpoint, retry.attempt);
        self.begin_open(endpoint, true);
    }

    fn on_joystick_tick(&mut self) {
        let frame = self.state.joysticks.frame();
        match self.state.session.send(&frame) {
            Ok(()) => {}
            Err(ControllerError::OutboundFull) => {
                process_debug!(ProcessId::current(), "🕹️ Outbound queue full, dropped joystick tick");
            }
            Err(e) => process_debug!(ProcessId::current(), "Joystick tick not sent: {}", e),
        }
    }

    fn activate_mode(&mut self, mode: OperatingMode) -> bool {
        let previous = self.state.announcer.active_mode();
        let connected = self.state.session.is_connected();

        let announced = match self.state.announcer.on_mode_activated(mode, connected) {
            Some(message) => match self.transmit(&message) {
                Ok(()) => true,
                Err(_) => {
                    self.state.announcer.on_announce_failed();
                    false
                }
            },
            None => false,
        };

        if previous == Some(OperatingMode::Manual) && mode != OperatingMode::Manual {
            self.state.joysticks.reset();
        }
        process_debug!(ProcessId::current(), "🧭 Mode {} active (announced: {})", mode, announced);

        self.sync_joystick_timer();
        announced
    }

    fn send_route(&mut self) -> ControllerResult<String> {
        if !self.state.session.is_connected() {
            return Err(ControllerError::NotConnected);
        }
        let letters = self.state.route.encode()?;
        self.transmit(&ControlMessage::route(letters.clone()))?;
        Ok(letters)
    }

    /// Single egress for operator-initiated frames
    fn transmit(&mut self, message: &ControlMessage) -> ControllerResult<()> {
        self.state.session.send(message)?;
        process_debug!(ProcessId::current(), "📤 Sent {} frame", message.kind());
        Ok(())
    }

    fn sync_joystick_timer(&mut self) {
        let streaming = self.state.session.is_connected()
            && self.state.announcer.active_mode() == Some(OperatingMode::Manual);

        match (streaming, self.joystick_timer.is_some()) {
            (true, false) => {
                let mut timer = tokio::time::interval(self.config.joystick_period);
                timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
                self.joystick_timer = Some(timer);
                process_debug!(ProcessId::current(), "🕹️ Joystick stream started");
            }
            (false, true) => {
                self.joystick_timer = None;
                process_debug!(ProcessId::current(), "🕹️ Joystick stream stopped");
            }
            _ => {}
        }
    }

    fn after_transition(&mut self) {
        let current = self.state.session.state();
        self.connection_tx.send_if_modified(|state| {
            if *state == current {
                false
            } else {
                *state = current;
                true
            }
        });
        self.sync_joystick_timer();
    }

    fn teardown(&mut self) {
        self.state.reconnect.stop_auto_reconnect();
        self.state.session.close();
        self.state.announcer.on_link_lost();
        self.after_transition();
    }

    fn notify(&self, notice: Notice) {
        // No subscribers is fine
        let _ = self.notices.send(notice);
    }

    fn report_failure<T>(&self, result: &ControllerResult<T>) {
        if let Err(e) = result {
            self.notify(Notice::error(e.to_string()));
        }
    }
}

/// Single writer for the endpoint store; saves land in the order connects asked
async fn write_endpoints<S>(store: Arc<S>, mut pending: mpsc::UnboundedReceiver<Endpoint>)
where
    S: EndpointStore + ?Sized,
{
    while let Some(mut endpoint) = pending.recv().await {
        // Only the newest queued endpoint is worth writing
        while let Ok(newer) = pending.try_recv() {
            endpoint = newer;
        }
        if let Err(e) = store.save(&endpoint).await {
            log_error(ProcessId::current(), "Saving endpoint", &e);
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Cloneable front door to a running controller
#[derive(Clone)]
pub struct ControllerHandle {
    commands: mpsc::Sender<Command>,
    connection: watch::Receiver<ConnectionState>,
    notices: broadcast::Sender<Notice>,
}

impl ControllerHandle {
    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> ControllerResult<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| ControllerError::ControllerStopped)?;
        response.await.map_err(|_| ControllerError::ControllerStopped)?
    }

    /// Open a session to `endpoint`, replacing any existing one
    pub async fn connect(&self, endpoint: &str) -> ControllerResult<Endpoint> {
        let endpoint = endpoint.to_string();
        self.request(|reply| Command::Connect { endpoint, reply }).await
    }

    /// Close the session and switch auto-reconnect off
    pub async fn disconnect(&self) -> ControllerResult<()> {
        self.request(|reply| Command::Disconnect { reply }).await
    }

    /// Returns true when a scheduled retry was cancelled
    pub async fn stop_auto_reconnect(&self) -> ControllerResult<bool> {
        self.request(|reply| Command::StopAutoReconnect { reply }).await
    }

    /// Returns true when a mode frame went out
    pub async fn activate_mode(&self, mode: OperatingMode) -> ControllerResult<bool> {
        self.request(|reply| Command::ActivateMode { mode, reply }).await
    }

    pub async fn append_step(&self, kind: RouteStepKind) -> ControllerResult<StepId> {
        self.request(|reply| Command::AppendStep { kind, reply }).await
    }

    pub async fn remove_last_step(&self) -> ControllerResult<Option<RouteStep>> {
        self.request(|reply| Command::RemoveLastStep { reply }).await
    }

    pub async fn remove_step(&self, id: StepId) -> ControllerResult<Option<RouteStep>> {
        self.request(|reply| Command::RemoveStep { id, reply }).await
    }

    pub async fn clear_route(&self) -> ControllerResult<usize> {
        self.request(|reply| Command::ClearRoute { reply }).await
    }

    /// Send the encoded route; returns the letters that went out
    pub async fn send_route(&self) -> ControllerResult<String> {
        self.request(|reply| Command::SendRoute { reply }).await
    }

    pub async fn start_route(&self) -> ControllerResult<()> {
        self.request(|reply| Command::StartRoute { reply }).await
    }

    pub async fn reset_route(&self) -> ControllerResult<()> {
        self.request(|reply| Command::ResetRoute { reply }).await
    }

    pub async fn set_config_field(&self, field: ConfigField, value: i32) -> ControllerResult<()> {
        self.request(|reply| Command::SetConfigField { field, value, reply }).await
    }

    /// Set a field from raw operator text; returns the sanitized value
    pub async fn set_config_input(&self, field: ConfigField, raw: &str) -> ControllerResult<i32> {
        let raw = raw.to_string();
        self.request(|reply| Command::SetConfigInput { field, raw, reply }).await
    }

    /// Push the desired config; returns the frame that was sent
    pub async fn send_config(&self) -> ControllerResult<ControlMessage> {
        self.request(|reply| Command::SendConfig { reply }).await
    }

    /// Record a drag; returns the stick's wire value
    pub async fn move_joystick(&self, stick: StickId, dx: f64, dy: f64) -> ControllerResult<JoystickVector> {
        self.request(|reply| Command::MoveJoystick { stick, dx, dy, reply }).await
    }

    pub async fn release_joystick(&self, stick: StickId) -> ControllerResult<()> {
        self.request(|reply| Command::ReleaseJoystick { stick, reply }).await
    }

    pub async fn snapshot(&self) -> ControllerResult<StatusSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Stop the loop; a loop that is already gone counts as stopped
    pub async fn shutdown(&self) -> ControllerResult<()> {
        match self.request(|reply| Command::Shutdown { reply }).await {
            Err(ControllerError::ControllerStopped) => Ok(()),
            other => other,
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.connection.borrow()
    }

    pub fn watch_connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection.clone()
    }

    /// Resolve once the connection reaches `target`
    pub async fn wait_for_state(&self, target: ConnectionState) -> ControllerResult<()> {
        let mut connection = self.connection.clone();
        connection
            .wait_for(|state| *state == target)
            .await
            .map(|_| ())
            .map_err(|_| ControllerError::ControllerStopped)
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }
}

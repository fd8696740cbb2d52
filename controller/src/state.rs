//! Session state aggregate owned by the controller loop

use crate::core::{ConfigSync, JoystickStreamer, ModeAnnouncer, ReconnectPolicy, RouteLedger, SocketSession};
use crate::types::{ControllerConfig, StatusSnapshot, StickId};

/// Everything the controller knows, owned by exactly one task
#[derive(Debug)]
pub struct SessionState {
    pub session: SocketSession,
    pub reconnect: ReconnectPolicy,
    pub announcer: ModeAnnouncer,
    pub joysticks: JoystickStreamer,
    pub route: RouteLedger,
    pub config: ConfigSync,
}

impl SessionState {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            session: SocketSession::new(config.vehicle_port),
            reconnect: ReconnectPolicy::new(config.max_reconnect_attempts, config.reconnect_delay),
            announcer: ModeAnnouncer::new(),
            joysticks: JoystickStreamer::new(config.joystick_size),
            route: RouteLedger::new(),
            config: ConfigSync::new(),
        }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            connection: self.session.state(),
            endpoint: self.session.endpoint().cloned(),
            mode: self.announcer.active_mode(),
            route: self.route.steps().to_vec(),
            encoded_route: self.route.letters(),
            desired_config: *self.config.desired(),
            observed_config: *self.config.observed(),
            joy1: self.joysticks.vector(StickId::Primary),
            joy2: self.joysticks.vector(StickId::Secondary),
            reconnect_attempts: self.reconnect.attempt_count(),
            auto_reconnect: self.reconnect.is_enabled(),
            retry_pending: self.reconnect.is_pending(),
        }
    }
}

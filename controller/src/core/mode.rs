//! One announcement per mode activation

use shared::{ControlMessage, OperatingMode};

/// Tracks the active screen's mode and whether the vehicle has heard it
/// on the current link.
#[derive(Debug, Clone, Default)]
pub struct ModeAnnouncer {
    active: Option<OperatingMode>,
    announced: bool,
}

impl ModeAnnouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_mode(&self) -> Option<OperatingMode> {
        self.active
    }

    pub fn is_announced(&self) -> bool {
        self.announced
    }

    /// A screen became active. Returns the frame to send, if any.
    ///
    /// Re-activating the current mode stays silent once announced. While
    /// disconnected the mode is recorded and announced on the next link.
    pub fn on_mode_activated(&mut self, mode: OperatingMode, connected: bool) -> Option<ControlMessage> {
        if self.active == Some(mode) && self.announced {
            return None;
        }

        self.active = Some(mode);
        self.announced = false;
        if !connected {
            return None;
        }

        self.announced = true;
        Some(ControlMessage::mode(mode))
    }

    /// A fresh link is up; the active screen re-announces itself
    pub fn on_link_established(&mut self) -> Option<ControlMessage> {
        let mode = self.active?;
        self.announced = true;
        Some(ControlMessage::mode(mode))
    }

    pub fn on_link_lost(&mut self) {
        self.announced = false;
    }

    /// The announcement could not be written; retry on the next link
    pub fn on_announce_failed(&mut self) {
        self.announced = false;
    }
}

//! Tracker configuration and request-handler state

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::traits::ActivityTracker;

pub const DEFAULT_TRACKER_PORT: u16 = 3001;

/// Window used by the operational view
pub const DEFAULT_ACTIVE_WINDOW: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub bind_address: SocketAddr,
    pub active_window: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_TRACKER_PORT),
            active_window: DEFAULT_ACTIVE_WINDOW,
        }
    }
}

/// Shared by every request handler
pub struct TrackerState<T: ActivityTracker> {
    pub tracker: T,
    pub active_window: Duration,
}

impl<T: ActivityTracker> TrackerState<T> {
    pub fn new(tracker: T, active_window: Duration) -> Self {
        Self { tracker, active_window }
    }
}

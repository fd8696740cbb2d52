//! Peer tracking side-channel messages

use serde::{Deserialize, Serialize};

use crate::types::ConnectedUser;

/// Identity the tracker resolved for the caller
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TrackResponse {
    pub ip: String,
}

/// Liveness refresh for an already registered peer
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct HeartbeatRequest {
    pub ip: String,
}

/// Registry entry plus its read-time activity flag
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TrackedUser {
    #[serde(flatten)]
    pub user: ConnectedUser,
    pub active: bool,
}

/// Operational view of the registry
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UserListResponse {
    pub users: Vec<TrackedUser>,
    pub active_count: usize,
    pub total: usize,
    pub window_secs: u64,
}

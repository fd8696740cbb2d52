//! Shared types for the remote vehicle control system
//!
//! Contains the wire contract spoken with the vehicle firmware, the domain
//! types both processes agree on, and the logging bootstrap used by every
//! binary in the workspace.

pub mod types;
pub mod errors;
pub mod logging;
pub mod messages;

pub use types::*;
pub use errors::*;

pub use messages::{
    // Controller ↔ vehicle firmware
    ControlMessage, InboundMessage, CONFIG_UNSET, ROUTE_RESET, ROUTE_START,

    // Controller ↔ tracker side-channel
    TrackResponse, HeartbeatRequest, TrackedUser, UserListResponse,
};

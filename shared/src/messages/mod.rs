//! Message types for the vehicle control system
//!
//! - `control`: Controller ↔ vehicle firmware frames (JSON text over the socket)
//! - `tracking`: Controller/operator ↔ tracker side-channel (JSON over HTTP)

pub mod control;
pub mod tracking;

pub use control::{ControlMessage, InboundMessage, CONFIG_UNSET, ROUTE_RESET, ROUTE_START};

pub use tracking::{HeartbeatRequest, TrackResponse, TrackedUser, UserListResponse};

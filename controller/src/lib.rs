//! Controller library for the remote vehicle control system
//!
//! Owns the single socket to the vehicle, keeps it alive with a bounded
//! reconnect policy, and serializes route, configuration, mode and joystick
//! operations onto it from one cooperative event loop.

pub mod console;
pub mod controller_impl;
pub mod core;
pub mod error;
pub mod services;
pub mod state;
pub mod traits;
pub mod types;

// Re-export main types
pub use controller_impl::{Controller, ControllerHandle};
pub use error::{ControllerError, ControllerResult};
pub use state::SessionState;
pub use types::*;

// Re-export trait definitions
pub use traits::{ActivityReporter, Connector, EndpointStore};

// Re-export service implementations
pub use services::{ActivityHeartbeat, RealActivityReporter, RealEndpointStore, RealWebSocketConnector};

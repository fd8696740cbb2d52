//! Core control logic
//!
//! Pure state machines and data models with no I/O of their own. The
//! controller actor drives them; everything here is deterministic and
//! testable without a socket.

pub mod config_sync;
pub mod joystick;
pub mod mode;
pub mod reconnect;
pub mod route;
pub mod session;

pub use config_sync::{sanitize_input, ConfigSync};
pub use joystick::JoystickStreamer;
pub use mode::ModeAnnouncer;
pub use reconnect::{PendingRetry, ReconnectDecision, ReconnectPolicy};
pub use route::RouteLedger;
pub use session::{ConnectTicket, HandshakeOutcome, SocketSession};

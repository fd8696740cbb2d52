//! Service implementations
//!
//! Real implementations of all service traits for production use

pub mod activity_reporter;
pub mod endpoint_store;
pub mod websocket_connector;

#[cfg(test)]
mod tests;

// Re-export service implementations
pub use activity_reporter::{ActivityHeartbeat, RealActivityReporter};
pub use endpoint_store::RealEndpointStore;
pub use websocket_connector::RealWebSocketConnector;

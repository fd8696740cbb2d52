//! Service traits for dependency injection and testing

use async_trait::async_trait;

use crate::error::ControllerResult;
use crate::types::{Endpoint, TransportLink};

/// Opens the socket to the vehicle
#[mockall::automock]
#[async_trait]
pub trait Connector: Send + Sync {
    /// Perform the handshake and hand back a live link
    async fn connect(&self, url: &str) -> ControllerResult<TransportLink>;
}

/// Remembers the last endpoint the operator connected to
#[mockall::automock]
#[async_trait]
pub trait EndpointStore: Send + Sync {
    async fn load(&self) -> ControllerResult<Option<Endpoint>>;

    async fn save(&self, endpoint: &Endpoint) -> ControllerResult<()>;
}

/// Announces this controller to the peer activity tracker
#[mockall::automock]
#[async_trait]
pub trait ActivityReporter: Send + Sync {
    /// Register and learn the identity the tracker assigned us
    async fn register(&self) -> ControllerResult<String>;

    /// Refresh liveness for a registered identity
    async fn touch(&self, ip: &str) -> ControllerResult<()>;
}

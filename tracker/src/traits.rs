//! Service traits for dependency injection and testing

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use shared::ConnectedUser;

/// Registry of peers and their liveness
#[mockall::automock]
#[async_trait]
pub trait ActivityTracker: Send + Sync {
    /// Insert or refresh a peer
    async fn register(&self, ip: &str, user_agent: &str) -> ConnectedUser;

    /// Refresh liveness; false when the identity is unknown
    async fn touch(&self, ip: &str) -> bool;

    async fn remove(&self, ip: &str) -> Option<ConnectedUser>;

    /// Entries seen within `window` of `now`
    async fn list_active(&self, window: Duration, now: DateTime<Utc>) -> Vec<ConnectedUser>;

    async fn list_all(&self) -> Vec<ConnectedUser>;
}

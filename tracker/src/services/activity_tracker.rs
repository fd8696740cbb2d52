//! Lock-guarded registry shared by every request

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::core::ActivityRegistry;
use crate::traits::ActivityTracker;
use shared::{process_debug, process_info, ConnectedUser, ProcessId};

/// Real activity tracker over the wall clock
#[derive(Clone, Default)]
pub struct RealActivityTracker {
    registry: Arc<RwLock<ActivityRegistry>>,
}

impl RealActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.registry.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.registry.read().await.is_empty()
    }
}

#[async_trait]
impl ActivityTracker for RealActivityTracker {
    async fn register(&self, ip: &str, user_agent: &str) -> ConnectedUser {
        let mut registry = self.registry.write().await;
        let known = registry.get(ip).is_some();
        let user = registry.register_at(ip, user_agent, Utc::now());

        if known {
            process_debug!(ProcessId::current(), "🔁 Re-registered {}", ip);
        } else {
            process_info!(ProcessId::current(), "👋 New peer {} ({})", ip, user_agent);
        }
        user
    }

    async fn touch(&self, ip: &str) -> bool {
        self.registry.write().await.touch_at(ip, Utc::now())
    }

    async fn remove(&self, ip: &str) -> Option<ConnectedUser> {
        let removed = self.registry.write().await.remove(ip);
        if removed.is_some() {
            process_info!(ProcessId::current(), "🗑️ Removed peer {}", ip);
        }
        removed
    }

    async fn list_active(&self, window: Duration, now: DateTime<Utc>) -> Vec<ConnectedUser> {
        self.registry.read().await.list_active(window, now)
    }

    async fn list_all(&self) -> Vec<ConnectedUser> {
        self.registry.read().await.all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_touch_remove() {
        let tracker = RealActivityTracker::new();

        let first = tracker.register("10.0.0.2", "agent").await;
        let again = tracker.register("10.0.0.2", "agent").await;
        assert_eq!(first.connected_at, again.connected_at);
        assert!(again.last_activity >= first.last_activity);
        assert_eq!(tracker.len().await, 1);

        assert!(tracker.touch("10.0.0.2").await);
        assert!(!tracker.touch("10.0.0.9").await);

        assert_eq!(tracker.list_active(Duration::minutes(5), Utc::now()).await.len(), 1);
        assert!(tracker.remove("10.0.0.2").await.is_some());
        assert!(tracker.is_empty().await);
    }

    #[tokio::test]
    async fn test_clones_share_registry() {
        let tracker = RealActivityTracker::new();
        let other = tracker.clone();

        other.register("10.0.0.4", "agent").await;
        assert_eq!(tracker.list_all().await.len(), 1);
    }
}

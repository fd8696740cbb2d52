//! In-memory registry of peers keyed by identity

use chrono::{DateTime, Duration, Utc};
use shared::ConnectedUser;
use std::collections::HashMap;

/// One entry per distinct identity. Entries leave only by explicit removal;
/// "active" is decided at read time.
#[derive(Debug, Clone, Default)]
pub struct ActivityRegistry {
    users: HashMap<String, ConnectedUser>,
}

impl ActivityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh. `connected_at` is kept from the first registration.
    pub fn register_at(&mut self, ip: &str, user_agent: &str, now: DateTime<Utc>) -> ConnectedUser {
        let user = self
            .users
            .entry(ip.to_string())
            .and_modify(|user| {
                user.user_agent = user_agent.to_string();
                user.last_activity = now;
            })
            .or_insert_with(|| ConnectedUser::new(ip, user_agent, now));
        user.clone()
    }

    /// Refresh liveness; false when the identity is unknown
    pub fn touch_at(&mut self, ip: &str, now: DateTime<Utc>) -> bool {
        match self.users.get_mut(ip) {
            Some(user) => {
                user.last_activity = now;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, ip: &str) -> Option<ConnectedUser> {
        self.users.remove(ip)
    }

    pub fn get(&self, ip: &str) -> Option<&ConnectedUser> {
        self.users.get(ip)
    }

    /// Seen strictly less than `window` ago
    pub fn is_active(user: &ConnectedUser, window: Duration, now: DateTime<Utc>) -> bool {
        now - user.last_activity < window
    }

    pub fn list_active(&self, window: Duration, now: DateTime<Utc>) -> Vec<ConnectedUser> {
        let mut active: Vec<ConnectedUser> = self
            .users
            .values()
            .filter(|user| Self::is_active(user, window, now))
            .cloned()
            .collect();
        sort_by_arrival(&mut active);
        active
    }

    /// Every entry, oldest registration first
    pub fn all(&self) -> Vec<ConnectedUser> {
        let mut users: Vec<ConnectedUser> = self.users.values().cloned().collect();
        sort_by_arrival(&mut users);
        users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

fn sort_by_arrival(users: &mut [ConnectedUser]) {
    users.sort_by(|a, b| a.connected_at.cmp(&b.connected_at).then_with(|| a.ip.cmp(&b.ip)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    #[test]
    fn test_reregister_keeps_connected_at() {
        let mut registry = ActivityRegistry::new();
        registry.register_at("10.0.0.2", "agent/1", at(0));
        let user = registry.register_at("10.0.0.2", "agent/2", at(90));

        assert_eq!(registry.len(), 1);
        assert_eq!(user.connected_at, at(0));
        assert_eq!(user.last_activity, at(90));
        assert_eq!(user.user_agent, "agent/2");
    }

    #[test]
    fn test_touch_refreshes_known_only() {
        let mut registry = ActivityRegistry::new();
        registry.register_at("10.0.0.2", "agent", at(0));

        assert!(registry.touch_at("10.0.0.2", at(30)));
        assert!(!registry.touch_at("10.0.0.3", at(30)));
        assert_eq!(registry.get("10.0.0.2").unwrap().last_activity, at(30));
        assert!(registry.get("10.0.0.3").is_none());
    }

    #[test]
    fn test_list_active_excludes_stale_entry() {
        let mut registry = ActivityRegistry::new();
        registry.register_at("10.0.0.2", "agent", at(0));
        registry.register_at("10.0.0.3", "agent", at(200));

        let active = registry.list_active(Duration::minutes(5), at(301));
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].ip, "10.0.0.3");
    }

    #[test]
    fn test_window_boundary_is_exclusive() {
        let mut registry = ActivityRegistry::new();
        registry.register_at("10.0.0.2", "agent", at(0));

        assert_eq!(registry.list_active(Duration::seconds(300), at(299)).len(), 1);
        assert!(registry.list_active(Duration::seconds(300), at(300)).is_empty());
    }

    #[test]
    fn test_stale_entries_are_never_pruned() {
        let mut registry = ActivityRegistry::new();
        registry.register_at("10.0.0.2", "agent", at(0));

        assert!(registry.list_active(Duration::minutes(5), at(10_000)).is_empty());
        assert_eq!(registry.all().len(), 1);
    }

    #[test]
    fn test_remove_is_explicit() {
        let mut registry = ActivityRegistry::new();
        registry.register_at("10.0.0.2", "agent", at(0));

        assert!(registry.remove("10.0.0.2").is_some());
        assert!(registry.remove("10.0.0.2").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_all_ordered_by_arrival() {
        let mut registry = ActivityRegistry::new();
        registry.register_at("10.0.0.9", "agent", at(10));
        registry.register_at("10.0.0.1", "agent", at(20));
        registry.register_at("10.0.0.9", "agent", at(30));

        let ips: Vec<String> = registry.all().into_iter().map(|user| user.ip).collect();
        assert_eq!(ips, vec!["10.0.0.9", "10.0.0.1"]);
    }
}

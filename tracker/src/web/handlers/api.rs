//! REST API handlers
//!
//! Identity is whatever the proxy headers claim; nothing here is a security
//! boundary.

use axum::{
    extract::{Path, Query, State},
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    response::Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::core::ActivityRegistry;
use crate::state::TrackerState;
use crate::traits::ActivityTracker;
use shared::{HeartbeatRequest, TrackResponse, TrackedUser, UserListResponse};

/// Identity assigned when no proxy header says otherwise
pub const UNKNOWN_IDENTITY: &str = "unknown";

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// First `x-forwarded-for` entry, else `x-real-ip`, else "unknown"
pub fn resolve_identity(headers: &HeaderMap) -> String {
    let forwarded = header_value(headers, "x-forwarded-for")
        .and_then(|list| list.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    forwarded
        .or_else(|| header_value(headers, "x-real-ip"))
        .unwrap_or(UNKNOWN_IDENTITY)
        .to_string()
}

/// Register the caller - /api/user/track
pub async fn track_user<T>(State(state): State<Arc<TrackerState<T>>>, headers: HeaderMap) -> Json<TrackResponse>
where
    T: ActivityTracker,
{
    let ip = resolve_identity(&headers);
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(UNKNOWN_IDENTITY);

    state.tracker.register(&ip, user_agent).await;
    Json(TrackResponse { ip })
}

/// Refresh liveness - /api/user/heartbeat
pub async fn heartbeat<T>(
    State(state): State<Arc<TrackerState<T>>>,
    Json(request): Json<HeartbeatRequest>,
) -> StatusCode
where
    T: ActivityTracker,
{
    if state.tracker.touch(&request.ip).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub window_secs: Option<u64>,
    #[serde(default)]
    pub active_only: bool,
}

/// Operational view - /api/users
pub async fn list_users<T>(
    State(state): State<Arc<TrackerState<T>>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<UserListResponse>, StatusCode>
where
    T: ActivityTracker,
{
    let window = query
        .window_secs
        .map(Duration::from_secs)
        .unwrap_or(state.active_window);
    let chrono_window = chrono::Duration::from_std(window).map_err(|_| StatusCode::BAD_REQUEST)?;

    // One instant for both the filter and the flags
    let now = Utc::now();
    let entries = if query.active_only {
        state.tracker.list_active(chrono_window, now).await
    } else {
        state.tracker.list_all().await
    };
    let users: Vec<TrackedUser> = entries
        .into_iter()
        .map(|user| TrackedUser {
            active: ActivityRegistry::is_active(&user, chrono_window, now),
            user,
        })
        .collect();
    let active_count = users.iter().filter(|entry| entry.active).count();

    Ok(Json(UserListResponse {
        total: users.len(),
        active_count,
        users,
        window_secs: window.as_secs(),
    }))
}

/// Operator removal - /api/users/:ip
pub async fn remove_user<T>(State(state): State<Arc<TrackerState<T>>>, Path(ip): Path<String>) -> StatusCode
where
    T: ActivityTracker,
{
    match state.tracker.remove(&ip).await {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_forwarded_for_wins() {
        let map = headers(&[("x-forwarded-for", "203.0.113.7, 10.0.0.1"), ("x-real-ip", "10.9.9.9")]);
        assert_eq!(resolve_identity(&map), "203.0.113.7");
    }

    #[test]
    fn test_real_ip_fallback() {
        assert_eq!(resolve_identity(&headers(&[("x-real-ip", "10.9.9.9")])), "10.9.9.9");
        // An empty first forwarded entry falls through as well
        let map = headers(&[("x-forwarded-for", " , 10.0.0.1"), ("x-real-ip", "10.9.9.9")]);
        assert_eq!(resolve_identity(&map), "10.9.9.9");
    }

    #[test]
    fn test_unknown_without_headers() {
        assert_eq!(resolve_identity(&HeaderMap::new()), UNKNOWN_IDENTITY);
    }
}

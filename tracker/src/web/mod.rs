//! HTTP surface of the tracker

pub mod handlers;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::state::TrackerState;
use crate::traits::ActivityTracker;
use handlers::api;

/// Build the router with every tracker route
pub fn build_router<T>(state: Arc<TrackerState<T>>) -> Router
where
    T: ActivityTracker + 'static,
{
    Router::new()
        // Peer side
        .route("/api/user/track", post(api::track_user::<T>))
        .route("/api/user/heartbeat", post(api::heartbeat::<T>))

        // Operator view
        .route("/api/users", get(api::list_users::<T>))
        .route("/api/users/:ip", delete(api::remove_user::<T>))

        // Health check
        .route("/health", get(api::health))

        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .into_inner(),
        )
        .with_state(state)
}

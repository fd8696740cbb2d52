//! Tracker server: binds the listener and serves the router

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::Router;
use tokio::net::TcpListener;

use crate::error::{TrackerError, TrackerResult};
use crate::state::{TrackerConfig, TrackerState};
use crate::traits::ActivityTracker;
use crate::web::build_router;
use shared::{logging, process_info, ProcessId};

/// HTTP server around one activity tracker
pub struct TrackerServer<T: ActivityTracker + 'static> {
    config: TrackerConfig,
    state: Arc<TrackerState<T>>,
}

impl<T: ActivityTracker + 'static> TrackerServer<T> {
    pub fn new(config: TrackerConfig, tracker: T) -> Self {
        let state = Arc::new(TrackerState::new(tracker, config.active_window));
        Self { config, state }
    }

    pub fn state(&self) -> Arc<TrackerState<T>> {
        Arc::clone(&self.state)
    }

    pub fn build_router(&self) -> Router {
        build_router(Arc::clone(&self.state))
    }

    /// Bind the configured address
    pub async fn bind(&self) -> TrackerResult<TcpListener> {
        TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|source| TrackerError::BindFailed { addr: self.config.bind_address, source })
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> TrackerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = listener.local_addr()?;
        process_info!(ProcessId::current(), "🌐 Tracker listening on http://{}", addr);

        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| TrackerError::ServerError { message: e.to_string() })?;

        logging::log_success(ProcessId::current(), "Tracker stopped cleanly");
        Ok(())
    }

    /// Bind and serve until Ctrl+C
    pub async fn run(&self) -> TrackerResult<()> {
        let listener = self.bind().await?;
        self.serve(listener, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }
}

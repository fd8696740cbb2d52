//! HTTP client for the peer activity tracker, plus the heartbeat task

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::{ControllerError, ControllerResult};
use crate::traits::ActivityReporter;
use shared::{process_debug, process_info, process_warn, HeartbeatRequest, ProcessId, TrackResponse};

/// Talks to the tracker's REST surface with reqwest
pub struct RealActivityReporter {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
}

impl RealActivityReporter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: format!("vehicle-controller/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ActivityReporter for RealActivityReporter {
    async fn register(&self) -> ControllerResult<String> {
        let response = self
            .client
            .post(self.url("/api/user/track"))
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| ControllerError::tracker(e.to_string()))?
            .error_for_status()
            .map_err(|e| ControllerError::tracker(e.to_string()))?;

        let body: TrackResponse = response
            .json()
            .await
            .map_err(|e| ControllerError::tracker(format!("bad track response: {e}")))?;
        Ok(body.ip)
    }

    async fn touch(&self, ip: &str) -> ControllerResult<()> {
        let response = self
            .client
            .post(self.url("/api/user/heartbeat"))
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .json(&HeartbeatRequest { ip: ip.to_string() })
            .send()
            .await
            .map_err(|e| ControllerError::tracker(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ControllerError::UnknownIdentity { ip: ip.to_string() });
        }
        response
            .error_for_status()
            .map_err(|e| ControllerError::tracker(e.to_string()))?;
        Ok(())
    }
}

/// Background task that keeps this controller listed as active.
///
/// Registers, then refreshes liveness every interval. Failures are logged.
/// A failed registration, or a tracker that no longer knows this identity,
/// sends the task back to registering on the next tick. Dropping the handle
/// aborts the task.
pub struct ActivityHeartbeat {
    task: JoinHandle<()>,
}

impl ActivityHeartbeat {
    pub fn start<R>(reporter: Arc<R>, interval: Duration) -> Self
    where
        R: ActivityReporter + ?Sized + 'static,
    {
        let task = tokio::spawn(async move {
            let mut identity: Option<String> = None;
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                match identity.as_deref() {
                    None => match reporter.register().await {
                        Ok(ip) => {
                            process_info!(ProcessId::current(), "📡 Registered with tracker as {}", ip);
                            identity = Some(ip);
                        }
                        Err(e) => {
                            process_warn!(ProcessId::current(), "⚠️ Tracker registration failed: {}", e);
                        }
                    },
                    Some(ip) => match reporter.touch(ip).await {
                        Ok(()) => {
                            process_debug!(ProcessId::current(), "💓 Heartbeat sent for {}", ip);
                        }
                        Err(ControllerError::UnknownIdentity { .. }) => {
                            process_warn!(ProcessId::current(), "⚠️ Tracker forgot {}, registering again", ip);
                            identity = None;
                        }
                        Err(e) => {
                            process_warn!(ProcessId::current(), "⚠️ Tracker heartbeat failed: {}", e);
                        }
                    },
                }
            }
        });

        Self { task }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(self) {
        // Drop aborts
    }
}

impl Drop for ActivityHeartbeat {
    fn drop(&mut self) {
        self.task.abort();
    }
}

//! File-backed endpoint persistence

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::error::{ControllerError, ControllerResult};
use crate::traits::EndpointStore;
use crate::types::Endpoint;
use shared::{process_debug, ProcessId};

pub const DEFAULT_STATE_FILE: &str = "./controller-state.json";

#[derive(Serialize, Deserialize, Debug)]
struct StoredPreferences {
    endpoint: Option<Endpoint>,
}

/// Keeps the last endpoint in a small JSON file
pub struct RealEndpointStore {
    path: PathBuf,
    // Held across write-then-rename; the temp path is shared
    write_lock: Mutex<()>,
}

impl RealEndpointStore {
    pub fn new() -> Self {
        Self::with_path(DEFAULT_STATE_FILE)
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for RealEndpointStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EndpointStore for RealEndpointStore {
    async fn load(&self) -> ControllerResult<Option<Endpoint>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ControllerError::IoError(e)),
        };

        let stored: StoredPreferences = serde_json::from_str(&content)
            .map_err(|e| ControllerError::store(format!("{}: {e}", self.path.display())))?;

        // Re-validate; the file may have been edited by hand
        match stored.endpoint {
            Some(endpoint) => Ok(Some(Endpoint::parse(endpoint.host())?)),
            None => Ok(None),
        }
    }

    async fn save(&self, endpoint: &Endpoint) -> ControllerResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(&StoredPreferences { endpoint: Some(endpoint.clone()) })?;

        let _guard = self.write_lock.lock().await;
        // Write-then-rename so a crash never leaves a torn file
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content).await?;
        fs::rename(&tmp_path, &self.path).await?;

        process_debug!(ProcessId::current(), "💾 Saved endpoint {} to {}", endpoint, self.path.display());
        Ok(())
    }
}

//! JSON snapshots of the economy on disk.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::economy::Economy;
use crate::error::ApiError;
use crate::state::AppState;

/// Read a snapshot. A missing file is `Ok(None)`; an unreadable or corrupt
/// one is an error so that a bad file is never silently replaced.
pub fn load(path: &Path) -> Result<Option<Economy>, ApiError> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ApiError::Storage(format!(
                "Failed to read {}: {e}",
                path.display()
            )))
        }
    };
    let economy = serde_json::from_str(&data).map_err(|e| {
        ApiError::Storage(format!("Failed to parse {}: {e}", path.display()))
    })?;
    info!(path = %path.display(), "loaded snapshot");
    Ok(Some(economy))
}

pub fn encode(economy: &Economy) -> Result<String, ApiError> {
    serde_json::to_string_pretty(economy)
        .map_err(|e| ApiError::Storage(format!("Failed to serialize: {e}")))
}

/// Write via a temp file in the same directory, then rename over the target.
pub fn write_atomic(path: &Path, data: &str) -> Result<(), ApiError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| ApiError::Storage(format!("Failed to create dir: {e}")))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    std::fs::write(&tmp, data)
        .map_err(|e| ApiError::Storage(format!("Failed to write: {e}")))?;
    std::fs::rename(&tmp, path)
        .map_err(|e| ApiError::Storage(format!("Failed to replace snapshot: {e}")))?;
    debug!(path = %path.display(), bytes = data.len(), "saved snapshot");
    Ok(())
}

/// Periodic housekeeping: flush the snapshot when state changed and prune
/// the rate limiter.
pub async fn run_maintenance(state: Arc<AppState>) {
    let mut ticker = tokio::time::interval(state.config.snapshot_interval);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if let Err(e) = state.flush_snapshot().await {
            error!(error = %e, "snapshot flush failed");
        }
        state.limiter.cleanup();
    }
}

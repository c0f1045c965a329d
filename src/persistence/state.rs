use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Sync progress stored in state.json
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    /// Unix seconds of the newest stop date already synced
    #[serde(default)]
    pub latest_sync_time: f64,
    #[serde(default)]
    pub last_run: Option<String>, // RFC3339 timestamp
}

pub fn load_state<P: AsRef<Path>>(path: P) -> Result<SyncState> {
    let path = path.as_ref();

    if !path.exists() {
        return Ok(SyncState::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read sync state: {}", path.display()))?;
    let state: SyncState = serde_json::from_str(&content)
        .with_context(|| format!("Invalid sync state: {}", path.display()))?;
    Ok(state)
}

pub fn save_state<P: AsRef<Path>>(path: P, state: &SyncState) -> Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    crate::persistence::atomic_write(path, &json)?;
    Ok(())
}

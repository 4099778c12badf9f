use std::fs;
use std::path::Path;

use crate::app::Result;
use crate::domain::SentState;
use crate::store::StateStore;

/// Keeps each job's sent state in a pretty-printed JSON file.
#[derive(Debug, Clone, Default)]
pub struct JsonStateStore;

impl JsonStateStore {
    pub fn new() -> Self {
        Self
    }
}

impl StateStore for JsonStateStore {
    fn load(&self, path: &Path) -> SentState {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!("No sent state at {}: {}", path.display(), e);
                return SentState::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable sent state at {}: {}",
                    path.display(),
                    e
                );
                SentState::new()
            }
        }
    }

    fn save(&self, path: &Path, state: &SentState) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut content = serde_json::to_string_pretty(state)?;
        content.push('\n');

        // Write beside the target and rename so a crash mid-write leaves the
        // previous state intact.
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, path)?;

        Ok(())
    }
}

pub mod json;

use std::path::Path;

use crate::app::Result;
use crate::domain::SentState;

pub use json::JsonStateStore;

pub trait StateStore {
    /// Loads the sent state at `path`. A missing or unreadable file is an
    /// empty state, never an error.
    fn load(&self, path: &Path) -> SentState;

    /// Overwrites the state at `path`, creating the file if needed.
    fn save(&self, path: &Path, state: &SentState) -> Result<()>;
}

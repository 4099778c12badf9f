use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Identities already delivered for one job.
///
/// Serializes as `{"sent_ids": [...]}` with the ids sorted and unique, so
/// the persisted file diffs cleanly between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentState {
    #[serde(default)]
    sent_ids: BTreeSet<String>,
}

impl SentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.sent_ids.contains(identity)
    }

    /// Returns `false` if the identity was already recorded.
    pub fn insert(&mut self, identity: impl Into<String>) -> bool {
        self.sent_ids.insert(identity.into())
    }

    pub fn len(&self) -> usize {
        self.sent_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent_ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.sent_ids.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for SentState {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            sent_ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

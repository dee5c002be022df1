//! Training-state file.
//!
//! Records the SHA-256 digest of every message already trained per
//! class, so reruns over the same folders only submit new mail.
//! Resetting the state never touches the controller's Bayes database.

use crate::rspamd::error::RspamdResult;
use crate::rspamd::types::LearnClass;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainState {
    #[serde(default)]
    pub spam_digests: BTreeSet<String>,
    #[serde(default)]
    pub ham_digests: BTreeSet<String>,
    #[serde(default)]
    pub last_run: Option<String>,
}

impl TrainState {
    /// Load the state file, or start fresh when it does not exist.
    pub fn load(path: &Path) -> RspamdResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Persist the state, stamping the run time.
    pub fn save(&mut self, path: &Path) -> RspamdResult<()> {
        self.last_run = Some(chrono::Utc::now().to_rfc3339());
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    fn digests(&self, class: LearnClass) -> &BTreeSet<String> {
        match class {
            LearnClass::Spam => &self.spam_digests,
            LearnClass::Ham => &self.ham_digests,
        }
    }

    pub fn contains(&self, class: LearnClass, digest: &str) -> bool {
        self.digests(class).contains(digest)
    }

    pub fn record(&mut self, class: LearnClass, digest: String) {
        match class {
            LearnClass::Spam => self.spam_digests.insert(digest),
            LearnClass::Ham => self.ham_digests.insert(digest),
        };
    }

    pub fn trained_count(&self, class: LearnClass) -> usize {
        self.digests(class).len()
    }
}

/// Stable identity of a message for dedup purposes.
pub fn message_digest(message: &[u8]) -> String {
    hex::encode(Sha256::digest(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_stable() {
        let a = message_digest(b"Subject: x\n\nbody\n");
        let b = message_digest(b"Subject: x\n\nbody\n");
        let c = message_digest(b"Subject: y\n\nbody\n");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_record_and_contains() {
        let mut state = TrainState::default();
        let digest = message_digest(b"x");
        assert!(!state.contains(LearnClass::Spam, &digest));
        state.record(LearnClass::Spam, digest.clone());
        assert!(state.contains(LearnClass::Spam, &digest));
        assert!(!state.contains(LearnClass::Ham, &digest));
        assert_eq!(state.trained_count(LearnClass::Spam), 1);
    }

    #[test]
    fn test_state_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut state = TrainState::default();
        state.record(LearnClass::Ham, message_digest(b"a"));
        state.save(&path).unwrap();

        let reloaded = TrainState::load(&path).unwrap();
        assert_eq!(reloaded.trained_count(LearnClass::Ham), 1);
        assert!(reloaded.last_run.is_some());
    }

    #[test]
    fn test_missing_state_file_is_fresh() {
        let state = TrainState::load(Path::new("/no/such/state.json")).unwrap();
        assert_eq!(state.trained_count(LearnClass::Spam), 0);
    }
}

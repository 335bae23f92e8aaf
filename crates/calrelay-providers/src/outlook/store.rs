//! Persistent state for the Outlook provider.
//!
//! A single JSON file holds three things: the bearer token with its
//! absolute expiry, the PKCE verifier for an in-flight authorization,
//! and the queue of events waiting for a credential. The file is
//! written atomically (temp file + rename) with owner-only permissions.
//!
//! Token reads fail closed: a token at or past its expiry is treated as
//! absent and evicted from the file in the same call, so no caller ever
//! observes a stale credential.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use calrelay_core::EventRequest;

use crate::error::{ProviderError, ProviderResult};

/// Default token lifetime when the authorization server does not
/// report one, in seconds.
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

/// A bearer token with its absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    /// The OAuth access token.
    pub access_token: String,
    /// Expiry instant as milliseconds since the Unix epoch.
    pub expires_at_ms: i64,
}

impl StoredToken {
    /// Returns true if the token is still valid at `now_ms`.
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        now_ms < self.expires_at_ms
    }
}

/// An event queued while no valid credential was available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEvent {
    /// Queue entry id, `pending_event_<timestamp-ms>`.
    pub id: String,
    /// The original event payload, replayed verbatim.
    pub event: EventRequest,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<StoredToken>,
    #[serde(rename = "pkce_verifier", skip_serializing_if = "Option::is_none")]
    verifier: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pending: Vec<PendingEvent>,
}

/// On-disk store for Outlook authorization state.
#[derive(Debug)]
pub struct OutlookStore {
    path: PathBuf,
    state: RwLock<StoreState>,
}

impl OutlookStore {
    /// Opens the store, loading existing state if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> ProviderResult<Self> {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                ProviderError::storage(format!(
                    "corrupt state file at {}",
                    path.display()
                ))
                .with_source(e)
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreState::default(),
            Err(e) => {
                return Err(ProviderError::storage(format!(
                    "failed to read state file at {}",
                    path.display()
                ))
                .with_source(e));
            }
        };
        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    /// Returns the stored token if it is still valid.
    ///
    /// An expired token is removed from the file before returning
    /// `None`, so a later write cannot resurrect it.
    pub fn read_token(&self) -> ProviderResult<Option<String>> {
        let now_ms = Utc::now().timestamp_millis();
        let mut state = self.state.write().expect("store lock poisoned");
        match &state.token {
            Some(token) if token.is_valid_at(now_ms) => Ok(Some(token.access_token.clone())),
            Some(_) => {
                debug!("evicting expired token");
                state.token = None;
                self.persist(&state)?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Stores a fresh token valid for `lifetime_secs` from now.
    pub fn write_token(&self, access_token: impl Into<String>, lifetime_secs: u64) -> ProviderResult<()> {
        let expires_at_ms = Utc::now().timestamp_millis() + (lifetime_secs as i64) * 1000;
        let mut state = self.state.write().expect("store lock poisoned");
        state.token = Some(StoredToken {
            access_token: access_token.into(),
            expires_at_ms,
        });
        self.persist(&state)?;
        info!(lifetime_secs, "stored access token");
        Ok(())
    }

    /// Removes the stored token, valid or not.
    pub fn clear_token(&self) -> ProviderResult<()> {
        let mut state = self.state.write().expect("store lock poisoned");
        if state.token.take().is_some() {
            self.persist(&state)?;
        }
        Ok(())
    }

    /// Returns true if a currently valid token is stored. Does not evict.
    pub fn has_valid_token(&self) -> bool {
        let now_ms = Utc::now().timestamp_millis();
        let state = self.state.read().expect("store lock poisoned");
        state
            .token
            .as_ref()
            .is_some_and(|token| token.is_valid_at(now_ms))
    }

    /// Records the start of an authorization: the PKCE verifier and the
    /// event that triggered it, persisted in a single write.
    ///
    /// A second authorization started before the first completes
    /// overwrites the verifier; only the newest flow can finish.
    pub fn begin_authorization(
        &self,
        verifier: impl Into<String>,
        pending: PendingEvent,
    ) -> ProviderResult<()> {
        let mut state = self.state.write().expect("store lock poisoned");
        state.verifier = Some(verifier.into());
        state.pending.push(pending);
        self.persist(&state)
    }

    /// Removes and returns the stored PKCE verifier.
    pub fn take_verifier(&self) -> ProviderResult<Option<String>> {
        let mut state = self.state.write().expect("store lock poisoned");
        let verifier = state.verifier.take();
        if verifier.is_some() {
            self.persist(&state)?;
        }
        Ok(verifier)
    }

    /// Queues an event for replay without starting an authorization.
    pub fn push_pending(&self, pending: PendingEvent) -> ProviderResult<()> {
        let mut state = self.state.write().expect("store lock poisoned");
        state.pending.push(pending);
        self.persist(&state)
    }

    /// Returns the ids of all queued events, oldest first.
    pub fn pending_ids(&self) -> Vec<String> {
        let state = self.state.read().expect("store lock poisoned");
        state.pending.iter().map(|p| p.id.clone()).collect()
    }

    /// Looks up a queued event by id.
    pub fn pending_event(&self, id: &str) -> Option<PendingEvent> {
        let state = self.state.read().expect("store lock poisoned");
        state.pending.iter().find(|p| p.id == id).cloned()
    }

    /// Deletes a queued event by id. Missing ids are ignored.
    pub fn remove_pending(&self, id: &str) -> ProviderResult<()> {
        let mut state = self.state.write().expect("store lock poisoned");
        let before = state.pending.len();
        state.pending.retain(|p| p.id != id);
        if state.pending.len() != before {
            self.persist(&state)?;
        }
        Ok(())
    }

    /// Number of queued events.
    pub fn pending_count(&self) -> usize {
        let state = self.state.read().expect("store lock poisoned");
        state.pending.len()
    }

    /// Writes the state file atomically with owner-only permissions.
    fn persist(&self, state: &StoreState) -> ProviderResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                ProviderError::storage(format!(
                    "failed to create state directory {}",
                    parent.display()
                ))
                .with_source(e)
            })?;
        }

        let contents = serde_json::to_string_pretty(state)
            .map_err(|e| ProviderError::storage("failed to serialize state").with_source(e))?;

        let tmp_path = temp_path(&self.path);
        let mut file = fs::File::create(&tmp_path).map_err(|e| {
            ProviderError::storage(format!("failed to create {}", tmp_path.display()))
                .with_source(e)
        })?;
        file.write_all(contents.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| {
                ProviderError::storage(format!("failed to write {}", tmp_path.display()))
                    .with_source(e)
            })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600));
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            ProviderError::storage(format!(
                "failed to replace state file {}",
                self.path.display()
            ))
            .with_source(e)
        })
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calrelay_core::ProviderKind;
    use tempfile::tempdir;

    fn sample_event() -> EventRequest {
        EventRequest::new(ProviderKind::Outlook)
            .with_summary("Sync")
            .with_times("2025-03-01T10:00:00", "2025-03-01T11:00:00")
    }

    #[test]
    fn open_missing_file_starts_empty() {
        let dir = tempdir().unwrap();
        let store = OutlookStore::open(dir.path().join("state.json")).unwrap();
        assert!(store.read_token().unwrap().is_none());
        assert_eq!(store.pending_count(), 0);
    }

    #[test]
    fn write_then_read_token() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = OutlookStore::open(&path).unwrap();

        store.write_token("tok_abc", DEFAULT_TOKEN_LIFETIME_SECS).unwrap();
        assert_eq!(store.read_token().unwrap().as_deref(), Some("tok_abc"));
        assert!(store.has_valid_token());

        // Reopen from disk; the token survives the process.
        let reopened = OutlookStore::open(&path).unwrap();
        assert_eq!(reopened.read_token().unwrap().as_deref(), Some("tok_abc"));
    }

    #[test]
    fn expired_token_is_evicted_on_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = OutlookStore::open(&path).unwrap();

        store.write_token("tok_old", 0).unwrap();
        assert!(store.read_token().unwrap().is_none());

        // The eviction reached the file, not just memory.
        let contents = fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("tok_old"));
    }

    #[test]
    fn clear_token_removes_valid_token() {
        let dir = tempdir().unwrap();
        let store = OutlookStore::open(dir.path().join("state.json")).unwrap();

        store.write_token("tok_abc", DEFAULT_TOKEN_LIFETIME_SECS).unwrap();
        store.clear_token().unwrap();
        assert!(store.read_token().unwrap().is_none());
    }

    #[test]
    fn begin_authorization_persists_verifier_and_pending() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = OutlookStore::open(&path).unwrap();

        let pending = PendingEvent {
            id: "pending_event_1000".to_string(),
            event: sample_event(),
        };
        store.begin_authorization("a".repeat(64), pending).unwrap();

        let reopened = OutlookStore::open(&path).unwrap();
        assert_eq!(reopened.pending_count(), 1);
        assert_eq!(
            reopened.take_verifier().unwrap().as_deref(),
            Some("a".repeat(64).as_str())
        );
        // The verifier is single-use.
        assert!(reopened.take_verifier().unwrap().is_none());
    }

    #[test]
    fn second_authorization_overwrites_verifier() {
        let dir = tempdir().unwrap();
        let store = OutlookStore::open(dir.path().join("state.json")).unwrap();

        let first = PendingEvent {
            id: "pending_event_1".to_string(),
            event: sample_event(),
        };
        let second = PendingEvent {
            id: "pending_event_2".to_string(),
            event: sample_event(),
        };
        store.begin_authorization("verifier_one", first).unwrap();
        store.begin_authorization("verifier_two", second).unwrap();

        assert_eq!(
            store.take_verifier().unwrap().as_deref(),
            Some("verifier_two")
        );
        // Both triggering events remain queued.
        assert_eq!(store.pending_count(), 2);
    }

    #[test]
    fn remove_pending_deletes_only_the_named_entry() {
        let dir = tempdir().unwrap();
        let store = OutlookStore::open(dir.path().join("state.json")).unwrap();

        for id in ["pending_event_1", "pending_event_2", "pending_event_3"] {
            store
                .push_pending(PendingEvent {
                    id: id.to_string(),
                    event: sample_event(),
                })
                .unwrap();
        }

        store.remove_pending("pending_event_2").unwrap();
        assert_eq!(
            store.pending_ids(),
            vec!["pending_event_1", "pending_event_3"]
        );

        // Removing an unknown id is a no-op.
        store.remove_pending("pending_event_99").unwrap();
        assert_eq!(store.pending_count(), 2);
    }

    #[test]
    fn corrupt_state_file_is_a_storage_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "not json").unwrap();

        let err = OutlookStore::open(&path).unwrap_err();
        assert_eq!(err.code(), crate::ProviderErrorCode::StorageError);
    }
}

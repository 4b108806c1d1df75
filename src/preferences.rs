//! Persisted dashboard toggles.
//!
//! Both flags are read once when the store is opened and written back as the
//! literal strings `"true"` / `"false"` on every toggle. Anything other than
//! `"true"` (including a missing key or a failed read) loads as `false`.

use crate::storage::{KeyValueStore, StoreError};

pub const SHOW_PRIVATE_REPOS_KEY: &str = "showPrivateRepos";
pub const SHOW_RATE_LIMIT_KEY: &str = "showRateLimit";

/// Snapshot of the flags, handed to fetching and filtering code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DashboardPreferences {
    pub show_private_repos: bool,
    pub show_rate_limit: bool,
}

pub struct PreferenceStore {
    store: Box<dyn KeyValueStore>,
    current: DashboardPreferences,
}

impl PreferenceStore {
    pub fn load(store: Box<dyn KeyValueStore>) -> Self {
        let current = DashboardPreferences {
            show_private_repos: read_flag(store.as_ref(), SHOW_PRIVATE_REPOS_KEY),
            show_rate_limit: read_flag(store.as_ref(), SHOW_RATE_LIMIT_KEY),
        };
        tracing::debug!(?current, "loaded dashboard preferences");
        Self { store, current }
    }

    pub fn current(&self) -> DashboardPreferences {
        self.current
    }

    /// Flips the private-repository flag and persists it. The in-memory value
    /// changes even if the write fails.
    pub fn toggle_private_repos(&mut self) -> Result<bool, StoreError> {
        self.current.show_private_repos = !self.current.show_private_repos;
        let value = self.current.show_private_repos;
        write_flag(self.store.as_ref(), SHOW_PRIVATE_REPOS_KEY, value)?;
        Ok(value)
    }

    pub fn toggle_rate_limit(&mut self) -> Result<bool, StoreError> {
        self.current.show_rate_limit = !self.current.show_rate_limit;
        let value = self.current.show_rate_limit;
        write_flag(self.store.as_ref(), SHOW_RATE_LIMIT_KEY, value)?;
        Ok(value)
    }
}

fn read_flag(store: &dyn KeyValueStore, key: &str) -> bool {
    match store.get(key) {
        Ok(value) => value.as_deref() == Some("true"),
        Err(err) => {
            tracing::warn!(key, error = %err, "failed to read preference; using default");
            false
        }
    }
}

fn write_flag(store: &dyn KeyValueStore, key: &str, value: bool) -> Result<(), StoreError> {
    let raw = if value { "true" } else { "false" };
    store.set(key, raw).inspect_err(|err| {
        tracing::warn!(key, error = %err, "failed to persist preference");
    })
}

use super::{read_value, remove_value, write_value};
use crate::error::StoreError;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

const TOKEN_FILE: &str = "access_token";

/// Single source of truth for the bearer credential.
///
/// Reads hit the in-memory cache first; durable storage is consulted at most
/// once per process lifetime. Absence of a credential means every protected
/// operation runs unauthenticated. No expiry or refresh happens client-side —
/// the backend rejects stale tokens and the caller reacts to the HTTP error.
pub struct TokenStore {
    path: PathBuf,
    // Outer Option tracks whether durable storage has been read yet.
    cached: Mutex<Option<Option<String>>>,
}

impl TokenStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(TOKEN_FILE),
            cached: Mutex::new(None),
        }
    }

    pub fn get(&self) -> Option<String> {
        let mut guard = self
            .cached
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = guard.as_ref() {
            return cached.clone();
        }
        let value = read_value(&self.path);
        *guard = Some(value.clone());
        value
    }

    /// `set(None)` clears both the in-memory cache and durable storage.
    pub fn set(&self, token: Option<&str>) -> Result<(), StoreError> {
        match token {
            Some(token) => write_value(&self.path, token)?,
            None => remove_value(&self.path)?,
        }
        let mut guard = self
            .cached
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Some(token.map(str::to_string));
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }
}

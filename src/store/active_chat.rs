use super::{read_value, remove_value, write_value};
use crate::error::StoreError;
use std::path::{Path, PathBuf};

const CHAT_ID_FILE: &str = "chat_id";

/// Persists the active chat id so the selection survives restarts.
pub struct ActiveChatStore {
    path: PathBuf,
}

impl ActiveChatStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(CHAT_ID_FILE),
        }
    }

    pub fn get(&self) -> Option<String> {
        read_value(&self.path)
    }

    pub fn set(&self, chat_id: &str) -> Result<(), StoreError> {
        write_value(&self.path, chat_id)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        remove_value(&self.path)
    }
}

//! Durable client-side key/value state.
//!
//! The backend owns every piece of real data; the client persists exactly two
//! strings across runs — the bearer token and the active chat id — as plain
//! files under the state dir. No schema versioning.

mod active_chat;
mod token;

pub use active_chat::ActiveChatStore;
pub use token::TokenStore;

use crate::error::StoreError;
use std::fs;
use std::path::Path;

fn read_value(path: &Path) -> Option<String> {
    let contents = fs::read_to_string(path).ok()?;
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn write_value(path: &Path, value: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, value)?;
    Ok(())
}

fn remove_value(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(error.into()),
    }
}

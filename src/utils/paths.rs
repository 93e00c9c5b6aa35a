//! Cross-Platform Path Utilities
//!
//! Resolves the application directory (`~/.streamchat/`) and the files kept
//! in it.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Environment variable overriding the application directory
pub const HOME_ENV: &str = "STREAMCHAT_HOME";

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the application directory (`$STREAMCHAT_HOME` or `~/.streamchat/`)
pub fn streamchat_dir() -> AppResult<PathBuf> {
    match std::env::var_os(HOME_ENV) {
        Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => Ok(home_dir()?.join(".streamchat")),
    }
}

/// Get the config file path (~/.streamchat/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(streamchat_dir()?.join("config.json"))
}

/// Get the chat history path (~/.streamchat/chat_history.json)
pub fn chat_history_path() -> AppResult<PathBuf> {
    Ok(streamchat_dir()?.join("chat_history.json"))
}

/// Get the credentials file path (~/.streamchat/credentials.json)
pub fn credentials_path() -> AppResult<PathBuf> {
    Ok(streamchat_dir()?.join("credentials.json"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Ensure the parent directory of a file exists
pub fn ensure_parent(file: &Path) -> AppResult<()> {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

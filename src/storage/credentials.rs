//! Credential Storage
//!
//! Opaque API keys in a JSON map (`openai`, `groq`, `gemini`, `tavily`).
//! Empty values count as absent.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use streamchat_llm::ProviderIdentity;

use crate::utils::error::AppResult;
use crate::utils::paths::{credentials_path, ensure_parent};

/// Credential key for the web search service
pub const TAVILY_KEY: &str = "tavily";

/// File-backed API key store
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    keys: BTreeMap<String, String>,
}

impl CredentialStore {
    /// Open the store at the default location
    pub fn new() -> AppResult<Self> {
        Self::open(credentials_path()?)
    }

    /// Open the store at `path`. A missing or unreadable file yields an
    /// empty store.
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let keys = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable credentials file");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Ok(Self { path, keys })
    }

    /// Look up a key, treating empty strings as absent
    pub fn get(&self, name: &str) -> Option<&str> {
        self.keys
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn for_provider(&self, provider: ProviderIdentity) -> Option<&str> {
        self.get(provider.as_str())
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Store a key and persist the file. An empty value removes the key.
    pub fn set(&mut self, name: &str, value: &str) -> AppResult<()> {
        let value = value.trim();
        if value.is_empty() {
            self.keys.remove(name);
        } else {
            self.keys.insert(name.to_string(), value.to_string());
        }
        self.save()
    }

    fn save(&self) -> AppResult<()> {
        ensure_parent(&self.path)?;
        let content = serde_json::to_string_pretty(&self.keys)?;
        let mut file = open_private(&self.path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Names of configured keys (values are never exposed in listings)
    pub fn configured(&self) -> Vec<&str> {
        self.keys
            .iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

/// Open for writing, owner-only from creation. A file left with wider
/// permissions by an earlier version is tightened before any key is written.
#[cfg(unix)]
fn open_private(path: &Path) -> AppResult<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> AppResult<File> {
    Ok(OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?)
}

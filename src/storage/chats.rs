//! Chat History Storage
//!
//! All chats live in one JSON document together with the id of the current
//! chat. Every mutation is written through to disk; write failures are
//! logged rather than surfaced, since history is best-effort local state.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::artifact::Artifact;
use crate::models::chat::{title_from_message, Chat, ChatMessage};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{chat_history_path, ensure_parent};
use streamchat_llm::TurnRole;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatHistory {
    chats: Vec<Chat>,
    #[serde(default)]
    current_chat_id: Option<String>,
}

/// JSON-file-backed chat history
#[derive(Debug)]
pub struct ChatStore {
    path: Option<PathBuf>,
    chats: Vec<Chat>,
    current_chat_id: String,
}

impl ChatStore {
    /// Open the history at the default location
    pub fn new() -> AppResult<Self> {
        Ok(Self::open(chat_history_path()?))
    }

    /// Open the history at `path`. A missing, corrupt or empty document
    /// starts over with a single fresh chat.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let history = Self::load(&path);
        let mut store = Self::from_history(history);
        store.path = Some(path);
        store
    }

    /// A store that never touches disk
    pub fn in_memory() -> Self {
        Self::from_history(None)
    }

    fn load(path: &Path) -> Option<ChatHistory> {
        let content = fs::read_to_string(path).ok()?;
        match serde_json::from_str::<ChatHistory>(&content) {
            Ok(history) => Some(history),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "chat history unreadable, starting fresh");
                None
            }
        }
    }

    fn from_history(history: Option<ChatHistory>) -> Self {
        let (mut chats, current) = match history {
            Some(h) => (h.chats, h.current_chat_id),
            None => (Vec::new(), None),
        };
        if chats.is_empty() {
            chats.push(Chat::new());
        }
        let current_chat_id = current
            .filter(|id| chats.iter().any(|c| &c.id == id))
            .unwrap_or_else(|| chats[0].id.clone());

        Self {
            path: None,
            chats,
            current_chat_id,
        }
    }

    fn persist(&self) {
        let Some(path) = &self.path else { return };
        if let Err(e) = self.write_to(path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to save chat history");
        }
    }

    fn write_to(&self, path: &Path) -> AppResult<()> {
        ensure_parent(path)?;
        let history = ChatHistory {
            chats: self.chats.clone(),
            current_chat_id: Some(self.current_chat_id.clone()),
        };
        fs::write(path, serde_json::to_string_pretty(&history)?)?;
        Ok(())
    }

    pub fn chats(&self) -> &[Chat] {
        &self.chats
    }

    pub fn current_chat_id(&self) -> &str {
        &self.current_chat_id
    }

    pub fn current(&self) -> &Chat {
        self.chats
            .iter()
            .find(|c| c.id == self.current_chat_id)
            .unwrap_or(&self.chats[0])
    }

    fn current_mut(&mut self) -> &mut Chat {
        let idx = self
            .chats
            .iter()
            .position(|c| c.id == self.current_chat_id)
            .unwrap_or(0);
        &mut self.chats[idx]
    }

    /// Start a new chat at the top of the list and switch to it
    pub fn create_chat(&mut self) -> &Chat {
        let chat = Chat::new();
        self.current_chat_id = chat.id.clone();
        self.chats.insert(0, chat);
        self.persist();
        &self.chats[0]
    }

    pub fn switch_to(&mut self, id: &str) -> AppResult<()> {
        if !self.chats.iter().any(|c| c.id == id) {
            return Err(AppError::not_found(format!("chat {}", id)));
        }
        self.current_chat_id = id.to_string();
        self.persist();
        Ok(())
    }

    /// Delete a chat. Deleting the last chat replaces it with a fresh one;
    /// deleting the current chat switches to the first remaining.
    pub fn delete_chat(&mut self, id: &str) -> AppResult<()> {
        let before = self.chats.len();
        self.chats.retain(|c| c.id != id);
        if self.chats.len() == before {
            return Err(AppError::not_found(format!("chat {}", id)));
        }

        if self.chats.is_empty() {
            self.chats.push(Chat::new());
        }
        if self.current_chat_id == id {
            self.current_chat_id = self.chats[0].id.clone();
        }
        self.persist();
        Ok(())
    }

    /// Append a message to the current chat. The first user message of an
    /// empty chat becomes its title.
    pub fn add_message(&mut self, message: ChatMessage) {
        let chat = self.current_mut();
        if message.role == TurnRole::User && chat.messages.is_empty() {
            chat.title = title_from_message(&message.content);
        }
        chat.messages.push(message);
        chat.touch();
        self.persist();
    }

    /// Add an artifact to the current chat, newest first. Returns its id.
    pub fn add_artifact(&mut self, artifact: Artifact) -> String {
        let id = artifact.id.clone();
        let chat = self.current_mut();
        chat.artifacts.insert(0, artifact);
        chat.touch();
        self.persist();
        id
    }

    pub fn update_artifact_content(&mut self, id: &str, content: &str) -> AppResult<()> {
        let chat = self.current_mut();
        let artifact = chat
            .artifacts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| AppError::not_found(format!("artifact {}", id)))?;
        artifact.content = content.to_string();
        chat.touch();
        self.persist();
        Ok(())
    }

    pub fn get_artifact(&self, id: &str) -> Option<&Artifact> {
        self.current().artifacts.iter().find(|a| a.id == id)
    }

    /// Remove all messages and artifacts from the current chat
    pub fn clear_current(&mut self) {
        let chat = self.current_mut();
        chat.messages.clear();
        chat.artifacts.clear();
        chat.touch();
        self.persist();
    }
}

//! Artifact Models
//!
//! Renderable code blocks (HTML, React, SVG) lifted out of assistant
//! responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of renderable block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Html,
    React,
    Svg,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Html => "html",
            ArtifactKind::React => "react",
            ArtifactKind::Svg => "svg",
        }
    }

    /// Source language of the block
    pub fn language(&self) -> &'static str {
        match self {
            ArtifactKind::Html => "html",
            ArtifactKind::React => "jsx",
            ArtifactKind::Svg => "svg",
        }
    }

    /// Default title shown for the block
    pub fn title(&self) -> &'static str {
        match self {
            ArtifactKind::Html => "HTML Preview",
            ArtifactKind::React => "React Component",
            ArtifactKind::Svg => "SVG Graphics",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An extracted artifact. Only `content` changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    pub language: String,
    pub content: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    /// Create an artifact with a fresh id and the kind's default title.
    pub fn new(kind: ArtifactKind, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            language: kind.language().to_string(),
            content: content.into(),
            title: kind.title().to_string(),
            created_at: Utc::now(),
        }
    }
}

//! Artifact Extraction
//!
//! Pulls the first renderable fenced block (HTML, then JSX/React, then SVG)
//! out of a completed answer and replaces it with a placeholder that
//! references the new artifact.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::artifact::{Artifact, ArtifactKind};

/// Compiled fence pattern for one artifact kind.
struct FencePattern {
    kind: ArtifactKind,
    regex: Regex,
}

/// Fence patterns in priority order (initialized once).
fn fence_patterns() -> &'static Vec<FencePattern> {
    static PATTERNS: OnceLock<Vec<FencePattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (ArtifactKind::Html, r"(?s)```html\r?\n(.*?)```"),
            (ArtifactKind::React, r"(?s)```(?:jsx|react)\r?\n(.*?)```"),
            (ArtifactKind::Svg, r"(?s)```svg\r?\n(.*?)```"),
        ]
        .into_iter()
        .filter_map(|(kind, pattern)| {
            Regex::new(pattern)
                .ok()
                .map(|regex| FencePattern { kind, regex })
        })
        .collect()
    })
}

/// Answer text prepared for display plus the artifact lifted out of it
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub display_text: String,
    pub artifact: Option<Artifact>,
}

/// Placeholder left in the transcript where an artifact's block was.
pub fn placeholder(artifact: &Artifact) -> String {
    format!(
        "\n\n:::artifact{{id=\"{}\" title=\"{}\" type=\"{}\"}}\n\n",
        artifact.id, artifact.title, artifact.kind
    )
}

/// Find the first block of the highest-priority kind present.
fn find_block(answer: &str) -> Option<(ArtifactKind, std::ops::Range<usize>, String)> {
    fence_patterns().iter().find_map(|pattern| {
        let caps = pattern.regex.captures(answer)?;
        let whole = caps.get(0)?;
        let body = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        Some((pattern.kind, whole.range(), body.to_string()))
    })
}

/// Extract at most one artifact from a completed answer.
pub fn extract_artifact(answer: &str) -> Option<Artifact> {
    find_block(answer).map(|(kind, _, body)| Artifact::new(kind, body))
}

/// Extract an artifact and replace its block with a placeholder.
pub fn extract_with_placeholder(answer: &str) -> Extraction {
    match find_block(answer) {
        Some((kind, range, body)) => {
            let artifact = Artifact::new(kind, body);
            let mut display_text = String::with_capacity(answer.len());
            display_text.push_str(&answer[..range.start]);
            display_text.push_str(&placeholder(&artifact));
            display_text.push_str(&answer[range.end..]);
            Extraction {
                display_text,
                artifact: Some(artifact),
            }
        }
        None => Extraction {
            display_text: answer.to_string(),
            artifact: None,
        },
    }
}

//! Scene segments extracted from a scene plan.

use serde::{Deserialize, Serialize};

/// One scene's planning text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSegment {
    ordinal: usize,
    text: String,
}

impl SceneSegment {
    /// Create a segment; `ordinal` is 1-based.
    pub fn new(ordinal: usize, text: impl Into<String>) -> Self {
        Self {
            ordinal,
            text: text.into(),
        }
    }

    /// 1-based position in the plan.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Raw text block, starting with its marker line.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The marker line that opened this segment.
    pub fn heading(&self) -> &str {
        self.text.lines().next().unwrap_or_default().trim()
    }
}

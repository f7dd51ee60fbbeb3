//! Operator-authored story templates.

use serde::{Deserialize, Serialize};

/// An operator-authored story template, loaded read-only per run.
///
/// # Examples
///
/// ```
/// use saga_core::Blueprint;
///
/// let blueprint = Blueprint::new("harbor", "Title: The Harbor Light\nA keeper's last winter.");
/// assert_eq!(blueprint.title(), "The Harbor Light");
/// assert_eq!(blueprint.id(), "harbor");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blueprint {
    id: String,
    text: String,
}

impl Blueprint {
    /// Create a blueprint from its identifier and raw text.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Identifier used to name the artifact directory.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Raw template text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Story title.
    ///
    /// Taken from the first `Title:` line when present, otherwise the identifier.
    pub fn title(&self) -> &str {
        self.text
            .lines()
            .map(str::trim)
            .find_map(|line| {
                let (label, rest) = line.split_once(':')?;
                label.eq_ignore_ascii_case("title").then_some(rest.trim())
            })
            .filter(|title| !title.is_empty())
            .unwrap_or(self.id.as_str())
    }

    /// Same blueprint with its text replaced, e.g. after preprocessing.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            id: self.id.clone(),
            text: text.into(),
        }
    }

    /// Whether the text is empty or whitespace-only.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_falls_back_to_id() {
        let blueprint = Blueprint::new("quiet-town", "A story about a quiet town.");
        assert_eq!(blueprint.title(), "quiet-town");
    }

    #[test]
    fn title_is_case_insensitive() {
        let blueprint = Blueprint::new("x", "  TITLE:  Embers  \nbody");
        assert_eq!(blueprint.title(), "Embers");
    }

    #[test]
    fn empty_title_falls_back_to_id() {
        let blueprint = Blueprint::new("x", "Title:\nbody");
        assert_eq!(blueprint.title(), "x");
    }
}

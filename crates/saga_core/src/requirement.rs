//! Mandatory story constraints and their advisory check results.

use serde::{Deserialize, Serialize};

/// Words too common to signal whether a requirement made it into a plan.
const STOP_WORDS: &[&str] = &[
    "about", "after", "also", "been", "before", "being", "could", "does", "from", "have", "into",
    "just", "like", "made", "make", "must", "only", "over", "should", "some", "such", "than",
    "that", "their", "them", "then", "there", "these", "they", "this", "those", "through", "very",
    "were", "what", "when", "where", "which", "while", "will", "with", "would", "your",
];

/// One mandatory constraint supplied by the operator.
///
/// # Examples
///
/// ```
/// use saga_core::RequirementSpec;
///
/// let spec = RequirementSpec::new("The lighthouse must burn down before winter.");
/// assert_eq!(spec.tokens(), ["lighthouse", "burn", "down", "winter"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementSpec {
    text: String,
    tokens: Vec<String>,
}

impl RequirementSpec {
    /// Create a requirement and derive its salient tokens.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let tokens = salient_tokens(&text);
        Self { text, tokens }
    }

    /// Original requirement text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lowercased tokens longer than three characters, stop words removed.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

fn salient_tokens(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for raw in text.split_whitespace() {
        let token = raw
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if token.chars().count() <= 3 || STOP_WORDS.contains(&token.as_str()) {
            continue;
        }
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

/// Result of checking one requirement against a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementCheck {
    /// Requirement text
    pub requirement: String,
    /// Tokens present in the plan
    pub found: Vec<String>,
    /// Tokens absent from the plan
    pub missing: Vec<String>,
}

impl RequirementCheck {
    /// Whether every salient token was found.
    pub fn is_satisfied(&self) -> bool {
        self.missing.is_empty()
    }
}

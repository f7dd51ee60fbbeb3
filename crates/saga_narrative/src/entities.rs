//! Running summary of named entities introduced by earlier scenes.

/// Upper bound on remembered names; later names are ignored.
const MAX_ENTITIES: usize = 60;

/// Capitalized words that are not names on their own.
const NOT_NAMES: &[&str] = &[
    "a", "after", "all", "an", "and", "as", "at", "before", "but", "by", "chapter", "each", "for",
    "from", "he", "her", "his", "i", "if", "in", "it", "its", "later", "meanwhile", "my", "no",
    "not", "now", "of", "oh", "on", "one", "or", "our", "scene", "she", "so", "that", "the",
    "their", "then", "there", "they", "this", "to", "we", "what", "when", "where", "while", "who",
    "why", "with", "yes", "you", "act",
];

/// A name and the scene that introduced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityEntry {
    /// Name as written
    pub name: String,
    /// 1-based scene of first appearance
    pub first_scene: usize,
}

/// Tracks proper names across scenes so later scenes stay consistent.
///
/// Runs of capitalized words form a name ("Captain Holt"). A capitalized word
/// opening a sentence only counts once the same name has been seen mid-sentence
/// or when it belongs to a multi-word run, which keeps ordinary sentence
/// openers out.
///
/// # Examples
///
/// ```
/// use saga_narrative::EntityLedger;
///
/// let mut ledger = EntityLedger::new();
/// ledger.observe(1, "Rain fell on Port Vell. Mara waited for Captain Holt.");
/// ledger.observe(2, "Mara lit the lamp.");
///
/// assert_eq!(ledger.summary(), "Port Vell (scene 1), Captain Holt (scene 1)");
/// ```
#[derive(Debug, Clone, Default)]
pub struct EntityLedger {
    entries: Vec<EntityEntry>,
}

impl EntityLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names seen so far, in order of first appearance.
    pub fn entries(&self) -> &[EntityEntry] {
        &self.entries
    }

    /// Number of names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no name has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `name` is already recorded.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Record the names appearing in a scene.
    pub fn observe(&mut self, scene: usize, text: &str) {
        let before = self.entries.len();
        for candidate in candidates(text) {
            let admitted = !candidate.sentence_start
                || candidate.words > 1
                || self.contains(&candidate.name);
            if admitted && !self.contains(&candidate.name) {
                if self.entries.len() >= MAX_ENTITIES {
                    break;
                }
                self.entries.push(EntityEntry {
                    name: candidate.name,
                    first_scene: scene,
                });
            }
        }
        tracing::debug!(
            scene,
            new_entities = self.entries.len() - before,
            total = self.entries.len(),
            "Updated entity ledger"
        );
    }

    /// One-line listing, empty when nothing has been recorded.
    pub fn summary(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{} (scene {})", e.name, e.first_scene))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

struct Candidate {
    name: String,
    words: usize,
    sentence_start: bool,
}

fn is_capitalized(word: &str) -> bool {
    let mut chars = word.chars();
    chars.next().is_some_and(char::is_uppercase)
        && chars.clone().next().is_some()
        && chars.any(char::is_lowercase)
}

fn candidates(text: &str) -> Vec<Candidate> {
    let mut found = Vec::new();
    let mut run: Vec<&str> = Vec::new();
    let mut run_starts_sentence = false;
    let mut at_sentence_start = true;

    let mut close_run = |run: &mut Vec<&str>, sentence_start: bool| {
        while run
            .first()
            .is_some_and(|w| NOT_NAMES.contains(&w.to_lowercase().as_str()))
        {
            run.remove(0);
        }
        if !run.is_empty() {
            found.push(Candidate {
                name: run.join(" "),
                words: run.len(),
                sentence_start,
            });
        }
        run.clear();
    };

    for raw in text.split_whitespace() {
        let word = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'');
        let word = word.strip_suffix("'s").unwrap_or(word);
        let ends_sentence = raw.ends_with(['.', '!', '?', ':', ';', '"']);
        let breaks_run = ends_sentence || raw.ends_with(',');

        if is_capitalized(word) {
            if run.is_empty() {
                run_starts_sentence = at_sentence_start;
            }
            run.push(word);
            if breaks_run {
                close_run(&mut run, run_starts_sentence);
            }
        } else {
            close_run(&mut run, run_starts_sentence);
        }
        at_sentence_start = ends_sentence;
    }
    close_run(&mut run, run_starts_sentence);
    found
}

//! Heuristic scene-boundary detection over free-form planning text.

use saga_core::SceneSegment;

/// Formatting family a scene marker belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum MarkerDialect {
    /// `Scene 1: ...`
    #[display("plain")]
    Plain,
    /// `**Scene 1**`, `__Scene 1__`
    #[display("emphasis")]
    Emphasis,
    /// `# Scene 1` through `#### Scene 1`
    #[display("heading")]
    Heading,
    /// `Act 1`
    #[display("act")]
    Act,
}

/// One recognized line prefix, matched against the trimmed, lowercased line.
///
/// The prefix must be followed directly by an ASCII digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneMarker {
    /// Formatting family
    pub dialect: MarkerDialect,
    /// Lowercase literal prefix, including its trailing space
    pub prefix: &'static str,
}

/// Every line prefix that opens a new scene.
pub const SCENE_MARKERS: &[SceneMarker] = &[
    SceneMarker { dialect: MarkerDialect::Plain, prefix: "scene " },
    SceneMarker { dialect: MarkerDialect::Emphasis, prefix: "**scene " },
    SceneMarker { dialect: MarkerDialect::Emphasis, prefix: "__scene " },
    SceneMarker { dialect: MarkerDialect::Heading, prefix: "# scene " },
    SceneMarker { dialect: MarkerDialect::Heading, prefix: "## scene " },
    SceneMarker { dialect: MarkerDialect::Heading, prefix: "### scene " },
    SceneMarker { dialect: MarkerDialect::Heading, prefix: "#### scene " },
    SceneMarker { dialect: MarkerDialect::Act, prefix: "act " },
];

/// Marker opening `line`, if any.
///
/// # Examples
///
/// ```
/// use saga_narrative::{MarkerDialect, match_marker};
///
/// assert_eq!(match_marker("## Scene 2 - The Storm").map(|m| m.dialect), Some(MarkerDialect::Heading));
/// assert!(match_marker("Scene changes are quick").is_none());
/// assert!(match_marker("Action follows").is_none());
/// ```
pub fn match_marker(line: &str) -> Option<&'static SceneMarker> {
    let lowered = line.trim().to_lowercase();
    SCENE_MARKERS.iter().find(|marker| {
        lowered
            .strip_prefix(marker.prefix)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_ascii_digit())
    })
}

/// Split a scene plan into ordered scene segments.
///
/// Each marker line opens a segment; following lines, blank ones included, are
/// appended verbatim with their own line endings until the next marker. Text
/// before the first marker is dropped. Concatenating the segment texts
/// reproduces the plan byte for byte from the first marker line onward. A plan
/// without markers yields no segments.
///
/// # Examples
///
/// ```
/// use saga_narrative::parse_scene_plan;
///
/// let plan = "Overview of the arc.\n\nScene 1: Arrival\nMara lands.\n\nScene 2: Storm\nThe lamp fails.";
/// let scenes = parse_scene_plan(plan);
///
/// assert_eq!(scenes.len(), 2);
/// assert_eq!(scenes[0].heading(), "Scene 1: Arrival");
/// assert_eq!(scenes[0].text(), "Scene 1: Arrival\nMara lands.\n\n");
/// assert_eq!(scenes[1].text(), "Scene 2: Storm\nThe lamp fails.");
/// ```
pub fn parse_scene_plan(plan_text: &str) -> Vec<SceneSegment> {
    let mut segments = Vec::new();
    let mut open: Option<String> = None;

    for line in plan_text.split_inclusive('\n') {
        if match_marker(line).is_some() {
            flush(&mut segments, open.take());
            open = Some(line.to_string());
        } else if let Some(text) = open.as_mut() {
            text.push_str(line);
        }
    }
    flush(&mut segments, open);

    tracing::debug!(segments = segments.len(), "Parsed scene plan");
    segments
}

fn flush(segments: &mut Vec<SceneSegment>, text: Option<String>) {
    let Some(text) = text else {
        return;
    };
    if text.trim().is_empty() {
        return;
    }
    segments.push(SceneSegment::new(segments.len() + 1, text));
}

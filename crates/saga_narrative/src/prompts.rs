//! User-prompt assembly: an opaque instruction followed by labeled context blocks.

use saga_core::{Blueprint, SceneSegment};

fn compose(instruction: &str, blocks: &[(&str, &str)]) -> String {
    let mut prompt = instruction.trim().to_string();
    for (title, body) in blocks {
        if !prompt.is_empty() {
            prompt.push_str("\n\n");
        }
        prompt.push_str("## ");
        prompt.push_str(title);
        prompt.push('\n');
        prompt.push_str(body.trim());
    }
    prompt
}

pub(crate) fn preprocess(instruction: &str, blueprint: &Blueprint) -> String {
    compose(instruction, &[("Blueprint", blueprint.text())])
}

pub(crate) fn bible(instruction: &str, blueprint: &Blueprint) -> String {
    compose(instruction, &[("Blueprint", blueprint.text())])
}

pub(crate) fn plan(instruction: &str, blueprint: &Blueprint, bible: &str) -> String {
    compose(
        instruction,
        &[("Blueprint", blueprint.text()), ("Story bible", bible)],
    )
}

pub(crate) fn scene(
    instruction: &str,
    bible: &str,
    plan: &str,
    segment: &SceneSegment,
    scene_count: usize,
    entities: &str,
) -> String {
    let entities = if entities.is_empty() {
        "None yet."
    } else {
        entities
    };
    let heading = format!("Scene {} of {}", segment.ordinal(), scene_count);
    compose(
        instruction,
        &[
            ("Story bible", bible),
            ("Scene plan", plan),
            ("Named so far", entities),
            (heading.as_str(), segment.text()),
        ],
    )
}

pub(crate) fn improvement(instruction: &str, base_text: &str) -> String {
    compose(instruction, &[("Text", base_text)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_follow_instruction() {
        let prompt = improvement("Fix typos.", "  teh cat\n");
        assert_eq!(prompt, "Fix typos.\n\n## Text\nteh cat");
    }

    #[test]
    fn scene_prompt_carries_every_context_block() {
        let segment = SceneSegment::new(2, "Scene 2: Storm\nThe lamp fails.");
        let prompt = scene("Write it.", "BIBLE", "PLAN", &segment, 5, "");
        assert!(prompt.contains("## Story bible\nBIBLE"));
        assert!(prompt.contains("## Scene plan\nPLAN"));
        assert!(prompt.contains("## Named so far\nNone yet."));
        assert!(prompt.ends_with("## Scene 2 of 5\nScene 2: Storm\nThe lamp fails."));
    }

    #[test]
    fn empty_instruction_starts_with_first_block() {
        let blueprint = Blueprint::new("b", "text");
        assert_eq!(bible("", &blueprint), "## Blueprint\ntext");
    }
}

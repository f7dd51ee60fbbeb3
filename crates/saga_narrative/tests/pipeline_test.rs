//! End-to-end tests for the story pipeline against a scripted generator.

mod test_utils;

use saga_core::{
    Blueprint, PipelineConfig, PreprocessConfig, ReuseMode, STORY_RULE,
};
use saga_error::{GenerationErrorKind, NarrativeErrorKind, SagaError, SagaErrorKind};
use saga_interface::CancelToken;
use saga_narrative::{PipelineStage, RunOutcome, StoryPipeline};
use std::path::Path;
use tempfile::TempDir;
use test_utils::{MockGenerator, MockResponse};

const PLAN: &str = "Overview: five beats.\n\
                    \n\
                    Scene 1: The Keeper\n\
                    Mara trims the wick.\n\
                    \n\
                    Scene 2: The Storm\n\
                    Waves climb the rocks.\n\
                    \n\
                    Scene 3: The Ship\n\
                    A hull breaks.\n\
                    \n\
                    Scene 4: The Rescue\n\
                    Ropes and lanterns.\n\
                    \n\
                    Scene 5: Dawn\n\
                    The light goes out.\n";

fn blueprint() -> Blueprint {
    let body = "A keeper guards the last lamp on a drowned coast. ".repeat(10);
    let text = format!("Title: The Last Lamp\n{body}");
    assert!(text.chars().count() >= 500);
    Blueprint::new("last-lamp", text)
}

fn scripted() -> MockGenerator {
    MockGenerator::new()
        .text("bible", "Mara: keeper. Setting: a drowned coast.")
        .text("plan", PLAN)
}

fn config(dir: &Path, reuse: ReuseMode) -> PipelineConfig {
    PipelineConfig::builder()
        .output_dir(dir)
        .reuse(reuse)
        .build()
        .unwrap()
}

fn narrative_kind(err: &SagaError) -> &NarrativeErrorKind {
    match err.kind() {
        SagaErrorKind::Narrative(e) => &e.kind,
        other => panic!("expected narrative error, got {other}"),
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn five_scene_plan_produces_ordered_story_and_metadata() {
    let temp = TempDir::new().unwrap();
    let pipeline = StoryPipeline::new(scripted(), config(temp.path(), ReuseMode::Regenerate)).unwrap();

    let report = pipeline.run(&blueprint(), &CancelToken::new()).await.unwrap();

    let generator = pipeline.generator();
    assert_eq!(
        generator.labels(),
        ["bible", "plan", "scene 1", "scene 2", "scene 3", "scene 4", "scene 5"]
    );
    assert_eq!(*report.stage(), PipelineStage::Terminal(RunOutcome::Success));
    assert_eq!(report.metadata().entry_count(), 5);

    let story = read(report.story_path());
    assert!(story.starts_with("The Last Lamp\n\nScene 1\n\nOutput for scene 1."));
    assert_eq!(story.matches(STORY_RULE).count(), 4);
    let positions: Vec<usize> = (1..=5)
        .map(|n| story.find(&format!("Scene {n}\n\nOutput for scene {n}.")).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));

    let metadata = read(report.metadata_path());
    for n in 1..=5 {
        assert!(metadata.contains(&format!("--- Scene {n}: Scene {n}:")));
    }
    assert!(report.story_path().ends_with("last-lamp/story.txt"));
    assert!(temp.path().join("last-lamp/bible.txt").exists());
    assert!(temp.path().join("last-lamp/plan.txt").exists());
}

#[tokio::test]
async fn phase_ceilings_follow_the_budget() {
    let temp = TempDir::new().unwrap();
    let pipeline = StoryPipeline::new(scripted(), config(temp.path(), ReuseMode::Regenerate)).unwrap();

    pipeline.run(&blueprint(), &CancelToken::new()).await.unwrap();

    let generator = pipeline.generator();
    assert_eq!(*generator.call("bible").unwrap().num_predict(), 4000);
    assert_eq!(*generator.call("plan").unwrap().num_predict(), 3000);
    // 16000 / 5 scenes
    assert_eq!(*generator.call("scene 3").unwrap().num_predict(), 3200);
}

#[tokio::test]
async fn scene_prompts_carry_bible_plan_and_segment() {
    let temp = TempDir::new().unwrap();
    let generator = scripted().text("scene 1", "The boat carried Mara home to Port Vell.");
    let pipeline = StoryPipeline::new(generator, config(temp.path(), ReuseMode::Regenerate)).unwrap();

    pipeline.run(&blueprint(), &CancelToken::new()).await.unwrap();

    let scene_two = pipeline.generator().call("scene 2").unwrap();
    let user = scene_two.user();
    assert!(user.contains("Setting: a drowned coast."));
    assert!(user.contains("Scene 5: Dawn"));
    assert!(user.contains("## Scene 2 of 5\nScene 2: The Storm\nWaves climb the rocks."));
    assert!(user.contains("Mara (scene 1), Port Vell (scene 1)"));

    let scene_one = pipeline.generator().call("scene 1").unwrap();
    assert!(scene_one.user().contains("## Named so far\nNone yet."));
}

#[tokio::test]
async fn reuse_both_skips_bible_and_plan_and_keeps_their_bytes() {
    let temp = TempDir::new().unwrap();
    let first = StoryPipeline::new(scripted(), config(temp.path(), ReuseMode::Regenerate)).unwrap();
    first.run(&blueprint(), &CancelToken::new()).await.unwrap();

    let bible_path = temp.path().join("last-lamp/bible.txt");
    let plan_path = temp.path().join("last-lamp/plan.txt");
    let bible_before = read(&bible_path);
    let plan_before = read(&plan_path);

    let second = StoryPipeline::new(
        MockGenerator::new().text("bible", "SHOULD NOT BE USED"),
        config(temp.path(), ReuseMode::ReuseBoth),
    )
    .unwrap();
    let report = second.run(&blueprint(), &CancelToken::new()).await.unwrap();

    assert_eq!(second.generator().count("bible"), 0);
    assert_eq!(second.generator().count("plan"), 0);
    assert_eq!(second.generator().count("scene"), 5);
    assert_eq!(read(&bible_path), bible_before);
    assert_eq!(read(&plan_path), plan_before);
    assert!(!temp.path().join("last-lamp/bible_v2.txt").exists());
    assert!(report.metadata().bible.is_reused());
    assert!(report.metadata().plan.is_reused());
    assert!(report.story_path().ends_with("last-lamp/story_v2.txt"));
}

#[tokio::test]
async fn regenerate_never_overwrites_earlier_artifacts() {
    let temp = TempDir::new().unwrap();
    let first = StoryPipeline::new(scripted(), config(temp.path(), ReuseMode::Regenerate)).unwrap();
    first.run(&blueprint(), &CancelToken::new()).await.unwrap();
    let bible_before = read(&temp.path().join("last-lamp/bible.txt"));

    let second = StoryPipeline::new(
        scripted().text("bible", "A different bible."),
        config(temp.path(), ReuseMode::Regenerate),
    )
    .unwrap();
    second.run(&blueprint(), &CancelToken::new()).await.unwrap();

    assert_eq!(read(&temp.path().join("last-lamp/bible.txt")), bible_before);
    assert_eq!(
        read(&temp.path().join("last-lamp/bible_v2.txt")),
        "A different bible."
    );
    assert!(temp.path().join("last-lamp/plan_v2.txt").exists());
    assert!(temp.path().join("last-lamp/metadata_v2.txt").exists());
}

#[tokio::test]
async fn reuse_bible_regenerates_the_plan_from_the_loaded_bible() {
    let temp = TempDir::new().unwrap();
    let first = StoryPipeline::new(scripted(), config(temp.path(), ReuseMode::Regenerate)).unwrap();
    first.run(&blueprint(), &CancelToken::new()).await.unwrap();

    let second = StoryPipeline::new(scripted(), config(temp.path(), ReuseMode::ReuseBible)).unwrap();
    second.run(&blueprint(), &CancelToken::new()).await.unwrap();

    assert_eq!(second.generator().count("bible"), 0);
    let plan_request = second.generator().call("plan").unwrap();
    assert!(plan_request.user().contains("Mara: keeper."));
    assert!(temp.path().join("last-lamp/plan_v2.txt").exists());
}

#[tokio::test]
async fn reuse_without_existing_files_generates() {
    let temp = TempDir::new().unwrap();
    let pipeline = StoryPipeline::new(scripted(), config(temp.path(), ReuseMode::ReuseBoth)).unwrap();

    let report = pipeline.run(&blueprint(), &CancelToken::new()).await.unwrap();

    assert_eq!(pipeline.generator().count("bible"), 1);
    assert!(!report.metadata().bible.is_reused());
}

#[tokio::test]
async fn plan_without_markers_aborts_before_scenes() {
    let temp = TempDir::new().unwrap();
    let generator = scripted().text("plan", "Everything happens at once, in one long breath.");
    let pipeline = StoryPipeline::new(generator, config(temp.path(), ReuseMode::Regenerate)).unwrap();

    let err = pipeline.run(&blueprint(), &CancelToken::new()).await.unwrap_err();

    assert_eq!(*narrative_kind(&err), NarrativeErrorKind::NoScenesExtracted);
    assert_eq!(pipeline.generator().count("scene"), 0);
    assert!(temp.path().join("last-lamp/plan.txt").exists());
    assert!(!temp.path().join("last-lamp/story.txt").exists());
    assert!(!temp.path().join("last-lamp/metadata.txt").exists());
}

#[tokio::test]
async fn failing_scene_aborts_run_without_story() {
    let temp = TempDir::new().unwrap();
    let generator = scripted().respond(
        "scene 3",
        MockResponse::Error(GenerationErrorKind::Transport("connection reset".to_string())),
    );
    let pipeline = StoryPipeline::new(generator, config(temp.path(), ReuseMode::Regenerate)).unwrap();

    let err = pipeline.run(&blueprint(), &CancelToken::new()).await.unwrap_err();

    match narrative_kind(&err) {
        NarrativeErrorKind::PhaseFailed { phase, message } => {
            assert_eq!(phase, "scene 3");
            assert!(message.contains("connection reset"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(pipeline.generator().count("scene 4"), 0);
    assert!(!temp.path().join("last-lamp/story.txt").exists());
}

#[tokio::test]
async fn empty_scene_aborts_run() {
    let temp = TempDir::new().unwrap();
    let generator = scripted().text("scene 2", " \n\t ");
    let pipeline = StoryPipeline::new(generator, config(temp.path(), ReuseMode::Regenerate)).unwrap();

    let err = pipeline.run(&blueprint(), &CancelToken::new()).await.unwrap_err();

    assert!(matches!(
        narrative_kind(&err),
        NarrativeErrorKind::PhaseFailed { phase, .. } if phase == "scene 2"
    ));
    assert!(!temp.path().join("last-lamp/story.txt").exists());
}

#[tokio::test]
async fn blank_blueprint_is_rejected_without_calls() {
    let temp = TempDir::new().unwrap();
    let pipeline = StoryPipeline::new(scripted(), config(temp.path(), ReuseMode::Regenerate)).unwrap();

    let err = pipeline
        .run(&Blueprint::new("blank", "  \n"), &CancelToken::new())
        .await
        .unwrap_err();

    assert!(matches!(narrative_kind(&err), NarrativeErrorKind::EmptyBlueprint(_)));
    assert!(pipeline.generator().calls().is_empty());
}

#[tokio::test]
async fn failed_preprocessing_falls_back_to_original_blueprint() {
    let temp = TempDir::new().unwrap();
    let config = PipelineConfig::builder()
        .output_dir(temp.path())
        .preprocess(Some(PreprocessConfig::new("Rename the keeper to Ilse.")))
        .build()
        .unwrap();
    let generator = scripted().respond(
        "preprocess",
        MockResponse::Error(GenerationErrorKind::Status {
            status: 500,
            body: "overloaded".to_string(),
        }),
    );
    let pipeline = StoryPipeline::new(generator, config).unwrap();

    let report = pipeline.run(&blueprint(), &CancelToken::new()).await.unwrap();

    let note = report.metadata().preprocess_note.clone().unwrap();
    assert!(note.contains("original blueprint used"));
    let bible_request = pipeline.generator().call("bible").unwrap();
    assert!(bible_request.user().contains("A keeper guards the last lamp"));
}

#[tokio::test]
async fn successful_preprocessing_feeds_the_bible() {
    let temp = TempDir::new().unwrap();
    let config = PipelineConfig::builder()
        .output_dir(temp.path())
        .preprocess(Some(PreprocessConfig::new("Rename the keeper to Ilse.")))
        .build()
        .unwrap();
    let generator = scripted().text("preprocess", "Title: The Last Lamp\nIlse guards the lamp.");
    let pipeline = StoryPipeline::new(generator, config).unwrap();

    let report = pipeline.run(&blueprint(), &CancelToken::new()).await.unwrap();

    assert_eq!(pipeline.generator().labels()[0], "preprocess");
    let bible_request = pipeline.generator().call("bible").unwrap();
    assert!(bible_request.user().contains("Ilse guards the lamp."));
    assert!(report.metadata().preprocess_note.as_deref().unwrap().starts_with("applied"));
}

#[tokio::test]
async fn reused_bible_and_plan_skip_preprocessing() {
    let temp = TempDir::new().unwrap();
    let first = StoryPipeline::new(scripted(), config(temp.path(), ReuseMode::Regenerate)).unwrap();
    first.run(&blueprint(), &CancelToken::new()).await.unwrap();

    let config = PipelineConfig::builder()
        .output_dir(temp.path())
        .reuse(ReuseMode::ReuseBoth)
        .preprocess(Some(PreprocessConfig::new("Rename the keeper to Ilse.")))
        .build()
        .unwrap();
    let second = StoryPipeline::new(scripted(), config).unwrap();
    let report = second.run(&blueprint(), &CancelToken::new()).await.unwrap();

    assert_eq!(second.generator().count("preprocess"), 0);
    assert!(second.generator().labels().iter().all(|l| l.starts_with("scene")));
    assert_eq!(
        report.metadata().preprocess_note.as_deref(),
        Some("skipped, bible and plan reused")
    );
}

#[tokio::test]
async fn reused_bible_with_fresh_plan_still_preprocesses() {
    let temp = TempDir::new().unwrap();
    let first = StoryPipeline::new(scripted(), config(temp.path(), ReuseMode::Regenerate)).unwrap();
    first.run(&blueprint(), &CancelToken::new()).await.unwrap();

    let config = PipelineConfig::builder()
        .output_dir(temp.path())
        .reuse(ReuseMode::ReuseBible)
        .preprocess(Some(PreprocessConfig::new("Rename the keeper to Ilse.")))
        .build()
        .unwrap();
    let second = StoryPipeline::new(scripted(), config).unwrap();
    second.run(&blueprint(), &CancelToken::new()).await.unwrap();

    assert_eq!(second.generator().labels()[..2], ["preprocess", "plan"]);
}

#[tokio::test]
async fn failed_metadata_write_leaves_no_story() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("last-lamp");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("metadata_v{}.txt", u32::MAX)), "taken").unwrap();
    let pipeline = StoryPipeline::new(scripted(), config(temp.path(), ReuseMode::Regenerate)).unwrap();

    let err = pipeline.run(&blueprint(), &CancelToken::new()).await.unwrap_err();

    assert!(matches!(
        narrative_kind(&err),
        NarrativeErrorKind::PhaseFailed { phase, .. } if phase == "persist"
    ));
    assert_eq!(pipeline.generator().count("scene"), 5);
    assert!(!dir.join("story.txt").exists());
}

#[tokio::test]
async fn unmet_requirements_are_advisory() {
    let temp = TempDir::new().unwrap();
    let config = config(temp.path(), ReuseMode::Regenerate)
        .with_requirements(vec!["The lighthouse must burn down".to_string()]);
    let pipeline = StoryPipeline::new(scripted(), config).unwrap();

    let report = pipeline.run(&blueprint(), &CancelToken::new()).await.unwrap();

    let checks = &report.metadata().requirements;
    assert_eq!(checks.len(), 1);
    assert!(!checks[0].is_satisfied());
    assert!(read(report.metadata_path()).contains("[incomplete] The lighthouse must burn down"));
}

#[tokio::test]
async fn cancellation_mid_run_persists_no_story() {
    let temp = TempDir::new().unwrap();
    let generator = scripted().respond("scene 2", MockResponse::Cancel);
    let pipeline = StoryPipeline::new(generator, config(temp.path(), ReuseMode::Regenerate)).unwrap();

    let err = pipeline.run(&blueprint(), &CancelToken::new()).await.unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(pipeline.generator().count("scene 3"), 0);
    assert!(!temp.path().join("last-lamp/story.txt").exists());
}

#[tokio::test]
async fn batch_continues_after_a_failed_run() {
    let temp = TempDir::new().unwrap();
    let pipeline = StoryPipeline::new(scripted(), config(temp.path(), ReuseMode::Regenerate)).unwrap();
    let blueprints = [Blueprint::new("blank", ""), blueprint()];

    let report = pipeline.run_batch(&blueprints, 2, &CancelToken::new()).await;

    assert_eq!(report.outcomes().len(), 4);
    assert_eq!(report.failed(), 2);
    assert_eq!(report.succeeded(), 2);
    assert!(!report.all_failed());
    assert!(!report.was_cancelled());
    assert!(temp.path().join("last-lamp/story.txt").exists());
    assert!(temp.path().join("last-lamp/story_v2.txt").exists());
}

#[tokio::test]
async fn batch_stops_when_cancelled() {
    let temp = TempDir::new().unwrap();
    let generator = scripted().respond("scene 1", MockResponse::Cancel);
    let pipeline = StoryPipeline::new(generator, config(temp.path(), ReuseMode::Regenerate)).unwrap();

    let report = pipeline
        .run_batch(&[blueprint(), blueprint()], 3, &CancelToken::new())
        .await;

    assert_eq!(report.outcomes().len(), 1);
    assert!(report.was_cancelled());
    assert!(report.all_failed());
}

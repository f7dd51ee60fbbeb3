//! Tests for versioned artifact and improvement persistence.

use saga_core::{ArtifactKind, ChainMode, ImprovementStep, StepBase, StepOutcome};
use saga_error::{SagaErrorKind, StorageErrorKind};
use saga_storage::{ArtifactStore, FileSystemImprovementSink, ImprovementSink};
use tempfile::TempDir;

#[tokio::test]
async fn missing_directory_lists_no_versions() {
    let temp = TempDir::new().unwrap();
    let store = ArtifactStore::new(temp.path());

    let versions = store
        .existing_versions("lighthouse", ArtifactKind::Bible)
        .await
        .unwrap();

    assert!(versions.versions().is_empty());
    assert_eq!(versions.next(), 1);
}

#[tokio::test]
async fn written_versions_are_listed_per_kind() {
    let temp = TempDir::new().unwrap();
    let store = ArtifactStore::new(temp.path());

    for _ in 0..3 {
        let versions = store
            .existing_versions("lighthouse", ArtifactKind::Bible)
            .await
            .unwrap();
        store
            .write_artifact(&versions.path(versions.next()), "bible")
            .await
            .unwrap();
    }
    let plan = store
        .existing_versions("lighthouse", ArtifactKind::Plan)
        .await
        .unwrap();
    store.write_artifact(&plan.path(1), "plan").await.unwrap();

    let bibles = store
        .existing_versions("lighthouse", ArtifactKind::Bible)
        .await
        .unwrap();
    assert_eq!(bibles.versions(), [1, 2, 3]);
    assert!(temp.path().join("lighthouse/bible_v3.txt").exists());

    let plans = store
        .existing_versions("lighthouse", ArtifactKind::Plan)
        .await
        .unwrap();
    assert_eq!(plans.versions(), [1]);
}

#[tokio::test]
async fn existing_file_is_never_overwritten() {
    let temp = TempDir::new().unwrap();
    let store = ArtifactStore::new(temp.path());
    let path = temp.path().join("lighthouse/story.txt");

    store.write_artifact(&path, "first").await.unwrap();
    let err = store.write_artifact(&path, "second").await.unwrap_err();

    match err.kind() {
        SagaErrorKind::Storage(e) => assert!(matches!(e.kind, StorageErrorKind::FileWrite(_))),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.read_artifact(&path).await.unwrap(), "first");
}

#[tokio::test]
async fn artifacts_read_back_verbatim() {
    let temp = TempDir::new().unwrap();
    let store = ArtifactStore::new(temp.path());
    let path = temp.path().join("x/plan.txt");
    let text = "Scene 1: Arrival\n\n  indented line\nScene 2: Storm\n";

    store.write_artifact(&path, text).await.unwrap();

    assert_eq!(store.read_artifact(&path).await.unwrap(), text);
}

fn step(index: usize, outcome: StepOutcome) -> ImprovementStep {
    ImprovementStep {
        index,
        instruction: format!("instruction {index}"),
        base: StepBase::Original,
        outcome,
        path: None,
    }
}

#[tokio::test]
async fn sink_writes_numbered_steps_and_summary() {
    let temp = TempDir::new().unwrap();
    let sink = FileSystemImprovementSink::create(temp.path(), "draft")
        .await
        .unwrap();

    let ok = step(
        1,
        StepOutcome::Succeeded {
            text: "Revised text.".to_string(),
            eval_count: 4,
            prompt_eval_count: 8,
            elapsed_secs: 0.5,
        },
    );
    let failed = step(
        2,
        StepOutcome::Failed {
            error: "boom".to_string(),
        },
    );

    let first = sink.persist_step(&ok).await.unwrap();
    let second = sink.persist_step(&failed).await.unwrap();
    let summary = sink
        .persist_summary(ChainMode::Original, &[ok, failed])
        .await
        .unwrap();

    assert_eq!(first, temp.path().join("improvements/draft/step_01.txt"));
    assert_eq!(second, temp.path().join("improvements/draft/step_02.txt"));
    assert!(std::fs::read_to_string(first).unwrap().ends_with("Revised text.\n"));
    assert!(std::fs::read_to_string(second).unwrap().contains("Error: boom"));
    assert!(std::fs::read_to_string(summary).unwrap().contains("1 succeeded, 1 failed"));
}

#[tokio::test]
async fn reused_chain_name_gets_a_fresh_directory() {
    let temp = TempDir::new().unwrap();
    let first = FileSystemImprovementSink::create(temp.path(), "draft")
        .await
        .unwrap();
    first
        .persist_step(&step(
            1,
            StepOutcome::Failed {
                error: "x".to_string(),
            },
        ))
        .await
        .unwrap();

    let second = FileSystemImprovementSink::create(temp.path(), "draft")
        .await
        .unwrap();

    assert_eq!(second.dir(), temp.path().join("improvements/draft_v2"));
}

//! Bible, plan and scene orchestration for one blueprint.

use crate::{
    EntityLedger, PipelineStage, RunOutcome, check_requirements, parse_scene_plan, prompts,
    resolve_artifact_path,
};
use chrono::Utc;
use derive_getters::Getters;
use saga_core::{
    ArtifactKind, ArtifactSource, Blueprint, GenerationRequest, GenerationResult, MetadataRecord,
    PipelineConfig, RequirementSpec, SceneRecord, StoryArtifact,
};
use saga_error::{
    BuilderError, GenerationError, GenerationErrorKind, NarrativeError, NarrativeErrorKind,
    SagaError, SagaResult,
};
use saga_interface::{CancelToken, TextGenerator};
use saga_storage::ArtifactStore;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Result of the optional blueprint preprocessing step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreprocessOutcome {
    /// No preprocessing configured
    Skipped,
    /// Configured, but the bible and plan are both reused so nothing reads it
    Unneeded,
    /// The transformed blueprint
    Applied(Blueprint),
    /// The call failed; the original blueprint is used
    Fallback {
        /// Why the transformation was abandoned
        reason: String,
    },
}

impl PreprocessOutcome {
    /// Line recorded in the run metadata.
    pub fn note(&self) -> Option<String> {
        match self {
            Self::Skipped => None,
            Self::Unneeded => Some("skipped, bible and plan reused".to_string()),
            Self::Applied(blueprint) => Some(format!(
                "applied ({} chars)",
                blueprint.text().chars().count()
            )),
            Self::Fallback { reason } => {
                Some(format!("failed, original blueprint used: {reason}"))
            }
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, Getters)]
pub struct RunReport {
    /// Blueprint identifier
    blueprint_id: String,
    /// Final stage, always `Terminal(Success)`
    stage: PipelineStage,
    /// Written story file
    story_path: PathBuf,
    /// Written metadata file
    metadata_path: PathBuf,
    /// Full run trace
    metadata: MetadataRecord,
}

/// One run of a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Blueprint identifier
    pub blueprint_id: String,
    /// 1-based repetition number
    pub run: usize,
    /// Report or the error that aborted the run
    pub result: SagaResult<RunReport>,
}

/// Outcomes of a batch, in execution order.
#[derive(Debug, Default)]
pub struct BatchReport {
    outcomes: Vec<BatchOutcome>,
    cancelled: bool,
}

impl BatchReport {
    /// Every attempted run.
    pub fn outcomes(&self) -> &[BatchOutcome] {
        &self.outcomes
    }

    /// Runs that persisted a story.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Runs that were aborted.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Whether no run succeeded.
    pub fn all_failed(&self) -> bool {
        self.succeeded() == 0
    }

    /// Whether the batch stopped early because of cancellation.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Runs the Bible → Plan → Scenes pipeline against a text generator.
///
/// Calls are strictly sequential. Any phase error aborts the run before the
/// story is written; generated bible and plan files stay on disk.
pub struct StoryPipeline<G: TextGenerator> {
    generator: G,
    config: PipelineConfig,
    store: ArtifactStore,
}

impl<G: TextGenerator> StoryPipeline<G> {
    /// Create a pipeline.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the token budget is unusable.
    pub fn new(generator: G, config: PipelineConfig) -> SagaResult<Self> {
        config.budget().validate()?;
        let store = ArtifactStore::new(config.output_dir().clone());
        Ok(Self {
            generator,
            config,
            store,
        })
    }

    /// Underlying generator.
    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Artifact store the pipeline writes into.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Run the pipeline for one blueprint.
    ///
    /// # Errors
    ///
    /// Returns `EmptyBlueprint` for a blank blueprint, `NoScenesExtracted` when
    /// the plan has no scene markers, `Cancelled` when the token fires, and
    /// `PhaseFailed` for any other phase error.
    #[tracing::instrument(
        skip(self, blueprint, cancel),
        fields(blueprint = %blueprint.id(), reuse = %self.config.reuse(), model = %self.generator.model_name())
    )]
    pub async fn run(&self, blueprint: &Blueprint, cancel: &CancelToken) -> SagaResult<RunReport> {
        let mut stage = PipelineStage::Idle;
        let outcome = self.execute(blueprint, &mut stage, cancel).await;
        match outcome {
            Ok(report) => {
                info!(
                    story = %report.story_path.display(),
                    scenes = report.metadata.entry_count(),
                    "Run complete"
                );
                Ok(report)
            }
            Err(e) => {
                error!(
                    reached = %stage,
                    stage = %stage.fail(),
                    error = %e,
                    "Run aborted; no story persisted"
                );
                Err(e)
            }
        }
    }

    /// Run several blueprints, each `runs` times, one run at a time.
    ///
    /// A failed run is recorded and the batch moves on; cancellation stops the
    /// batch.
    #[tracing::instrument(skip_all, fields(blueprints = blueprints.len(), runs = runs))]
    pub async fn run_batch(
        &self,
        blueprints: &[Blueprint],
        runs: usize,
        cancel: &CancelToken,
    ) -> BatchReport {
        let mut report = BatchReport::default();

        'batch: for blueprint in blueprints {
            for run in 1..=runs.max(1) {
                if cancel.is_cancelled() {
                    report.cancelled = true;
                    break 'batch;
                }
                info!(blueprint = %blueprint.id(), run, "Starting run");
                let result = self.run(blueprint, cancel).await;
                let cancelled = result.as_ref().is_err_and(SagaError::is_cancelled);
                report.outcomes.push(BatchOutcome {
                    blueprint_id: blueprint.id().to_string(),
                    run,
                    result,
                });
                if cancelled {
                    report.cancelled = true;
                    break 'batch;
                }
            }
        }

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            cancelled = report.cancelled,
            "Batch finished"
        );
        report
    }

    async fn execute(
        &self,
        blueprint: &Blueprint,
        stage: &mut PipelineStage,
        cancel: &CancelToken,
    ) -> SagaResult<RunReport> {
        if blueprint.is_blank() {
            return Err(
                NarrativeError::new(NarrativeErrorKind::EmptyBlueprint(blueprint.id().to_string()))
                    .into(),
            );
        }
        let started_at = Utc::now();
        let budget = self.config.budget();
        let catalog = self.config.prompts();

        ensure_active(cancel, "preprocess")?;
        let blueprint_read = self.will_generate(blueprint.id(), ArtifactKind::Bible).await?
            || self.will_generate(blueprint.id(), ArtifactKind::Plan).await?;
        let preprocess = if blueprint_read {
            self.preprocess(blueprint, cancel).await?
        } else if self.config.preprocess().is_some() {
            info!("Bible and plan reused; skipping blueprint preprocessing");
            PreprocessOutcome::Unneeded
        } else {
            PreprocessOutcome::Skipped
        };
        let working = match &preprocess {
            PreprocessOutcome::Applied(transformed) => transformed,
            _ => blueprint,
        };

        // Bible
        ensure_active(cancel, "bible")?;
        let request = self
            .generator
            .request_defaults()
            .label("bible")
            .system(catalog.bible_system().clone())
            .user(prompts::bible(catalog.bible_instruction(), working))
            .num_predict(budget.bible_limit())
            .build()?;
        let (bible, bible_source) = self
            .obtain(blueprint.id(), ArtifactKind::Bible, &request, cancel)
            .await
            .map_err(|e| phase_error("bible", e))?;
        *stage = stage.advance(PipelineStage::BibleReady)?;

        // Plan
        ensure_active(cancel, "plan")?;
        let request = self
            .generator
            .request_defaults()
            .label("plan")
            .system(catalog.plan_system().clone())
            .user(prompts::plan(catalog.plan_instruction(), working, &bible))
            .num_predict(budget.plan_limit())
            .build()?;
        let (plan, plan_source) = self
            .obtain(blueprint.id(), ArtifactKind::Plan, &request, cancel)
            .await
            .map_err(|e| phase_error("plan", e))?;

        let segments = parse_scene_plan(&plan);
        if segments.is_empty() {
            error!(plan = %plan_source.path().display(), "No scene markers found in plan");
            return Err(NarrativeError::new(NarrativeErrorKind::NoScenesExtracted).into());
        }
        *stage = stage.advance(PipelineStage::PlanReady)?;

        let specs: Vec<RequirementSpec> = self
            .config
            .requirements()
            .iter()
            .map(|text| RequirementSpec::new(text.as_str()))
            .collect();
        let requirements = check_requirements(&specs, &plan);

        // Scenes
        let scene_count = segments.len();
        let limit = budget.scene_limit(scene_count);
        info!(scene_count, num_predict = limit, "Writing scenes");

        let mut ledger = EntityLedger::new();
        let mut texts = Vec::with_capacity(scene_count);
        let mut records = Vec::with_capacity(scene_count);
        for segment in &segments {
            let phase = format!("scene {}", segment.ordinal());
            ensure_active(cancel, &phase)?;

            let request = self
                .generator
                .request_defaults()
                .label(phase.clone())
                .system(catalog.scene_system().clone())
                .user(prompts::scene(
                    catalog.scene_instruction(),
                    &bible,
                    &plan,
                    segment,
                    scene_count,
                    &ledger.summary(),
                ))
                .num_predict(limit)
                .build()?;
            let result = self
                .call(&request, cancel)
                .await
                .map_err(|e| phase_error(&phase, e))?;

            ledger.observe(segment.ordinal(), result.text());
            let record = SceneRecord::builder()
                .ordinal(segment.ordinal())
                .heading(segment.heading())
                .system_prompt(request.system().clone())
                .user_prompt(request.user().clone())
                .response(result.text().clone())
                .num_predict(limit)
                .eval_count(*result.eval_count())
                .prompt_eval_count(*result.prompt_eval_count())
                .elapsed_secs(*result.elapsed_secs())
                .build()
                .map_err(|e| BuilderError::from(e.to_string()))?;
            info!(
                scene = segment.ordinal(),
                of = scene_count,
                words = record.word_count(),
                "Scene complete"
            );
            records.push(record);
            texts.push(result.into_text());
        }
        *stage = stage.advance(PipelineStage::ScenesReady)?;

        // Persist: metadata before story
        ensure_active(cancel, "persist")?;
        let story = StoryArtifact::new(blueprint.title(), texts).render();
        let metadata = MetadataRecord {
            blueprint_id: blueprint.id().to_string(),
            title: blueprint.title().to_string(),
            model: self.generator.model_name().to_string(),
            reuse_mode: *self.config.reuse(),
            started_at,
            preprocess_note: preprocess.note(),
            bible: bible_source,
            plan: plan_source,
            requirements,
            scenes: records,
        };
        let metadata_path = self
            .write_next(blueprint.id(), ArtifactKind::Metadata, &metadata.render())
            .await
            .map_err(|e| phase_error("persist", e))?;
        let story_path = self
            .write_next(blueprint.id(), ArtifactKind::Story, &story)
            .await
            .map_err(|e| phase_error("persist", e))?;
        *stage = stage.advance(PipelineStage::Persisted)?;
        *stage = stage.advance(PipelineStage::Terminal(RunOutcome::Success))?;

        Ok(RunReport {
            blueprint_id: blueprint.id().to_string(),
            stage: *stage,
            story_path,
            metadata_path,
            metadata,
        })
    }

    async fn preprocess(
        &self,
        blueprint: &Blueprint,
        cancel: &CancelToken,
    ) -> SagaResult<PreprocessOutcome> {
        let Some(config) = self.config.preprocess().as_ref() else {
            return Ok(PreprocessOutcome::Skipped);
        };

        let request = self
            .generator
            .request_defaults()
            .label("preprocess")
            .system(config.system().clone())
            .user(prompts::preprocess(config.instruction(), blueprint))
            .num_predict(*config.num_predict())
            .build()?;

        match self.call(&request, cancel).await {
            Ok(result) => {
                info!(chars = result.char_count(), "Blueprint preprocessed");
                Ok(PreprocessOutcome::Applied(
                    blueprint.with_text(result.into_text()),
                ))
            }
            Err(e) if e.is_cancelled() => Err(phase_error("preprocess", e)),
            Err(e) => {
                warn!(error = %e, "Preprocessing failed; continuing with the original blueprint");
                Ok(PreprocessOutcome::Fallback {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Load the artifact or generate and write it, per the reuse policy.
    async fn obtain(
        &self,
        blueprint_id: &str,
        kind: ArtifactKind,
        request: &GenerationRequest,
        cancel: &CancelToken,
    ) -> SagaResult<(String, ArtifactSource)> {
        let reuse = *self.config.reuse();
        let existing = self.store.existing_versions(blueprint_id, kind).await?;
        let plan = resolve_artifact_path(reuse, kind, &existing);

        if plan.is_reuse() {
            let text = self.store.read_artifact(&plan.path).await?;
            info!(artifact = %kind, path = %plan.path.display(), "Reusing existing artifact");
            return Ok((text, ArtifactSource::Reused { path: plan.path }));
        }
        if reuse.reuses(kind) {
            warn!(artifact = %kind, "Nothing to reuse; generating instead");
        }

        let result = self.call(request, cancel).await?;
        self.store.write_artifact(&plan.path, result.text()).await?;
        let source = ArtifactSource::Generated {
            path: plan.path,
            num_predict: *request.num_predict(),
            eval_count: *result.eval_count(),
            elapsed_secs: *result.elapsed_secs(),
        };
        Ok((result.into_text(), source))
    }

    /// Whether the reuse policy will generate `kind` rather than load it.
    async fn will_generate(&self, blueprint_id: &str, kind: ArtifactKind) -> SagaResult<bool> {
        let existing = self.store.existing_versions(blueprint_id, kind).await?;
        Ok(resolve_artifact_path(*self.config.reuse(), kind, &existing).should_generate)
    }

    async fn write_next(
        &self,
        blueprint_id: &str,
        kind: ArtifactKind,
        contents: &str,
    ) -> SagaResult<PathBuf> {
        let existing = self.store.existing_versions(blueprint_id, kind).await?;
        let plan = resolve_artifact_path(*self.config.reuse(), kind, &existing);
        self.store.write_artifact(&plan.path, contents).await?;
        Ok(plan.path)
    }

    async fn call(
        &self,
        request: &GenerationRequest,
        cancel: &CancelToken,
    ) -> SagaResult<GenerationResult> {
        let result = self.generator.generate(request, cancel).await?;
        if result.text().trim().is_empty() {
            return Err(GenerationError::new(GenerationErrorKind::EmptyGeneration(format!(
                "'{}' returned only whitespace",
                request.label()
            )))
            .into());
        }
        Ok(result)
    }
}

#[track_caller]
fn ensure_active(cancel: &CancelToken, phase: &str) -> SagaResult<()> {
    if cancel.is_cancelled() {
        warn!(phase, "Run cancelled");
        return Err(NarrativeError::new(NarrativeErrorKind::Cancelled(phase.to_string())).into());
    }
    Ok(())
}

#[track_caller]
fn phase_error(phase: &str, err: SagaError) -> SagaError {
    if err.is_cancelled() {
        return NarrativeError::new(NarrativeErrorKind::Cancelled(phase.to_string())).into();
    }
    NarrativeError::new(NarrativeErrorKind::PhaseFailed {
        phase: phase.to_string(),
        message: err.to_string(),
    })
    .into()
}

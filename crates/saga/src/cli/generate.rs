//! `saga generate` handler.

use super::GenerateArgs;
use anyhow::bail;
use saga::{CancelToken, OllamaClient, SagaConfig, StoryPipeline, load_blueprint, load_lines};
use tracing::{info, warn};

/// Run the pipeline for every blueprint and print one line per run.
///
/// Fails only when no run produced a story.
pub async fn run_generate(
    config: &SagaConfig,
    args: GenerateArgs,
    cancel: &CancelToken,
) -> anyhow::Result<()> {
    let mut pipeline_config = config.pipeline_config();
    if let Some(reuse) = args.reuse {
        pipeline_config = pipeline_config.with_reuse(reuse);
    }
    if let Some(output) = args.output {
        pipeline_config = pipeline_config.with_output_dir(output);
    }
    if let Some(path) = &args.requirements {
        pipeline_config = pipeline_config.with_requirements(load_lines(path).await?);
    }

    let mut blueprints = Vec::with_capacity(args.blueprints.len());
    for path in &args.blueprints {
        blueprints.push(load_blueprint(path).await?);
    }

    let client = OllamaClient::new(config.client().clone())?;
    let pipeline = StoryPipeline::new(client, pipeline_config)?;
    info!(
        blueprints = blueprints.len(),
        runs = args.runs,
        output_dir = %pipeline.config().output_dir().display(),
        "Generating stories"
    );

    let report = pipeline.run_batch(&blueprints, args.runs, cancel).await;
    for outcome in report.outcomes() {
        match &outcome.result {
            Ok(run) => println!(
                "✓ {} (run {}): {} scenes -> {}",
                outcome.blueprint_id,
                outcome.run,
                run.metadata().entry_count(),
                run.story_path().display()
            ),
            Err(e) => println!("✗ {} (run {}): {e}", outcome.blueprint_id, outcome.run),
        }
    }

    if report.was_cancelled() {
        warn!("Batch interrupted before all runs completed");
    }
    if report.all_failed() {
        bail!("All {} runs failed", report.outcomes().len());
    }
    println!(
        "{} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );
    Ok(())
}

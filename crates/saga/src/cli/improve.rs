//! `saga improve` handler.

use super::ImproveArgs;
use anyhow::bail;
use saga::{
    CancelToken, FileSystemImprovementSink, ImprovementChain, OllamaClient, SagaConfig, StepOutcome,
    file_stem, load_lines, read_text,
};
use tracing::info;

/// Apply each instruction to the text file and print one line per step.
///
/// Fails when the chain cannot run or when every step failed.
pub async fn run_improve(
    config: &SagaConfig,
    args: ImproveArgs,
    cancel: &CancelToken,
) -> anyhow::Result<()> {
    let text = read_text(&args.text).await?;
    let instructions = load_lines(&args.instructions).await?;
    let name = match args.name {
        Some(name) => name,
        None => file_stem(&args.text)?,
    };
    let root = args
        .output
        .unwrap_or_else(|| config.pipeline().output_dir().clone());
    let improvement = match args.mode {
        Some(mode) => config.improvement().clone().with_mode(mode),
        None => config.improvement().clone(),
    };
    let mode = *improvement.mode();

    let sink = FileSystemImprovementSink::create(&root, &name).await?;
    info!(
        dir = %sink.dir().display(),
        steps = instructions.len(),
        mode = %mode,
        "Starting improvement chain"
    );

    let client = OllamaClient::new(config.client().clone())?;
    let chain = ImprovementChain::new(client, sink, improvement);
    let steps = chain.run(&text, &instructions, mode, cancel).await?;

    for step in &steps {
        let location = step
            .path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        match &step.outcome {
            StepOutcome::Succeeded { elapsed_secs, .. } => println!(
                "✓ {:02}. {} ({elapsed_secs:.1}s) -> {location}",
                step.index, step.instruction
            ),
            StepOutcome::Failed { error } => {
                println!("✗ {:02}. {}: {error}", step.index, step.instruction)
            }
        }
    }
    println!("Summary: {}", chain.sink().dir().join("summary.txt").display());

    if steps.iter().all(|step| !step.succeeded()) {
        bail!("All {} improvement steps failed", steps.len());
    }
    Ok(())
}

//! CLI command definitions.

use clap::{Args, Parser, Subcommand};
use saga_core::{ChainMode, ReuseMode};
use std::path::PathBuf;

/// Saga - turn story blueprints into finished stories with a local model
#[derive(Parser, Debug)]
#[command(name = "saga")]
#[command(about = "Turn story blueprints into finished stories with a local model", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Additional configuration file, applied last
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Generation endpoint base URL
    #[arg(long, env = "OLLAMA_HOST", global = true)]
    pub host: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a story for each blueprint
    Generate(GenerateArgs),

    /// Apply an ordered list of rewrites to a text file
    Improve(ImproveArgs),

    /// Check that the endpoint is reachable and serves a model
    Check {
        /// Model to look for (defaults to the configured model)
        model: Option<String>,
    },
}

/// Arguments for `saga generate`.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Blueprint files; each file stem names its artifact directory
    #[arg(required = true)]
    pub blueprints: Vec<PathBuf>,

    /// Reuse policy: regenerate, reuse-bible or reuse-both
    #[arg(long)]
    pub reuse: Option<ReuseMode>,

    /// Runs per blueprint
    #[arg(long, default_value = "1")]
    pub runs: usize,

    /// File with one mandatory constraint per line
    #[arg(long)]
    pub requirements: Option<PathBuf>,

    /// Root directory for artifacts
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Arguments for `saga improve`.
#[derive(Args, Debug)]
pub struct ImproveArgs {
    /// Text to improve
    pub text: PathBuf,

    /// File with one instruction per line
    #[arg(long)]
    pub instructions: PathBuf,

    /// Chaining mode: original or cumulative
    #[arg(long)]
    pub mode: Option<ChainMode>,

    /// Chain name (defaults to the text file stem)
    #[arg(long)]
    pub name: Option<String>,

    /// Root directory for the improvements folder
    #[arg(long)]
    pub output: Option<PathBuf>,
}

//! Saga CLI binary.
//!
//! This binary provides command-line access to Saga's functionality:
//! - Generate stories from blueprint files
//! - Apply improvement chains to finished text
//! - Check the generation endpoint

use clap::Parser;
use saga::CancelToken;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use cli::{Cli, Commands, cancel_on_ctrl_c, load_config, run_check, run_generate, run_improve};

    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    saga::init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    let cancel = CancelToken::new();
    cancel_on_ctrl_c(cancel.clone());

    match cli.command {
        Commands::Generate(args) => run_generate(&config, args, &cancel).await?,
        Commands::Improve(args) => run_improve(&config, args, &cancel).await?,
        Commands::Check { model } => run_check(&config, model).await?,
    }

    Ok(())
}

//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the saga binary.

mod check;
mod commands;
mod generate;
mod improve;

pub use check::run_check;
pub use commands::{Cli, Commands, GenerateArgs, ImproveArgs};
pub use generate::run_generate;
pub use improve::run_improve;

use saga::{CancelToken, SagaConfig};
use tracing::warn;

/// Load layered configuration and apply the endpoint override.
pub fn load_config(cli: &Cli) -> anyhow::Result<SagaConfig> {
    let config = SagaConfig::load(cli.config.as_deref())?;
    Ok(match cli.host.as_deref().map(str::trim) {
        Some(host) if !host.is_empty() => config.with_base_url(normalize_host(host)),
        _ => config,
    })
}

/// `OLLAMA_HOST` is commonly set without a scheme (`127.0.0.1:11434`).
fn normalize_host(host: &str) -> String {
    if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

const INTERRUPT_MESSAGE: &str = "Interrupt received; aborting the in-flight call";

/// Fire `cancel` on the first Ctrl-C.
pub fn cancel_on_ctrl_c(cancel: CancelToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("{INTERRUPT_MESSAGE}");
                cancel.cancel();
            }
            Err(e) => warn!(error = %e, "Failed to install Ctrl-C handler"),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_http_scheme() {
        assert_eq!(normalize_host("127.0.0.1:11434"), "http://127.0.0.1:11434");
        assert_eq!(normalize_host("https://models.lan"), "https://models.lan");
    }

    #[tokio::test]
    async fn interrupt_aborts_rather_than_drains() {
        assert!(INTERRUPT_MESSAGE.contains("aborting"));
        let cancel = CancelToken::new();
        let waiter = cancel.clone();
        let aborted = tokio::spawn(async move { waiter.cancelled().await });
        cancel.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(1), aborted)
            .await
            .unwrap()
            .unwrap();
    }
}

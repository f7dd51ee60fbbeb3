//! `saga check` handler.

use saga::{ClientConfig, OllamaClient, SagaConfig};

/// Query the endpoint with a short-timeout client and list its models.
pub async fn run_check(config: &SagaConfig, model: Option<String>) -> anyhow::Result<()> {
    let model = model.unwrap_or_else(|| config.client().model().clone());
    let quick = ClientConfig::for_testing(config.client().base_url().clone()).with_model(model.clone());
    let client = OllamaClient::new(quick)?;

    let models = client.health_check().await?;
    println!("✓ {} serves {model}", config.client().base_url());
    for name in models {
        println!("  - {name}");
    }
    Ok(())
}

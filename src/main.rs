//! diffwise - CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{info, warn};

use diffwise::agent::{AgentSession, SessionOutcome};
use diffwise::config::{AgentConfig, Cli};
use diffwise::error::AgentError;
use diffwise::llm::{LlmRouter, check_provider_installed};
use diffwise::logging::setup_logger;
use diffwise::tools::ToolRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logger(cli.verbose);
    let config = AgentConfig::from_cli(cli);

    // At least one provider must be usable.
    let primary = config.providers.primary;
    let fallback = config.providers.fallback;
    if let Err(primary_err) = check_provider_installed(primary).await {
        warn!("{} is unavailable: {}", primary, primary_err.detail());
        check_provider_installed(fallback).await.with_context(|| {
            format!(
                "No LLM provider available ({}: {})",
                primary,
                primary_err.summary()
            )
        })?;
    }

    let router = LlmRouter::new(config.providers);
    let mut session = AgentSession::new(router, ToolRegistry::with_defaults(), config.max_steps);

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let printer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(chunk) = rx.recv().await {
            stdout.write_all(chunk.as_bytes()).await?;
            stdout.flush().await?;
        }
        Ok::<(), std::io::Error>(())
    });

    let outcome = session.run(&config.prompt, &tx).await;
    drop(tx);

    printer
        .await
        .context("Output task panicked")?
        .context("Failed to write to stdout")?;

    let outcome = match outcome {
        Err(AgentError::Model(err)) if config.verbose => {
            anyhow::bail!("Review session failed: {}", err.detailed())
        }
        other => other.context("Review session failed")?,
    };

    match outcome {
        SessionOutcome::Finished { steps } => info!("Done in {} step(s)", steps),
        SessionOutcome::StepLimitReached { steps } => {
            warn!("Stopped at the {}-step limit", steps)
        }
    }

    Ok(())
}

use anyhow::{Context, Result};
use std::process::ExitCode;
use tracing::Instrument;
use uuid::Uuid;

use apple_deal_alert::core::{logging, season, Config};
use apple_deal_alert::fetch::build_fetcher;
use apple_deal_alert::notify::{EmailNotifier, Notifier};
use apple_deal_alert::{DealPipeline, RunOutcome};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[error] Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    logging::init_logging(&config.log_level);

    tracing::info!("🍎 Apple Deal Alert starting...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let span = tracing::info_span!("run", run_id = %Uuid::new_v4());
    let result = run(&config).instrument(span).await;
    match &result {
        Ok(RunOutcome::OutOfSeason { .. }) => {}
        Ok(RunOutcome::Completed(summary)) => tracing::info!(
            "✅ Run complete: {} deal(s), {} fetch attempt(s)",
            summary.matched_entries.len(),
            summary.attempts_used
        ),
        Err(e) => tracing::error!("❌ Run failed: {:#}", e),
    }
    ExitCode::from(exit_status(&result))
}

/// Skipped and completed runs succeed, with or without deals. Any error fails.
fn exit_status(result: &Result<RunOutcome>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

async fn run(config: &Config) -> Result<RunOutcome> {
    let fetcher = build_fetcher(&config.fetch).context("failed to set up fetch backend")?;

    let email = config
        .email
        .enabled
        .then(|| EmailNotifier::new(config.email.clone()));
    let notifier = email.as_ref().map(|n| n as &dyn Notifier);

    let outcome = DealPipeline::new(config, fetcher.as_ref(), notifier)
        .run(season::current_month())
        .await?;

    Ok(outcome)
}

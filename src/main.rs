use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use grandtrain_watcher::filter::PreferenceFilter;
use grandtrain_watcher::plugins::notifiers::TelegramNotifier;
use grandtrain_watcher::scheduler::PollScheduler;
use grandtrain_watcher::scraper::ChromeRenderer;
use grandtrain_watcher::ticket_checker::TicketChecker;
use grandtrain_watcher::utils::logging;
use grandtrain_watcher::AppConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Error loading configuration")?;

    // Keep the guard alive so the file writer flushes on exit
    let _log_guard = logging::init_tracing(&config.logging)?;

    info!("Starting Grandtrain Watcher...");

    let renderer = Arc::new(ChromeRenderer::new(config.scraper.clone()));
    let notifier = Arc::new(TelegramNotifier::new(
        config.telegram.clone(),
        PreferenceFilter::new(&config.seat_preferences),
    )?);
    let checker = Arc::new(TicketChecker::new(&config, renderer, notifier)?);

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down...");
            signal_token.cancel();
        }
    });

    let scheduler = PollScheduler::new(checker, config.target_dates(), config.scheduler.clone(), shutdown);
    scheduler.run().await?;

    Ok(())
}

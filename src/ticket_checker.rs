use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::{range_bounds, AppConfig, ScraperConfig, StationsConfig};
use crate::extractor::ListingExtractor;
use crate::filter::PreferenceFilter;
use crate::models::TrainRecord;
use crate::plugins::traits::{NotificationEvent, NotifierPlugin};
use crate::scraper::PageRenderer;
use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateCheckResult {
    pub date: String,
    pub success: bool,
    pub trains: Vec<TrainRecord>,
    pub eligible_trains: usize,
    pub notifications_sent: usize,
    pub error: Option<String>,
    pub total_time_ms: u64,
}

impl DateCheckResult {
    pub fn failed(date: &str, error: String, total_time_ms: u64) -> Self {
        Self {
            date: date.to_string(),
            success: false,
            trains: Vec::new(),
            eligible_trains: 0,
            notifications_sent: 0,
            error: Some(error),
            total_time_ms,
        }
    }
}

/// Runs one scrape-and-notify pass for a single date.
pub struct TicketChecker {
    renderer: Arc<dyn PageRenderer>,
    notifier: Arc<dyn NotifierPlugin>,
    extractor: ListingExtractor,
    filter: PreferenceFilter,
    stations: StationsConfig,
    scraper: ScraperConfig,
}

impl TicketChecker {
    pub fn new(
        config: &AppConfig,
        renderer: Arc<dyn PageRenderer>,
        notifier: Arc<dyn NotifierPlugin>,
    ) -> Result<Self> {
        Ok(Self {
            renderer,
            notifier,
            extractor: ListingExtractor::new(&config.scraper.no_seats_text)?,
            filter: PreferenceFilter::new(&config.seat_preferences),
            stations: config.stations.clone(),
            scraper: config.scraper.clone(),
        })
    }

    fn settle_delay(&self) -> Duration {
        let (min, max) = range_bounds(&self.scraper.settle_delay_range).unwrap_or((0, 0));
        Duration::from_secs(rand::thread_rng().gen_range(min..=max))
    }

    /// Never fails: any render or extraction error yields an empty result
    /// for the date.
    pub async fn check_date(&self, date: &str) -> DateCheckResult {
        let start_time = Instant::now();
        tracing::info!("Starting check for date: {}", date);

        match self.try_check_date(date).await {
            Ok(result) => {
                tracing::info!(
                    "Finished check for date {}: {} trains, {} eligible, {} notifications sent",
                    date,
                    result.trains.len(),
                    result.eligible_trains,
                    result.notifications_sent
                );
                result
            }
            Err(e) => {
                tracing::error!("Error checking date {}: {}", date, e);
                DateCheckResult::failed(date, e.to_string(), start_time.elapsed().as_millis() as u64)
            }
        }
    }

    async fn try_check_date(&self, date: &str) -> Result<DateCheckResult> {
        let start_time = Instant::now();

        let url = self.scraper.search_url(&self.stations, date)?;
        let html = self.renderer.render(&url, self.settle_delay()).await?;
        let trains = self.extractor.extract_html(&html)?;

        let mut eligible_trains = 0;
        let mut notifications_sent = 0;

        for train in &trains {
            let outcome = self.filter.evaluate(train.seat_details.as_deref());
            if !outcome.eligible {
                continue;
            }
            eligible_trains += 1;

            let Some(booking_path) = &train.booking_path else {
                tracing::warn!(
                    "Train {} on {} matches preferences but has no booking link, skipping",
                    train.train_number,
                    date
                );
                continue;
            };

            let event = NotificationEvent {
                date: date.to_string(),
                train: train.clone(),
                seats: outcome.filtered,
                booking_url: self.scraper.booking_url(&self.stations, date, booking_path),
            };

            if self.deliver(&event).await {
                notifications_sent += 1;
            }
        }

        Ok(DateCheckResult {
            date: date.to_string(),
            success: true,
            trains,
            eligible_trains,
            notifications_sent,
            error: None,
            total_time_ms: start_time.elapsed().as_millis() as u64,
        })
    }

    /// Single delivery attempt; failures are logged and swallowed.
    async fn deliver(&self, event: &NotificationEvent) -> bool {
        match self.notifier.notify(event).await {
            Ok(result) if result.success => true,
            Ok(result) => {
                tracing::warn!(
                    "{} rejected message for train {}: {}",
                    self.notifier.name(),
                    event.train.train_number,
                    result.error.unwrap_or_default()
                );
                false
            }
            Err(e) => {
                tracing::error!(
                    "Error sending {} message for train {}: {}",
                    self.notifier.name(),
                    event.train.train_number,
                    e
                );
                false
            }
        }
    }
}

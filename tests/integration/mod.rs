// Integration test helpers for Grandtrain Watcher
// A fixed HTML page stands in for the browser and wiremock for the Telegram API.

pub mod pipeline_tests;
pub mod scheduler_tests;

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use grandtrain_watcher::{
    AppConfig,
    config::{DatesConfig, LoggingConfig, SchedulerConfig, ScraperConfig, SeatPreferences, StationsConfig, TelegramConfig},
    filter::PreferenceFilter,
    plugins::notifiers::TelegramNotifier,
    scraper::PageRenderer,
    ticket_checker::TicketChecker,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const BOT_TOKEN: &str = "123456:integration-token";

/// Test configuration pointing Telegram at `api_base_url`
pub fn get_test_config(api_base_url: &str) -> AppConfig {
    AppConfig {
        stations: StationsConfig {
            from: "2000000".to_string(),
            to: "2078750".to_string(),
        },
        dates: DatesConfig {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            days_forward: 3,
        },
        seat_preferences: SeatPreferences {
            seat_positions: vec!["1".to_string(), "2".to_string()],
            seat_types: vec!["Купе".to_string()],
        },
        scheduler: SchedulerConfig {
            time_to_sleep_range: vec![0, 0],
            task_timeout_secs: 10,
        },
        telegram: TelegramConfig {
            chat_id: "-1001234567890".to_string(),
            bot_token: Some(BOT_TOKEN.to_string()),
            api_base_url: api_base_url.to_string(),
        },
        scraper: ScraperConfig {
            settle_delay_range: vec![0, 0],
            ..ScraperConfig::default()
        },
        logging: LoggingConfig::default(),
    }
}

/// Serves the same rendered page for every URL
pub struct FixturePage {
    html: String,
}

impl FixturePage {
    pub fn new(html: String) -> Self {
        Self { html }
    }
}

#[async_trait]
impl PageRenderer for FixturePage {
    async fn render(&self, _url: &str, _settle: Duration) -> grandtrain_watcher::Result<String> {
        Ok(self.html.clone())
    }
}

pub fn seat_item(seat_type: &str, count: &str, cost: &str) -> String {
    format!(
        r#"<div class="seats_item"><span class="train_places_name">{}</span><span class="train_seats_count">{}</span><span class="train_cost">{}</span></div>"#,
        seat_type, count, cost
    )
}

pub fn train_listing(number: &str, seats: &[String]) -> String {
    format!(
        r#"<div class="train train_seats train-sort train--tav">
            <span class="train_number_number">{number}</span>
            <span class="time">21:50</span>
            <div class="arr"><span class="time">06:20</span></div>
            <div class="train_timing_dur"><span class="dur">8 ч 30 мин</span></div>
            <div class="train_cities">Москва — Санкт-Петербург</div>
            <span class="mark_item">Фирменный</span>
            <span class="train_cost">от 3500</span>
            <div class="seats seats_inline">{seats}</div>
            <div class="button_row"><a href="?number={number}">Выбрать места</a></div>
        </div>"#,
        number = number,
        seats = seats.join("")
    )
}

pub fn results_page(listings: &[String]) -> String {
    format!("<html><body>{}</body></html>", listings.join("\n"))
}

/// Mounts a `sendMessage` endpoint expecting exactly `expected` calls
pub async fn mock_telegram(expected: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{}/sendMessage", BOT_TOKEN)))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true,"result":{}}"#))
        .expect(expected)
        .mount(&server)
        .await;
    server
}

/// Wires a checker with the real Telegram notifier against `config`
pub fn create_checker(config: &AppConfig, html: String) -> Arc<TicketChecker> {
    let notifier = TelegramNotifier::new(
        config.telegram.clone(),
        PreferenceFilter::new(&config.seat_preferences),
    )
    .unwrap();

    Arc::new(TicketChecker::new(config, Arc::new(FixturePage::new(html)), Arc::new(notifier)).unwrap())
}

pub async fn sent_messages(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| serde_json::from_slice(&request.body).unwrap())
        .collect()
}

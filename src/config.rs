use chrono::{Days, NaiveDate};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use url::Url;

use crate::utils::error::AppError;

/// Date format expected by the booking site's query string and deep links.
pub const SITE_DATE_FORMAT: &str = "%d.%m.%Y";

/// Seat-count text the site shows for a sold-out class.
pub const DEFAULT_NO_SEATS_TEXT: &str = "Свободных мест нет";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub stations: StationsConfig,
    pub dates: DatesConfig,
    pub seat_preferences: SeatPreferences,
    pub scheduler: SchedulerConfig,
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationsConfig {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatesConfig {
    pub start_date: NaiveDate,
    pub days_forward: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatPreferences {
    pub seat_positions: Vec<String>,
    pub seat_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// `[min, max]` seconds to sleep between cycles.
    pub time_to_sleep_range: Vec<u64>,
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub chat_id: String,
    #[serde(default, skip_serializing)]
    pub bot_token: Option<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    #[serde(default = "default_tickets_url")]
    pub tickets_url: String,
    #[serde(default)]
    pub chrome_path: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,
    /// `[min, max]` seconds to let the results page settle before reading it.
    #[serde(default = "default_settle_delay_range")]
    pub settle_delay_range: Vec<u64>,
    #[serde(default = "default_no_seats_text")]
    pub no_seats_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_directory")]
    pub directory: String,
    #[serde(default = "default_log_file_name")]
    pub file_name: String,
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_task_timeout_secs() -> u64 {
    300
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_tickets_url() -> String {
    "https://grandtrain.ru/tickets".to_string()
}

fn default_navigation_timeout_secs() -> u64 {
    60
}

fn default_settle_delay_range() -> Vec<u64> {
    vec![1, 10]
}

fn default_no_seats_text() -> String {
    DEFAULT_NO_SEATS_TEXT.to_string()
}

fn default_log_directory() -> String {
    ".".to_string()
}

fn default_log_file_name() -> String {
    "parser.log".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            tickets_url: default_tickets_url(),
            chrome_path: None,
            user_agent: None,
            navigation_timeout_secs: default_navigation_timeout_secs(),
            settle_delay_range: default_settle_delay_range(),
            no_seats_text: default_no_seats_text(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            file_name: default_log_file_name(),
            level: default_log_level(),
        }
    }
}

/// Returns `(min, max)` when `range` holds exactly two ordered values.
pub fn range_bounds(range: &[u64]) -> Option<(u64, u64)> {
    match range {
        [min, max] if min <= max => Some((*min, *max)),
        _ => None,
    }
}

impl AppConfig {
    /// Loads `config.{yaml,toml,json}` (or the file named by `GRANDTRAIN_CONFIG`),
    /// an optional `config/local` overlay and `GRANDTRAIN__*` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("GRANDTRAIN_CONFIG").unwrap_or_else(|_| "config".into());

        let builder = Config::builder()
            .add_source(File::with_name(&path))
            // Local overrides (ignored by git)
            .add_source(File::with_name("config/local").required(false));

        Self::build(builder)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::build(Config::builder().add_source(File::from(path)))
    }

    /// `GRANDTRAIN__SECTION__KEY` overrides for scalar keys. List values are
    /// not split, so lists are set in the config file.
    fn environment() -> Environment {
        Environment::with_prefix("GRANDTRAIN").separator("__")
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        Self::build_with_env(builder, Self::environment())
    }

    fn build_with_env(builder: ConfigBuilder<DefaultState>, environment: Environment) -> Result<Self, ConfigError> {
        let s = builder.add_source(environment).build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        if config.telegram.bot_token.is_none() {
            config.telegram.bot_token = env::var("TELEGRAM_BOT_TOKEN").ok();
        }

        if config.scraper.chrome_path.is_none() {
            config.scraper.chrome_path = env::var("CHROME_PATH").ok();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stations.from.trim().is_empty() || self.stations.to.trim().is_empty() {
            return Err(ConfigError::Message("Station codes stations.from and stations.to must not be empty".into()));
        }

        if self.seat_preferences.seat_positions.is_empty() {
            return Err(ConfigError::Message("seat_preferences.seat_positions must list at least one position".into()));
        }

        if self.seat_preferences.seat_types.is_empty() {
            return Err(ConfigError::Message("seat_preferences.seat_types must list at least one seat type".into()));
        }

        if range_bounds(&self.scheduler.time_to_sleep_range).is_none() {
            return Err(ConfigError::Message(
                "scheduler.time_to_sleep_range must be [min, max] with min <= max".into(),
            ));
        }

        if self.scheduler.task_timeout_secs == 0 {
            return Err(ConfigError::Message("scheduler.task_timeout_secs must be greater than 0".into()));
        }

        if self.telegram.chat_id.trim().is_empty() {
            return Err(ConfigError::Message("telegram.chat_id must not be empty".into()));
        }

        match &self.telegram.bot_token {
            Some(token) if !token.trim().is_empty() => {}
            _ => {
                return Err(ConfigError::Message(
                    "Telegram bot token missing: set TELEGRAM_BOT_TOKEN or telegram.bot_token".into(),
                ));
            }
        }

        if Url::parse(&self.telegram.api_base_url).is_err() {
            return Err(ConfigError::Message("Invalid telegram.api_base_url format".into()));
        }

        if Url::parse(&self.scraper.tickets_url).is_err() {
            return Err(ConfigError::Message("Invalid scraper.tickets_url format".into()));
        }

        if range_bounds(&self.scraper.settle_delay_range).is_none() {
            return Err(ConfigError::Message(
                "scraper.settle_delay_range must be [min, max] with min <= max".into(),
            ));
        }

        if self.scraper.navigation_timeout_secs == 0 {
            return Err(ConfigError::Message("scraper.navigation_timeout_secs must be greater than 0".into()));
        }

        // Only fires for a render that is already stuck past its own timeouts.
        let max_settle = range_bounds(&self.scraper.settle_delay_range).map_or(0, |(_, max)| max);
        let render_budget = self.scraper.navigation_timeout_secs.saturating_add(max_settle);
        if self.scheduler.task_timeout_secs <= render_budget {
            return Err(ConfigError::Message(format!(
                "scheduler.task_timeout_secs must exceed scraper.navigation_timeout_secs plus the maximum settle delay ({}s)",
                render_budget
            )));
        }

        Ok(())
    }

    /// Dates to poll, `start_date` onwards for `days_forward` days, in site format.
    pub fn target_dates(&self) -> Vec<String> {
        (0..self.dates.days_forward)
            .filter_map(|offset| self.dates.start_date.checked_add_days(Days::new(u64::from(offset))))
            .map(|date| date.format(SITE_DATE_FORMAT).to_string())
            .collect()
    }
}

impl StationsConfig {
    pub fn route(&self) -> String {
        format!("{}-{}", self.from, self.to)
    }
}

impl ScraperConfig {
    fn tickets_base(&self) -> &str {
        self.tickets_url.trim_end_matches('/')
    }

    /// Search results page for a single date and one adult passenger.
    pub fn search_url(&self, stations: &StationsConfig, date: &str) -> crate::Result<String> {
        let mut url = Url::parse(&format!("{}/", self.tickets_base())).map_err(|e| AppError::Parse {
            message: format!("Invalid tickets URL '{}': {}", self.tickets_url, e),
        })?;

        url.query_pairs_mut()
            .append_pair("step", "1")
            .append_pair("month1", "")
            .append_pair("month2", "")
            .append_pair("year1", "")
            .append_pair("year2", "")
            .append_pair("STATION_FROM", &stations.from)
            .append_pair("STATION_TO", &stations.to)
            .append_pair("DATES[0]", date)
            .append_pair("DATES[1]", "")
            .append_pair("DATES[2]", "")
            .append_pair("quantity[adult]", "1")
            .append_pair("quantity[child]", "0")
            .append_pair("quantity[child5]", "0");

        Ok(url.into())
    }

    /// Deep link to the seat selection step: `tickets/from-to/date/fragment`.
    pub fn booking_url(&self, stations: &StationsConfig, date: &str, fragment: &str) -> String {
        format!("{}/{}/{}/{}", self.tickets_base(), stations.route(), date, fragment)
    }
}

use crate::config::TelegramConfig;
use crate::filter::PreferenceFilter;
use crate::plugins::traits::{NotificationEvent, NotificationResult, NotifierPlugin};
use crate::utils::error::AppError;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::fmt::Write;

const PARSE_MODE: &str = "Markdown";
const BOOKING_BUTTON_TEXT: &str = "🎟 Выбрать места";

pub struct TelegramNotifier {
    client: Client,
    config: TelegramConfig,
    filter: PreferenceFilter,
}

impl TelegramNotifier {
    /// `filter` decides which seat lines make it into the message body.
    pub fn new(config: TelegramConfig, filter: PreferenceFilter) -> Result<Self> {
        if config.bot_token.as_deref().map_or(true, |t| t.trim().is_empty()) {
            return Err(AppError::Notification {
                notifier: "telegram".to_string(),
                message: "bot token is not configured".to_string(),
            });
        }

        Ok(TelegramNotifier {
            client: Client::new(),
            config,
            filter,
        })
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.bot_token.as_deref().unwrap_or_default()
        )
    }

    fn format_message(&self, event: &NotificationEvent) -> String {
        let train = &event.train;
        let tags = train.tags.iter().map(String::as_str).collect::<Vec<_>>().join(", ");

        let mut message = format!(
            "🚂 *Информация о поезде* 🚂\n\n\
             📅 *Дата:* {}\n\
             🔢 *Номер поезда:* {}\n\
             🕒 *Время отправления:* {}\n\
             🕕 *Время прибытия:* {}\n\
             ⏱ *Время в пути:* {}\n\
             🛤 *Маршрут:* {}\n\
             ℹ️ *Описание поезда:* {}\n\n\
             💺 *Описание мест:*\n",
            event.date,
            train.train_number,
            train.departure_time,
            train.arrival_time,
            train.travel_time,
            train.route_description,
            tags
        );

        for seat in event.seats.iter().filter(|s| self.filter.is_preferred_type(&s.seat_type)) {
            let _ = writeln!(
                message,
                "  • *Тип:* {}, *Кол-во:* {}, *Цена:* {}₽",
                seat.seat_type, seat.seat_count, seat.seat_cost
            );
        }

        message
    }

    fn create_payload(&self, event: &NotificationEvent) -> serde_json::Value {
        json!({
            "chat_id": self.config.chat_id,
            "text": self.format_message(event),
            "parse_mode": PARSE_MODE,
            "reply_markup": {
                "inline_keyboard": [[
                    { "text": BOOKING_BUTTON_TEXT, "url": event.booking_url }
                ]]
            }
        })
    }
}

#[async_trait]
impl NotifierPlugin for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn notify(&self, event: &NotificationEvent) -> Result<NotificationResult> {
        let payload = self.create_payload(event);

        tracing::info!("Sending Telegram message for train: {}", event.train.train_number);

        let response = self.client.post(self.send_message_url()).json(&payload).send().await?;
        let status = response.status();

        Ok(NotificationResult {
            success: status.is_success(),
            status: Some(status.as_u16()),
            error: (!status.is_success()).then(|| format!("Telegram API responded with {}", status)),
        })
    }
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{SeatClassRecord, TrainRecord};
use crate::Result;

/// One offer to push: a train on a date with its position-matched seats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub date: String,
    pub train: TrainRecord,
    pub seats: Vec<SeatClassRecord>,
    pub booking_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResult {
    pub success: bool,
    pub status: Option<u16>,
    pub error: Option<String>,
}

/// Trait for implementing notification channels (Telegram, ...)
#[async_trait]
pub trait NotifierPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Delivers one event. Called once per event; callers do not retry.
    async fn notify(&self, event: &NotificationEvent) -> Result<NotificationResult>;
}

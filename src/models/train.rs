use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Remaining seats of one class, as understood from the listing text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SeatCount {
    /// Sold out: exactly `"0"` or the site's no-seats text.
    Unavailable,
    Count(u32),
    /// Text that is neither a number nor the no-seats text.
    Unknown,
}

impl SeatCount {
    pub fn parse(raw: &str, no_seats_text: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed == "0" || trimmed == no_seats_text.trim() {
            return SeatCount::Unavailable;
        }

        let digits: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();
        match digits.parse::<u32>() {
            Ok(count) => SeatCount::Count(count),
            Err(_) => SeatCount::Unknown,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, SeatCount::Unavailable)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatClassRecord {
    pub seat_type: String,
    /// Raw count text, e.g. `"2 места"`; position preferences match against it.
    pub seat_count: String,
    pub seat_cost: String,
    pub availability: SeatCount,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrainRecord {
    pub train_number: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub travel_time: String,
    pub route_description: String,
    pub tags: BTreeSet<String>,
    pub seat_availability: String,
    /// `None` when the listing has no inline seat-class breakdown.
    pub seat_details: Option<Vec<SeatClassRecord>>,
    /// Href of the listing's "select seats" link.
    pub booking_path: Option<String>,
}

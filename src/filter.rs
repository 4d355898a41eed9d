use std::collections::BTreeSet;

use crate::config::SeatPreferences;
use crate::models::SeatClassRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    pub eligible: bool,
    /// Seat classes whose count text matched a preferred position.
    pub filtered: Vec<SeatClassRecord>,
}

impl FilterOutcome {
    fn ineligible() -> Self {
        Self {
            eligible: false,
            filtered: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreferenceFilter {
    seat_positions: Vec<String>,
    seat_types: BTreeSet<String>,
}

impl PreferenceFilter {
    pub fn new(preferences: &SeatPreferences) -> Self {
        Self {
            seat_positions: preferences.seat_positions.clone(),
            seat_types: preferences.seat_types.iter().cloned().collect(),
        }
    }

    pub fn is_preferred_type(&self, seat_type: &str) -> bool {
        self.seat_types.contains(seat_type)
    }

    fn matches_position(&self, seat: &SeatClassRecord) -> bool {
        self.seat_positions
            .iter()
            .any(|position| seat.seat_count.contains(position.as_str()))
    }

    /// A train qualifies when at least one position-matched seat class is of a
    /// preferred type and not sold out. Trains without a breakdown never do.
    pub fn evaluate(&self, seats: Option<&[SeatClassRecord]>) -> FilterOutcome {
        let Some(seats) = seats else {
            return FilterOutcome::ineligible();
        };

        let filtered: Vec<SeatClassRecord> = seats
            .iter()
            .filter(|seat| self.matches_position(seat))
            .cloned()
            .collect();

        let eligible = filtered
            .iter()
            .any(|seat| self.is_preferred_type(&seat.seat_type) && !seat.availability.is_unavailable());

        FilterOutcome { eligible, filtered }
    }
}

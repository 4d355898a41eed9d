use scraper::{ElementRef, Html, Selector};

use crate::models::{SeatClassRecord, SeatCount, TrainRecord};
use crate::utils::error::AppError;
use crate::Result;

const TRAIN_SELECTOR: &str = ".train.train_seats.train-sort.train--tav";
const NUMBER_SELECTOR: &str = ".train_number_number";
const DEPARTURE_SELECTOR: &str = ".time";
const ARRIVAL_SELECTOR: &str = ".arr .time";
const DURATION_SELECTOR: &str = ".train_timing_dur .dur";
const ROUTE_SELECTOR: &str = ".train_cities";
const TAG_SELECTOR: &str = ".mark_item";
const COST_SELECTOR: &str = ".train_cost";
const SEATS_INLINE_SELECTOR: &str = ".seats.seats_inline";
const SEAT_ITEM_SELECTOR: &str = ".seats_item";
const SEAT_TYPE_SELECTOR: &str = ".train_places_name";
const SEAT_COUNT_SELECTOR: &str = ".train_seats_count";
const BUTTON_ROW_SELECTOR: &str = ".button_row";
const LINK_SELECTOR: &str = "a";

/// Compiled selectors for one search-results page layout.
struct ListingSelectors {
    train: Selector,
    number: Selector,
    departure: Selector,
    arrival: Selector,
    duration: Selector,
    route: Selector,
    tag: Selector,
    cost: Selector,
    seats_inline: Selector,
    seat_item: Selector,
    seat_type: Selector,
    seat_count: Selector,
    button_row: Selector,
    link: Selector,
}

impl ListingSelectors {
    fn compile() -> Result<Self> {
        Ok(Self {
            train: parse_selector(TRAIN_SELECTOR)?,
            number: parse_selector(NUMBER_SELECTOR)?,
            departure: parse_selector(DEPARTURE_SELECTOR)?,
            arrival: parse_selector(ARRIVAL_SELECTOR)?,
            duration: parse_selector(DURATION_SELECTOR)?,
            route: parse_selector(ROUTE_SELECTOR)?,
            tag: parse_selector(TAG_SELECTOR)?,
            cost: parse_selector(COST_SELECTOR)?,
            seats_inline: parse_selector(SEATS_INLINE_SELECTOR)?,
            seat_item: parse_selector(SEAT_ITEM_SELECTOR)?,
            seat_type: parse_selector(SEAT_TYPE_SELECTOR)?,
            seat_count: parse_selector(SEAT_COUNT_SELECTOR)?,
            button_row: parse_selector(BUTTON_ROW_SELECTOR)?,
            link: parse_selector(LINK_SELECTOR)?,
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| AppError::Parse {
        message: format!("Invalid CSS selector '{}': {:?}", selector, e),
    })
}

/// Text content of an element with runs of whitespace collapsed.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turns a rendered search-results page into train records.
pub struct ListingExtractor {
    selectors: ListingSelectors,
    no_seats_text: String,
}

impl ListingExtractor {
    pub fn new(no_seats_text: &str) -> Result<Self> {
        Ok(Self {
            selectors: ListingSelectors::compile()?,
            no_seats_text: no_seats_text.to_string(),
        })
    }

    pub fn extract_html(&self, html: &str) -> Result<Vec<TrainRecord>> {
        self.extract(&Html::parse_document(html))
    }

    /// One record per train listing. A listing missing any required field
    /// fails the whole page; no partial results are returned.
    pub fn extract(&self, document: &Html) -> Result<Vec<TrainRecord>> {
        document
            .select(&self.selectors.train)
            .map(|train| self.extract_train(train))
            .collect()
    }

    fn extract_train(&self, train: ElementRef<'_>) -> Result<TrainRecord> {
        let s = &self.selectors;

        let train_number = self.required_text(train, &s.number, NUMBER_SELECTOR)?;
        let departure_time = self.required_text(train, &s.departure, DEPARTURE_SELECTOR)?;
        let arrival_time = self.required_text(train, &s.arrival, ARRIVAL_SELECTOR)?;
        let travel_time = self.required_text(train, &s.duration, DURATION_SELECTOR)?;
        let route_description = self.required_text(train, &s.route, ROUTE_SELECTOR)?;
        let tags = train.select(&s.tag).map(element_text).collect();
        let seat_availability = self.required_text(train, &s.cost, COST_SELECTOR)?;

        let seat_details = match train.select(&s.seats_inline).next() {
            Some(seats_inline) => Some(
                seats_inline
                    .select(&s.seat_item)
                    .map(|seat| self.extract_seat(seat))
                    .collect::<Result<Vec<_>>>()?,
            ),
            None => None,
        };

        // First button row only; a later row's link is not a booking link.
        let booking_path = train
            .select(&s.button_row)
            .next()
            .and_then(|row| row.select(&s.link).next())
            .and_then(|link| link.value().attr("href"))
            .map(|href| href.to_string());

        Ok(TrainRecord {
            train_number,
            departure_time,
            arrival_time,
            travel_time,
            route_description,
            tags,
            seat_availability,
            seat_details,
            booking_path,
        })
    }

    fn extract_seat(&self, seat: ElementRef<'_>) -> Result<SeatClassRecord> {
        let s = &self.selectors;

        let seat_type = self.required_text(seat, &s.seat_type, SEAT_TYPE_SELECTOR)?;
        let seat_count = self.required_text(seat, &s.seat_count, SEAT_COUNT_SELECTOR)?;
        let seat_cost = self.required_text(seat, &s.cost, COST_SELECTOR)?;
        let availability = SeatCount::parse(&seat_count, &self.no_seats_text);

        Ok(SeatClassRecord {
            seat_type,
            seat_count,
            seat_cost,
            availability,
        })
    }

    fn required_text(&self, parent: ElementRef<'_>, selector: &Selector, name: &str) -> Result<String> {
        parent
            .select(selector)
            .next()
            .map(element_text)
            .ok_or_else(|| AppError::ElementNotFound {
                selector: name.to_string(),
            })
    }
}

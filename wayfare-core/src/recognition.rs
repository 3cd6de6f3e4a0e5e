use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::debug;
use wayfare_shared::{Endpoint, NewTrip, TripType, SELF_TRAVELER};

use crate::RecognitionError;

/// Payload returned by the recognition service for one image
#[derive(Debug, Default, Deserialize)]
pub struct RecognitionResponse {
    #[serde(default)]
    pub tickets: Vec<RecognizedTicket>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecognizedEndpoint {
    pub time: Option<String>,
    pub city: Option<String>,
    pub station: Option<String>,
}

fn endpoint_or_blank(value: Option<RecognizedEndpoint>) -> Endpoint {
    let value = value.unwrap_or_default();
    Endpoint {
        time: value.time.unwrap_or_default(),
        city: value.city.unwrap_or_default(),
        station: value.station.unwrap_or_default(),
    }
}

/// One ticket as read off an image; any field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizedTicket {
    #[serde(rename = "type")]
    pub trip_type: Option<TripType>,
    pub departure: Option<RecognizedEndpoint>,
    pub arrival: Option<RecognizedEndpoint>,
    pub price: Option<f64>,
    pub airline: Option<String>,
    pub flight_number: Option<String>,
}

impl RecognizedTicket {
    pub fn into_new_trip(self) -> NewTrip {
        self.into_new_trip_on(Utc::now().date_naive())
    }

    /// Fill every gap so the result is safe to hand to the add path:
    /// endpoints default to empty strings, price to 0, travelers to self,
    /// and the date is always set.
    pub fn into_new_trip_on(self, today: NaiveDate) -> NewTrip {
        let mut trip = NewTrip::new(
            self.trip_type.unwrap_or(TripType::Flight),
            endpoint_or_blank(self.departure),
            endpoint_or_blank(self.arrival),
        );
        trip.price = self.price.unwrap_or(0.0).max(0.0);
        trip.airline = self.airline.filter(|s| !s.trim().is_empty());
        trip.flight_number = self.flight_number.filter(|s| !s.trim().is_empty());
        trip.travelers = vec![SELF_TRAVELER.to_string()];
        trip.date = Some(trip.resolved_date(today));
        trip
    }
}

/// Parse a recognition reply into ready-to-add trips. Accepts `{"tickets": [...]}`
/// or a bare array, optionally wrapped in a Markdown code fence.
pub fn parse_tickets(content: &str) -> Result<Vec<NewTrip>, RecognitionError> {
    parse_tickets_on(content, Utc::now().date_naive())
}

pub fn parse_tickets_on(content: &str, today: NaiveDate) -> Result<Vec<NewTrip>, RecognitionError> {
    let body = strip_code_fence(content);
    let tickets = match serde_json::from_str::<RecognitionResponse>(body) {
        Ok(response) => response.tickets,
        Err(err) => serde_json::from_str::<Vec<RecognizedTicket>>(body).map_err(|_| err)?,
    };
    debug!("Recognized {} ticket(s)", tickets.len());

    Ok(tickets
        .into_iter()
        .map(|ticket| ticket.into_new_trip_on(today))
        .collect())
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let without_open = match trimmed.find('\n') {
        Some(idx) => &trimmed[idx + 1..],
        None => return "",
    };
    without_open
        .trim_end()
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

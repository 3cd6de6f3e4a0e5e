use chrono::{NaiveDate, TimeZone, Utc};
use wayfare_shared::{Endpoint, TripRecord, TripType, SELF_TRAVELER};

pub fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn trip(id: &str, date: &str, from: &str, to: &str) -> TripRecord {
    TripRecord {
        id: id.to_string(),
        trip_type: TripType::Flight,
        date: day(date),
        departure: Endpoint::new("", from, ""),
        arrival: Endpoint::new("", to, ""),
        price: 100.0,
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        airline: None,
        flight_number: None,
        notes: None,
        travelers: vec![SELF_TRAVELER.to_string()],
        round_trip: None,
        manually_unlinked_from: Vec::new(),
    }
}

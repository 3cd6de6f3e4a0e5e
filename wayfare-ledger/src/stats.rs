use serde::Serialize;
use std::collections::HashMap;
use wayfare_shared::{TripRecord, TripType};

use crate::linker::RoundTripPair;

/// Length of every "top" list.
pub const TOP_N: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TripCounts {
    pub flight: usize,
    pub train: usize,
}

/// Summary figures over the collection and its round trips
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripStats {
    pub total_trips: usize,
    pub total_spent: f64,
    pub round_trip_spent: f64,
    pub counts: TripCounts,
    pub round_trips: usize,
    pub single_trips: usize,
    pub top_departure_cities: Vec<(String, usize)>,
    pub top_arrival_cities: Vec<(String, usize)>,
    pub top_routes: Vec<(String, usize)>,
    pub top_airlines: Vec<(String, usize)>,
}

impl TripStats {
    pub fn compute(trips: &[TripRecord], pairs: &[RoundTripPair]) -> Self {
        Self {
            total_trips: trips.len(),
            total_spent: total_spent(trips),
            round_trip_spent: round_trip_spent(pairs),
            counts: trip_counts(trips),
            round_trips: pairs.len(),
            single_trips: trips.len().saturating_sub(pairs.len() * 2),
            top_departure_cities: top_departure_cities(trips),
            top_arrival_cities: top_arrival_cities(trips),
            top_routes: top_routes(pairs),
            top_airlines: top_airlines(trips),
        }
    }
}

pub fn total_spent(trips: &[TripRecord]) -> f64 {
    trips.iter().map(|t| t.price).sum()
}

pub fn round_trip_spent(pairs: &[RoundTripPair]) -> f64 {
    pairs.iter().map(|p| p.total_price).sum()
}

pub fn trip_counts(trips: &[TripRecord]) -> TripCounts {
    trips.iter().fold(TripCounts::default(), |mut counts, trip| {
        match trip.trip_type {
            TripType::Flight => counts.flight += 1,
            TripType::Train => counts.train += 1,
        }
        counts
    })
}

pub fn top_departure_cities(trips: &[TripRecord]) -> Vec<(String, usize)> {
    top_n(trips.iter().map(|t| t.departure.city.as_str()), TOP_N)
}

pub fn top_arrival_cities(trips: &[TripRecord]) -> Vec<(String, usize)> {
    top_n(trips.iter().map(|t| t.arrival.city.as_str()), TOP_N)
}

pub fn top_routes(pairs: &[RoundTripPair]) -> Vec<(String, usize)> {
    top_n(pairs.iter().map(|p| p.route.as_str()), TOP_N)
}

pub fn top_airlines(trips: &[TripRecord]) -> Vec<(String, usize)> {
    top_n(trips.iter().filter_map(|t| t.airline.as_deref()), TOP_N)
}

/// Count occurrences, skipping blanks. Ties keep first-seen order.
fn top_n<'a>(items: impl Iterator<Item = &'a str>, n: usize) -> Vec<(String, usize)> {
    let mut slots: HashMap<&'a str, usize> = HashMap::new();
    let mut tally: Vec<(&'a str, usize)> = Vec::new();
    for item in items.map(str::trim).filter(|s| !s.is_empty()) {
        match slots.get(item) {
            Some(&slot) => tally[slot].1 += 1,
            None => {
                slots.insert(item, tally.len());
                tally.push((item, 1));
            }
        }
    }
    tally.sort_by(|a, b| b.1.cmp(&a.1));
    tally
        .into_iter()
        .take(n)
        .map(|(name, count)| (name.to_string(), count))
        .collect()
}

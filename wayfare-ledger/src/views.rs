use chrono::NaiveDate;
use serde::Serialize;
use wayfare_shared::TripRecord;

use crate::linker::{Reconciliation, RoundTripPair};

/// Newest first; equal dates keep collection order.
pub fn sorted_trips(trips: &[TripRecord]) -> Vec<TripRecord> {
    let mut sorted = trips.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted
}

/// One row of the combined timeline
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TimelineEntry {
    Single(TripRecord),
    RoundTrip(RoundTripPair),
}

impl TimelineEntry {
    /// Pairs sort by their outbound leg.
    pub fn date(&self) -> NaiveDate {
        match self {
            TimelineEntry::Single(trip) => trip.date,
            TimelineEntry::RoundTrip(pair) => pair.outbound.date,
        }
    }
}

/// Singles and pairs interleaved, newest first. Singles precede pairs on equal dates.
pub fn merged_chronological(reconciliation: &Reconciliation) -> Vec<TimelineEntry> {
    let mut entries: Vec<TimelineEntry> = reconciliation
        .singles
        .iter()
        .cloned()
        .map(TimelineEntry::Single)
        .chain(reconciliation.pairs.iter().cloned().map(TimelineEntry::RoundTrip))
        .collect();
    entries.sort_by(|a, b| b.date().cmp(&a.date()));
    entries
}

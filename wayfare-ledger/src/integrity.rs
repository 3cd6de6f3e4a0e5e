use std::collections::HashSet;
use tracing::warn;
use wayfare_shared::TripRecord;

/// Give every repeated id after its first occurrence a fresh one.
/// Returns whether anything was rewritten.
pub fn fix_duplicate_ids(trips: &mut [TripRecord]) -> bool {
    let mut taken: HashSet<String> = trips.iter().map(|t| t.id.clone()).collect();
    let mut seen: HashSet<String> = HashSet::with_capacity(trips.len());
    let mut repaired = false;

    for trip in trips.iter_mut() {
        if seen.insert(trip.id.clone()) {
            continue;
        }
        let fresh = loop {
            let candidate = TripRecord::generate_id();
            if !taken.contains(&candidate) {
                break candidate;
            }
        };
        warn!("Duplicate trip id {} reassigned to {}", trip.id, fresh);
        taken.insert(fresh.clone());
        seen.insert(fresh.clone());
        trip.id = fresh;
        repaired = true;
    }
    repaired
}

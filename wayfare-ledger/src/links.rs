//! Link state of a trip collection: round-trip links and manual exclusions.
//! Every write here keeps both sides of a link or exclusion in step.

use std::cmp::Ordering;
use wayfare_shared::{LinkRole, RoundTripLink, TripRecord};

pub fn position(trips: &[TripRecord], id: &str) -> Option<usize> {
    trips.iter().position(|trip| trip.id == id)
}

/// Earlier date is outbound; equal dates fall back to id order.
pub fn roles_for(a: &TripRecord, b: &TripRecord) -> (LinkRole, LinkRole) {
    let order = a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id));
    match order {
        Ordering::Greater => (LinkRole::Return, LinkRole::Outbound),
        _ => (LinkRole::Outbound, LinkRole::Return),
    }
}

/// True when `b` points back at `a` with the role opposite to `a`'s.
pub fn reciprocates(a: &TripRecord, b: &TripRecord) -> bool {
    match (&a.round_trip, &b.round_trip) {
        (Some(la), Some(lb)) => {
            la.linked_trip_id == b.id && lb.linked_trip_id == a.id && la.role == lb.role.opposite()
        }
        _ => false,
    }
}

/// Link the records at `a` and `b`, roles by chronology.
pub fn write_link(trips: &mut [TripRecord], a: usize, b: usize) {
    let (role_a, role_b) = roles_for(&trips[a], &trips[b]);
    let id_a = trips[a].id.clone();
    let id_b = trips[b].id.clone();
    trips[a].round_trip = Some(RoundTripLink {
        linked_trip_id: id_b,
        role: role_a,
    });
    trips[b].round_trip = Some(RoundTripLink {
        linked_trip_id: id_a,
        role: role_b,
    });
}

/// Drop the link held at `idx`, and the partner's back-reference if it has one.
/// Returns the partner id the record pointed at.
pub fn sever(trips: &mut [TripRecord], idx: usize) -> Option<String> {
    let link = trips[idx].round_trip.take()?;
    let own_id = trips[idx].id.clone();
    if let Some(partner) = trips.iter_mut().find(|t| t.id == link.linked_trip_id) {
        if partner.linked_trip_id() == Some(own_id.as_str()) {
            partner.round_trip = None;
        }
    }
    Some(link.linked_trip_id)
}

pub fn add_exclusion(trip: &mut TripRecord, other_id: &str) {
    if !trip.is_excluded_from(other_id) {
        trip.manually_unlinked_from.push(other_id.to_string());
    }
}

pub fn remove_exclusion(trip: &mut TripRecord, other_id: &str) {
    trip.manually_unlinked_from.retain(|id| id != other_id);
}

/// Forget every reference to a record that is about to disappear.
pub fn forget(trips: &mut [TripRecord], id: &str) {
    for trip in trips.iter_mut() {
        remove_exclusion(trip, id);
        if trip.linked_trip_id() == Some(id) {
            trip.round_trip = None;
        }
    }
}

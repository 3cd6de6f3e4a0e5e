use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};
use wayfare_shared::{LinkRole, TripRecord};

use crate::links;

/// Maximum distance in days between the two legs of an inferred round trip.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Two legs presented together. Derived on demand, never stored.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoundTripPair {
    pub outbound: TripRecord,
    #[serde(rename = "return")]
    pub return_trip: TripRecord,
    pub total_price: f64,
    pub route: String,
}

impl RoundTripPair {
    pub fn new(outbound: TripRecord, return_trip: TripRecord) -> Self {
        Self {
            total_price: outbound.price + return_trip.price,
            route: outbound.route_label(),
            outbound,
            return_trip,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.outbound.id == id || self.return_trip.id == id
    }
}

/// Outcome of a full reconciliation pass
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub pairs: Vec<RoundTripPair>,
    /// Unpaired records, in collection order.
    pub singles: Vec<TripRecord>,
    /// Pairs inferred during this pass.
    pub new_links: usize,
    /// One-sided or mismatched links dropped during this pass.
    pub healed: usize,
}

impl Reconciliation {
    pub fn requires_persist(&self) -> bool {
        self.new_links > 0 || self.healed > 0
    }
}

/// Infers and maintains round-trip links over a trip collection
#[derive(Debug, Clone, Copy)]
pub struct RoundTripLinker {
    window_days: i64,
}

impl Default for RoundTripLinker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_DAYS)
    }
}

impl RoundTripLinker {
    pub fn new(window_days: i64) -> Self {
        Self {
            window_days: window_days.max(0),
        }
    }

    pub fn window_days(&self) -> i64 {
        self.window_days
    }

    /// Route mirrors, no conflicting link, no exclusion either way, dates within the window.
    pub fn is_linkable(&self, a: &TripRecord, b: &TripRecord) -> bool {
        let free_for = |trip: &TripRecord, other: &TripRecord| {
            trip.linked_trip_id().map_or(true, |id| id == other.id)
        };
        a.is_routable_with(b)
            && free_for(a, b)
            && free_for(b, a)
            && !a.is_excluded_from(&b.id)
            && !b.is_excluded_from(&a.id)
            && a.days_apart(b) <= self.window_days
    }

    /// Partition the collection into pairs and singles.
    ///
    /// Complete cached links are trusted as-is. Anything else carrying a link
    /// is stripped of it and treated as free. Free records are then matched
    /// greedily, most recent first, each against the first linkable record
    /// that follows it in that order. New links are written into `trips`.
    pub fn reconcile(&self, trips: &mut [TripRecord]) -> Reconciliation {
        let mut result = Reconciliation::default();
        let mut consumed = vec![false; trips.len()];

        let mut index: HashMap<&str, usize> = HashMap::with_capacity(trips.len());
        for (idx, trip) in trips.iter().enumerate() {
            index.entry(trip.id.as_str()).or_insert(idx);
        }
        let mut cached: Vec<(usize, usize)> = Vec::new();
        for (idx, trip) in trips.iter().enumerate() {
            if consumed[idx] {
                continue;
            }
            let Some(partner_id) = trip.linked_trip_id() else {
                continue;
            };
            match index.get(partner_id) {
                Some(&partner) if partner != idx && !consumed[partner] && links::reciprocates(trip, &trips[partner]) => {
                    consumed[idx] = true;
                    consumed[partner] = true;
                    cached.push((idx, partner));
                }
                _ => {}
            }
        }
        drop(index);

        for (a, b) in cached {
            result.pairs.push(self.pair_of(trips, a, b));
        }

        for (idx, trip) in trips.iter_mut().enumerate() {
            if !consumed[idx] && trip.round_trip.take().is_some() {
                debug!("Dropping unreciprocated link on trip {}", trip.id);
                result.healed += 1;
            }
        }

        let mut free: Vec<usize> = (0..trips.len()).filter(|&idx| !consumed[idx]).collect();
        free.sort_by(|&a, &b| trips[b].date.cmp(&trips[a].date));

        for x in 0..free.len() {
            if consumed[free[x]] {
                continue;
            }
            for y in (x + 1)..free.len() {
                if consumed[free[y]] || !self.is_linkable(&trips[free[x]], &trips[free[y]]) {
                    continue;
                }
                links::write_link(trips, free[x], free[y]);
                consumed[free[x]] = true;
                consumed[free[y]] = true;
                result.pairs.push(self.pair_of(trips, free[x], free[y]));
                result.new_links += 1;
                break;
            }
        }

        result.singles = trips
            .iter()
            .zip(consumed.iter())
            .filter(|(_, used)| !**used)
            .map(|(trip, _)| trip.clone())
            .collect();

        if result.requires_persist() {
            info!(
                "Reconciled {} round trip(s), {} new, {} stale link(s) dropped",
                result.pairs.len(),
                result.new_links,
                result.healed
            );
        }
        result
    }

    /// Try to pair a freshly inserted record with an existing unlinked one.
    /// Returns whether a link was formed.
    pub fn link_on_insert(&self, trips: &mut [TripRecord], new_id: &str) -> bool {
        let Some(new_idx) = links::position(trips, new_id) else {
            return false;
        };
        if trips[new_idx].is_linked() {
            return false;
        }
        let candidate = (0..trips.len()).find(|&idx| {
            idx != new_idx && !trips[idx].is_linked() && self.is_linkable(&trips[new_idx], &trips[idx])
        });
        match candidate {
            Some(partner) => {
                links::write_link(trips, new_idx, partner);
                info!("Linked new trip {} with {}", new_id, trips[partner].id);
                true
            }
            None => false,
        }
    }

    /// Force a link between two records, ignoring the window and any earlier state.
    pub fn link_trips(&self, trips: &mut [TripRecord], id_a: &str, id_b: &str) -> bool {
        if id_a == id_b {
            return false;
        }
        let (Some(a), Some(b)) = (links::position(trips, id_a), links::position(trips, id_b)) else {
            return false;
        };
        self.clear_link_silently(trips, id_a);
        self.clear_link_silently(trips, id_b);
        links::remove_exclusion(&mut trips[a], id_b);
        links::remove_exclusion(&mut trips[b], id_a);
        links::write_link(trips, a, b);
        info!("Manually linked trips {} and {}", id_a, id_b);
        true
    }

    /// Unlink and record a mutual exclusion so inference won't re-pair them.
    /// Returns false when the record is missing or holds no link.
    pub fn clear_link(&self, trips: &mut [TripRecord], id: &str) -> bool {
        let Some(idx) = links::position(trips, id) else {
            return false;
        };
        let Some(partner_id) = links::sever(trips, idx) else {
            return false;
        };
        links::add_exclusion(&mut trips[idx], &partner_id);
        if let Some(partner) = links::position(trips, &partner_id) {
            links::add_exclusion(&mut trips[partner], id);
        }
        info!("Unlinked trips {} and {}", id, partner_id);
        true
    }

    /// Unlink without recording an exclusion.
    pub fn clear_link_silently(&self, trips: &mut [TripRecord], id: &str) -> bool {
        match links::position(trips, id) {
            Some(idx) => links::sever(trips, idx).is_some(),
            None => false,
        }
    }

    /// Candidates for a manual link picker, earliest first. Exclusions are
    /// ignored here so the user can revisit an earlier decision.
    pub fn available_link_targets(&self, trips: &[TripRecord], id: &str, day_window: i64) -> Vec<TripRecord> {
        let Some(trip) = trips.iter().find(|t| t.id == id) else {
            return Vec::new();
        };
        let mut targets: Vec<TripRecord> = trips
            .iter()
            .filter(|other| {
                trip.is_routable_with(other) && !other.is_linked() && trip.days_apart(other) <= day_window
            })
            .cloned()
            .collect();
        targets.sort_by(|a, b| a.date.cmp(&b.date));
        targets
    }

    fn pair_of(&self, trips: &[TripRecord], a: usize, b: usize) -> RoundTripPair {
        let a_is_outbound = trips[a]
            .round_trip
            .as_ref()
            .map_or(true, |link| link.role == LinkRole::Outbound);
        if a_is_outbound {
            RoundTripPair::new(trips[a].clone(), trips[b].clone())
        } else {
            RoundTripPair::new(trips[b].clone(), trips[a].clone())
        }
    }
}

use tracing::{debug, info, warn};
use wayfare_core::{BlobStore, TRAVELERS_KEY, TRIPS_KEY};
use wayfare_shared::{AiConfig, NewTrip, SyncDocument, TravelerConfig, TripRecord, TripUpdate};

use crate::integrity::fix_duplicate_ids;
use crate::linker::{Reconciliation, RoundTripLinker, RoundTripPair};
use crate::links;
use crate::sample::{BuiltinSamples, SampleDataProvider};
use crate::stats::TripStats;
use crate::travelers::TravelerRegistry;
use crate::views::{self, TimelineEntry};

/// Result of applying a sync document
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    pub trips: usize,
    pub repaired_ids: bool,
    pub round_trips: usize,
    /// Recognition settings carried by the document, for the caller to store.
    pub ai_config: Option<AiConfig>,
}

/// Owns the trip collection and traveler registry.
///
/// Every public entry point loads lazily on first use, and every mutation
/// issues its save before returning. Save failures are logged, not raised.
pub struct TripRepository<S: BlobStore> {
    store: S,
    trips: Vec<TripRecord>,
    travelers: TravelerRegistry,
    linker: RoundTripLinker,
    samples: Box<dyn SampleDataProvider>,
    loaded: bool,
    repaired_on_load: bool,
}

impl<S: BlobStore> TripRepository<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            trips: Vec::new(),
            travelers: TravelerRegistry::default(),
            linker: RoundTripLinker::default(),
            samples: Box::new(BuiltinSamples),
            loaded: false,
            repaired_on_load: false,
        }
    }

    pub fn with_linker(mut self, linker: RoundTripLinker) -> Self {
        self.linker = linker;
        self
    }

    pub fn with_samples(mut self, samples: impl SampleDataProvider + 'static) -> Self {
        self.samples = Box::new(samples);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn linker(&self) -> &RoundTripLinker {
        &self.linker
    }

    /// Whether the load path had to rewrite duplicate ids.
    pub fn repaired_on_load(&mut self) -> bool {
        self.ensure_loaded();
        self.repaired_on_load
    }

    // ------------------------------------------------------------------
    // Loading and persistence
    // ------------------------------------------------------------------

    /// Load both keys once per repository lifetime.
    pub fn ensure_loaded(&mut self) {
        if self.loaded {
            return;
        }
        self.loaded = true;
        self.load_travelers();
        self.load_trips();
    }

    fn load_trips(&mut self) {
        let stored = match self.store.load(TRIPS_KEY) {
            Ok(stored) => stored,
            Err(err) => {
                warn!("Failed to read stored trips: {}", err);
                None
            }
        };
        let parsed = stored.and_then(|blob| match serde_json::from_str::<Vec<TripRecord>>(&blob) {
            Ok(trips) => Some(trips),
            Err(err) => {
                warn!("Stored trips are malformed, reseeding: {}", err);
                None
            }
        });

        match parsed {
            Some(trips) => {
                info!("Loaded {} trip(s) from storage", trips.len());
                let (repaired, reconciliation) = self.adopt(trips);
                self.repaired_on_load = repaired;
                if repaired || reconciliation.requires_persist() {
                    self.persist_trips();
                }
            }
            None => self.seed_samples(),
        }
    }

    fn load_travelers(&mut self) {
        let stored = match self.store.load(TRAVELERS_KEY) {
            Ok(stored) => stored,
            Err(err) => {
                warn!("Failed to read traveler registry: {}", err);
                None
            }
        };
        self.travelers = match stored.map(|blob| serde_json::from_str::<TravelerConfig>(&blob)) {
            Some(Ok(config)) => TravelerRegistry::from_config(config),
            Some(Err(err)) => {
                warn!("Traveler registry is malformed, using default: {}", err);
                TravelerRegistry::default()
            }
            None => TravelerRegistry::default(),
        };
    }

    fn seed_samples(&mut self) {
        let samples = self.samples.sample_trips();
        info!("Seeding {} sample trip(s)", samples.len());
        let (repaired, _) = self.adopt(samples);
        self.repaired_on_load = repaired;
        self.persist_trips();
    }

    /// Install a collection from outside: normalize, dedupe ids, reconcile.
    /// Does not persist.
    fn adopt(&mut self, mut trips: Vec<TripRecord>) -> (bool, Reconciliation) {
        for trip in trips.iter_mut() {
            trip.price = trip.price.max(0.0);
            trip.normalize_travelers();
        }
        let repaired = fix_duplicate_ids(&mut trips);
        self.trips = trips;
        let reconciliation = self.linker.reconcile(&mut self.trips);
        (repaired, reconciliation)
    }

    fn persist_trips(&mut self) {
        match serde_json::to_string(&self.trips) {
            Ok(blob) => {
                if let Err(err) = self.store.save(TRIPS_KEY, &blob) {
                    warn!("Failed to persist trips: {}", err);
                }
            }
            Err(err) => warn!("Failed to serialize trips: {}", err),
        }
    }

    fn persist_travelers(&mut self) {
        match serde_json::to_string(&self.travelers.to_config()) {
            Ok(blob) => {
                if let Err(err) = self.store.save(TRAVELERS_KEY, &blob) {
                    warn!("Failed to persist traveler registry: {}", err);
                }
            }
            Err(err) => warn!("Failed to serialize traveler registry: {}", err),
        }
    }

    // ------------------------------------------------------------------
    // Trip CRUD
    // ------------------------------------------------------------------

    pub fn trips(&mut self) -> &[TripRecord] {
        self.ensure_loaded();
        &self.trips
    }

    pub fn get_trip_by_id(&mut self, id: &str) -> Option<&TripRecord> {
        self.ensure_loaded();
        self.trips.iter().find(|t| t.id == id)
    }

    /// Insert a new record and try to pair it straight away.
    pub fn add_trip(&mut self, trip: NewTrip) -> TripRecord {
        self.ensure_loaded();
        let mut record = TripRecord::new(trip);
        while self.trips.iter().any(|t| t.id == record.id) {
            record.id = TripRecord::generate_id();
        }
        let id = record.id.clone();
        let idx = self.trips.len();
        self.trips.push(record);

        if self.linker.link_on_insert(&mut self.trips, &id) {
            debug!("Trip {} joined a round trip on insert", id);
        }
        self.persist_trips();
        self.trips[idx].clone()
    }

    /// Remove a record; its partner, if any, becomes a single again.
    pub fn delete_trip(&mut self, id: &str) -> bool {
        self.ensure_loaded();
        let Some(idx) = links::position(&self.trips, id) else {
            return false;
        };
        self.linker.clear_link_silently(&mut self.trips, id);
        self.trips.remove(idx);
        links::forget(&mut self.trips, id);
        info!("Deleted trip {}", id);
        self.persist_trips();
        true
    }

    /// Apply a partial edit. Link fields are never touched.
    pub fn update_by_id(&mut self, id: &str, update: TripUpdate) -> bool {
        self.ensure_loaded();
        let Some(trip) = self.trips.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        update.apply_to(trip);
        self.persist_trips();
        true
    }

    /// Replace a record's editable fields with those of `record`, matched by id.
    /// `created_at` and link state stay as stored.
    pub fn update_whole(&mut self, mut record: TripRecord) -> bool {
        self.ensure_loaded();
        let Some(existing) = self.trips.iter_mut().find(|t| t.id == record.id) else {
            return false;
        };
        record.created_at = existing.created_at;
        record.round_trip = existing.round_trip.take();
        record.manually_unlinked_from = std::mem::take(&mut existing.manually_unlinked_from);
        record.price = record.price.max(0.0);
        record.normalize_travelers();
        *existing = record;
        self.persist_trips();
        true
    }

    pub fn clear_all_trips(&mut self) {
        self.ensure_loaded();
        self.trips.clear();
        self.persist_trips();
    }

    /// Replace the collection with the seed set.
    pub fn load_sample_data(&mut self) {
        self.ensure_loaded();
        self.seed_samples();
    }

    /// Run the duplicate-id guard on demand. Persists when it changed anything.
    pub fn fix_duplicate_ids(&mut self) -> bool {
        self.ensure_loaded();
        let repaired = fix_duplicate_ids(&mut self.trips);
        if repaired {
            self.persist_trips();
        }
        repaired
    }

    // ------------------------------------------------------------------
    // Round trips
    // ------------------------------------------------------------------

    /// Current pairs/singles partition. Persists only if new links were formed
    /// or stale ones dropped.
    pub fn reconcile(&mut self) -> Reconciliation {
        self.ensure_loaded();
        let reconciliation = self.linker.reconcile(&mut self.trips);
        if reconciliation.requires_persist() {
            self.persist_trips();
        }
        reconciliation
    }

    pub fn round_trips(&mut self) -> Vec<RoundTripPair> {
        self.reconcile().pairs
    }

    pub fn single_trips(&mut self) -> Vec<TripRecord> {
        self.reconcile().singles
    }

    pub fn link_trips(&mut self, id_a: &str, id_b: &str) -> bool {
        self.ensure_loaded();
        if !self.linker.link_trips(&mut self.trips, id_a, id_b) {
            return false;
        }
        self.persist_trips();
        true
    }

    /// Unlink and remember not to pair the two again.
    pub fn clear_link(&mut self, id: &str) -> bool {
        self.ensure_loaded();
        if !self.linker.clear_link(&mut self.trips, id) {
            return false;
        }
        self.persist_trips();
        true
    }

    /// Link targets within the configured window.
    pub fn available_link_targets(&mut self, id: &str) -> Vec<TripRecord> {
        let window = self.linker.window_days();
        self.available_link_targets_within(id, window)
    }

    pub fn available_link_targets_within(&mut self, id: &str, day_window: i64) -> Vec<TripRecord> {
        self.ensure_loaded();
        self.linker.available_link_targets(&self.trips, id, day_window)
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    pub fn sorted_trips(&mut self) -> Vec<TripRecord> {
        self.ensure_loaded();
        views::sorted_trips(&self.trips)
    }

    pub fn merged_chronological(&mut self) -> Vec<TimelineEntry> {
        let reconciliation = self.reconcile();
        views::merged_chronological(&reconciliation)
    }

    pub fn stats(&mut self) -> TripStats {
        let reconciliation = self.reconcile();
        TripStats::compute(&self.trips, &reconciliation.pairs)
    }

    // ------------------------------------------------------------------
    // Travelers
    // ------------------------------------------------------------------

    pub fn travelers(&mut self) -> &[String] {
        self.ensure_loaded();
        self.travelers.names()
    }

    pub fn add_traveler(&mut self, name: &str) -> bool {
        self.ensure_loaded();
        if !self.travelers.add(name) {
            return false;
        }
        self.persist_travelers();
        true
    }

    pub fn remove_traveler(&mut self, name: &str) -> bool {
        self.ensure_loaded();
        if !self.travelers.remove(name) {
            return false;
        }
        self.persist_travelers();
        true
    }

    // ------------------------------------------------------------------
    // Sync documents
    // ------------------------------------------------------------------

    pub fn export_document(&mut self, ai_config: Option<AiConfig>) -> SyncDocument {
        self.ensure_loaded();
        SyncDocument::new(self.trips.clone(), ai_config, Some(self.travelers.to_config()))
    }

    /// Replace local state with a downloaded document. The trips go through
    /// the same guard and reconciliation as a local load.
    pub fn import_document(&mut self, document: SyncDocument) -> ImportOutcome {
        self.ensure_loaded();
        let (repaired, reconciliation) = self.adopt(document.trips);
        self.persist_trips();

        if let Some(config) = document.traveler_config {
            self.travelers = TravelerRegistry::from_config(config);
            self.persist_travelers();
        }
        info!(
            "Imported {} trip(s), {} round trip(s)",
            self.trips.len(),
            reconciliation.pairs.len()
        );

        ImportOutcome {
            trips: self.trips.len(),
            repaired_ids: repaired,
            round_trips: reconciliation.pairs.len(),
            ai_config: document.ai_config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::NoSamples;
    use crate::testing::trip;
    use wayfare_core::MemoryStore;
    use wayfare_shared::{Endpoint, TripType, SELF_TRAVELER};

    fn store_with(trips: &[TripRecord]) -> MemoryStore {
        MemoryStore::new().with_blob(TRIPS_KEY, serde_json::to_string(trips).unwrap())
    }

    fn new_trip(date: &str, from: &str, to: &str) -> NewTrip {
        NewTrip::new(TripType::Flight, Endpoint::new("", from, ""), Endpoint::new("", to, ""))
            .with_date(crate::testing::day(date))
            .with_price(500.0)
    }

    #[test]
    fn test_first_run_seeds_and_links_samples() {
        let mut repo = TripRepository::new(MemoryStore::new());

        assert_eq!(repo.trips().len(), 7);
        assert_eq!(repo.store().save_count(), 1);
        let stored: Vec<TripRecord> =
            serde_json::from_str(repo.store().blob(TRIPS_KEY).unwrap()).unwrap();
        assert_eq!(stored.iter().filter(|t| t.is_linked()).count(), 6);
    }

    #[test]
    fn test_malformed_blobs_fall_back() {
        let store = MemoryStore::new()
            .with_blob(TRIPS_KEY, "{not json")
            .with_blob(TRAVELERS_KEY, "42");
        let mut repo = TripRepository::new(store).with_samples(NoSamples);

        assert!(repo.trips().is_empty());
        assert_eq!(repo.travelers(), &[SELF_TRAVELER.to_string()]);
    }

    #[test]
    fn test_record_without_date_keeps_collection() {
        let blob = r#"[
            {"id":"u1","type":"flight","departure":{"time":"2025-01-10T08:00","city":"Beijing","station":""},
             "arrival":{"time":"","city":"Shanghai","station":""},"price":-20,"createdAt":"2025-01-01T00:00:00Z"},
            {"id":"u2","type":"flight","date":"2025-01-15","departure":{"time":"","city":"Shanghai","station":""},
             "arrival":{"time":"","city":"Beijing","station":""},"price":600,"createdAt":"2025-01-01T00:00:00Z"}
        ]"#;
        let mut repo = TripRepository::new(MemoryStore::new().with_blob(TRIPS_KEY, blob)).with_samples(NoSamples);

        assert_eq!(repo.trips().len(), 2);
        let u1 = repo.get_trip_by_id("u1").unwrap().clone();
        assert_eq!(u1.date, crate::testing::day("2025-01-10"));
        assert_eq!(u1.price, 0.0);

        let pairs = repo.round_trips();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].outbound.id, "u1");

        let stored: Vec<TripRecord> = serde_json::from_str(repo.store().blob(TRIPS_KEY).unwrap()).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].date, u1.date);
    }

    #[test]
    fn test_import_clamps_negative_prices() {
        let mut cheap = trip("1", "2025-01-10", "Beijing", "Shanghai");
        cheap.price = -1.0;
        let mut repo = TripRepository::new(MemoryStore::new()).with_samples(NoSamples);

        repo.import_document(SyncDocument::new(vec![cheap], None, None));
        assert_eq!(repo.get_trip_by_id("1").unwrap().price, 0.0);
    }

    #[test]
    fn test_clean_load_does_not_persist() {
        let mut trips = vec![
            trip("1", "2025-01-10", "Beijing", "Shanghai"),
            trip("2", "2025-01-15", "Shanghai", "Beijing"),
        ];
        RoundTripLinker::default().reconcile(&mut trips);
        let mut repo = TripRepository::new(store_with(&trips));

        assert_eq!(repo.round_trips().len(), 1);
        assert_eq!(repo.store().save_count(), 0);
        assert!(!repo.repaired_on_load());
    }

    #[test]
    fn test_add_trip_links_and_persists_once() {
        let mut repo = TripRepository::new(MemoryStore::new()).with_samples(NoSamples);
        repo.ensure_loaded();
        let saves = repo.store().save_count();

        let out = repo.add_trip(new_trip("2025-03-01", "Chengdu", "Xian"));
        assert!(!out.is_linked());
        let back = repo.add_trip(new_trip("2025-03-05", "Xian", "Chengdu"));

        assert_eq!(back.linked_trip_id(), Some(out.id.as_str()));
        assert_eq!(repo.get_trip_by_id(&out.id).unwrap().linked_trip_id(), Some(back.id.as_str()));
        assert_eq!(repo.store().save_count(), saves + 2);
    }

    #[test]
    fn test_delete_unlinks_partner() {
        let mut trips = vec![
            trip("1", "2025-01-10", "Beijing", "Shanghai"),
            trip("2", "2025-01-15", "Shanghai", "Beijing"),
            trip("3", "2025-01-16", "Shanghai", "Beijing"),
        ];
        links::add_exclusion(&mut trips[2], "1");
        links::add_exclusion(&mut trips[0], "3");
        let mut repo = TripRepository::new(store_with(&trips));
        repo.reconcile();

        assert!(repo.delete_trip("1"));
        assert!(!repo.delete_trip("1"));
        assert!(!repo.get_trip_by_id("2").unwrap().is_linked());
        assert!(repo.get_trip_by_id("3").unwrap().manually_unlinked_from.is_empty());
        assert_eq!(repo.single_trips().len(), 2);
    }

    #[test]
    fn test_updates_preserve_links() {
        let trips = vec![
            trip("1", "2025-01-10", "Beijing", "Shanghai"),
            trip("2", "2025-01-15", "Shanghai", "Beijing"),
        ];
        let mut repo = TripRepository::new(store_with(&trips));
        repo.reconcile();

        assert!(repo.update_by_id(
            "1",
            TripUpdate {
                price: Some(999.0),
                ..Default::default()
            }
        ));
        assert!(!repo.update_by_id("missing", TripUpdate::default()));

        let mut replacement = trip("2", "2025-01-16", "Shanghai", "Beijing");
        replacement.notes = Some("window seat".to_string());
        assert!(repo.update_whole(replacement));

        let two = repo.get_trip_by_id("2").unwrap();
        assert_eq!(two.linked_trip_id(), Some("1"));
        assert_eq!(two.notes.as_deref(), Some("window seat"));
        assert_eq!(repo.get_trip_by_id("1").unwrap().price, 999.0);
        assert_eq!(repo.round_trips().len(), 1);
    }

    #[test]
    fn test_failed_saves_do_not_break_state() {
        let mut store = MemoryStore::new();
        store.set_failing(true);
        let mut repo = TripRepository::new(store).with_samples(NoSamples);

        let added = repo.add_trip(new_trip("2025-03-01", "A", "B"));
        assert_eq!(repo.trips().len(), 1);
        assert_eq!(repo.trips()[0].id, added.id);
        assert!(repo.store().save_count() >= 1);
    }

    #[test]
    fn test_traveler_registry_round_trip() {
        let mut repo = TripRepository::new(MemoryStore::new()).with_samples(NoSamples);
        assert!(repo.add_traveler("Alice"));
        assert!(!repo.remove_traveler(SELF_TRAVELER));

        let blob = repo.store().blob(TRAVELERS_KEY).unwrap().to_string();
        let mut reopened =
            TripRepository::new(MemoryStore::new().with_blob(TRAVELERS_KEY, blob)).with_samples(NoSamples);
        assert_eq!(reopened.travelers(), &[SELF_TRAVELER.to_string(), "Alice".to_string()]);
    }

    #[test]
    fn test_clear_all_and_reload_samples() {
        let mut repo = TripRepository::new(MemoryStore::new());
        repo.clear_all_trips();
        assert!(repo.trips().is_empty());
        assert_eq!(repo.store().blob(TRIPS_KEY), Some("[]"));

        repo.load_sample_data();
        assert_eq!(repo.round_trips().len(), 3);
    }
}

pub mod integrity;
pub mod linker;
mod links;
pub mod repository;
pub mod sample;
pub mod stats;
pub mod sync_service;
pub mod travelers;
pub mod views;

pub use integrity::fix_duplicate_ids;
pub use linker::{Reconciliation, RoundTripLinker, RoundTripPair, DEFAULT_WINDOW_DAYS};
pub use repository::{ImportOutcome, TripRepository};
pub use sample::{BuiltinSamples, NoSamples, SampleDataProvider};
pub use stats::{TripCounts, TripStats};
pub use sync_service::SyncService;
pub use travelers::TravelerRegistry;
pub use views::TimelineEntry;

#[cfg(test)]
pub(crate) mod testing;

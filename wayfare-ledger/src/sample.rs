use tracing::warn;
use wayfare_shared::TripRecord;

const BUILTIN_SAMPLE_TRIPS: &str = include_str!("../data/sample_trips.json");

/// Seed data used when no collection has ever been stored
pub trait SampleDataProvider: Send {
    fn sample_trips(&self) -> Vec<TripRecord>;
}

/// The bundled demo trips
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinSamples;

impl SampleDataProvider for BuiltinSamples {
    fn sample_trips(&self) -> Vec<TripRecord> {
        match serde_json::from_str::<Vec<TripRecord>>(BUILTIN_SAMPLE_TRIPS) {
            Ok(trips) => trips,
            Err(err) => {
                warn!("Bundled sample trips are unreadable: {}", err);
                Vec::new()
            }
        }
    }
}

/// No seed data at all
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSamples;

impl SampleDataProvider for NoSamples {
    fn sample_trips(&self) -> Vec<TripRecord> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linker::RoundTripLinker;

    #[test]
    fn test_builtin_samples_pair_up() {
        let mut trips = BuiltinSamples.sample_trips();
        assert_eq!(trips.len(), 7);

        let result = RoundTripLinker::default().reconcile(&mut trips);

        // The July flight 3 (Shanghai→Beijing) is newer than train 7 and
        // claims train 6 first, so 7 is left over.
        assert_eq!(result.pairs.len(), 3);
        assert_eq!(result.singles.len(), 1);
        assert_eq!(result.singles[0].id, "7");
        assert!(result.pairs.iter().any(|p| p.outbound.id == "6" && p.return_trip.id == "3"));
    }
}

pub mod models;
pub mod pii;

pub use models::sync::{AiConfig, SyncDocument, TravelerConfig, WebDavConfig};
pub use models::trip::{
    Endpoint, LinkRole, NewTrip, RoundTripLink, TripRecord, TripType, TripUpdate, SELF_TRAVELER,
};
pub use pii::Masked;

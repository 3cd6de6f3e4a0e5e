use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Implicit traveler present on every record unless told otherwise.
pub const SELF_TRAVELER: &str = "我";

fn default_travelers() -> Vec<String> {
    vec![SELF_TRAVELER.to_string()]
}

/// Mode of transport for a single leg
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TripType {
    Flight,
    Train,
}

/// One end of a journey. Empty strings mean "unknown".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Endpoint {
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub station: String,
}

impl Endpoint {
    pub fn new(time: impl Into<String>, city: impl Into<String>, station: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            city: city.into(),
            station: station.into(),
        }
    }
}

/// Role of a leg inside a round trip
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LinkRole {
    Outbound,
    Return,
}

impl LinkRole {
    pub fn opposite(self) -> Self {
        match self {
            LinkRole::Outbound => LinkRole::Return,
            LinkRole::Return => LinkRole::Outbound,
        }
    }
}

/// Confirmed round-trip partner of a record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundTripLink {
    pub linked_trip_id: String,
    #[serde(rename = "type")]
    pub role: LinkRole,
}

/// A single one-way journey as persisted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", from = "StoredTrip")]
pub struct TripRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub trip_type: TripType,
    pub date: NaiveDate,
    pub departure: Endpoint,
    pub arrival: Endpoint,
    #[serde(default)]
    pub price: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default = "default_travelers")]
    pub travelers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_trip: Option<RoundTripLink>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manually_unlinked_from: Vec<String>,
}

impl TripRecord {
    /// Materialize a new record, assigning `id` and `created_at`.
    pub fn new(trip: NewTrip) -> Self {
        let now = Utc::now();
        let date = trip.resolved_date(now.date_naive());
        let mut record = Self {
            id: Self::generate_id(),
            trip_type: trip.trip_type,
            date,
            departure: trip.departure,
            arrival: trip.arrival,
            price: trip.price.max(0.0),
            created_at: now,
            airline: trip.airline,
            flight_number: trip.flight_number,
            notes: trip.notes,
            travelers: trip.travelers,
            round_trip: None,
            manually_unlinked_from: Vec::new(),
        };
        record.normalize_travelers();
        record
    }

    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn is_linked(&self) -> bool {
        self.round_trip.is_some()
    }

    pub fn linked_trip_id(&self) -> Option<&str> {
        self.round_trip.as_ref().map(|link| link.linked_trip_id.as_str())
    }

    pub fn is_excluded_from(&self, other_id: &str) -> bool {
        self.manually_unlinked_from.iter().any(|id| id == other_id)
    }

    /// A→B and B→A, compared on city strings as-is.
    pub fn is_routable_with(&self, other: &TripRecord) -> bool {
        self.id != other.id
            && self.departure.city == other.arrival.city
            && self.arrival.city == other.departure.city
    }

    pub fn days_apart(&self, other: &TripRecord) -> i64 {
        self.date.signed_duration_since(other.date).num_days().abs()
    }

    /// `"<departure> ⇄ <arrival>"`
    pub fn route_label(&self) -> String {
        format!("{} ⇄ {}", self.departure.city, self.arrival.city)
    }

    /// Drops blank and duplicate names; an empty list becomes the self traveler.
    pub fn normalize_travelers(&mut self) {
        let mut seen: Vec<String> = Vec::with_capacity(self.travelers.len());
        for name in self.travelers.drain(..) {
            let name = name.trim().to_string();
            if !name.is_empty() && !seen.contains(&name) {
                seen.push(name);
            }
        }
        if seen.is_empty() {
            seen = default_travelers();
        }
        self.travelers = seen;
    }
}

/// Wire shape of a stored record. Older data may lack `date` or carry it
/// blank, and prices from other clients are not trusted to be non-negative.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTrip {
    id: String,
    #[serde(rename = "type")]
    trip_type: TripType,
    #[serde(default)]
    date: Option<String>,
    departure: Endpoint,
    arrival: Endpoint,
    #[serde(default)]
    price: f64,
    created_at: DateTime<Utc>,
    #[serde(default)]
    airline: Option<String>,
    #[serde(default)]
    flight_number: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default = "default_travelers")]
    travelers: Vec<String>,
    #[serde(default)]
    round_trip: Option<RoundTripLink>,
    #[serde(default)]
    manually_unlinked_from: Vec<String>,
}

impl From<StoredTrip> for TripRecord {
    /// Missing date: departure time prefix, else the creation day.
    fn from(stored: StoredTrip) -> Self {
        let date = stored
            .date
            .as_deref()
            .and_then(|date| date_prefix(date.trim()))
            .or_else(|| date_prefix(&stored.departure.time))
            .unwrap_or_else(|| stored.created_at.date_naive());
        Self {
            id: stored.id,
            trip_type: stored.trip_type,
            date,
            departure: stored.departure,
            arrival: stored.arrival,
            price: stored.price.max(0.0),
            created_at: stored.created_at,
            airline: stored.airline,
            flight_number: stored.flight_number,
            notes: stored.notes,
            travelers: stored.travelers,
            round_trip: stored.round_trip,
            manually_unlinked_from: stored.manually_unlinked_from,
        }
    }
}

/// Input to the repository's add path. `date` falls back to the departure time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewTrip {
    #[serde(rename = "type")]
    pub trip_type: TripType,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub departure: Endpoint,
    #[serde(default)]
    pub arrival: Endpoint,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub airline: Option<String>,
    #[serde(default)]
    pub flight_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_travelers")]
    pub travelers: Vec<String>,
}

impl NewTrip {
    pub fn new(trip_type: TripType, departure: Endpoint, arrival: Endpoint) -> Self {
        Self {
            trip_type,
            date: None,
            departure,
            arrival,
            price: 0.0,
            airline: None,
            flight_number: None,
            notes: None,
            travelers: default_travelers(),
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    pub fn with_carrier(mut self, airline: impl Into<String>, flight_number: impl Into<String>) -> Self {
        self.airline = Some(airline.into());
        self.flight_number = Some(flight_number.into());
        self
    }

    /// Explicit date, else the `YYYY-MM-DD` prefix of the departure time, else `today`.
    pub fn resolved_date(&self, today: NaiveDate) -> NaiveDate {
        self.date
            .or_else(|| date_prefix(&self.departure.time))
            .unwrap_or(today)
    }
}

fn date_prefix(time: &str) -> Option<NaiveDate> {
    let prefix = time.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Partial edit of a record. Link fields are deliberately absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TripUpdate {
    #[serde(rename = "type")]
    pub trip_type: Option<TripType>,
    pub date: Option<NaiveDate>,
    pub departure: Option<Endpoint>,
    pub arrival: Option<Endpoint>,
    pub price: Option<f64>,
    pub airline: Option<String>,
    pub flight_number: Option<String>,
    pub notes: Option<String>,
    pub travelers: Option<Vec<String>>,
}

impl TripUpdate {
    pub fn apply_to(self, record: &mut TripRecord) {
        if let Some(trip_type) = self.trip_type {
            record.trip_type = trip_type;
        }
        if let Some(date) = self.date {
            record.date = date;
        }
        if let Some(departure) = self.departure {
            record.departure = departure;
        }
        if let Some(arrival) = self.arrival {
            record.arrival = arrival;
        }
        if let Some(price) = self.price {
            record.price = price.max(0.0);
        }
        if let Some(airline) = self.airline {
            record.airline = Some(airline);
        }
        if let Some(flight_number) = self.flight_number {
            record.flight_number = Some(flight_number);
        }
        if let Some(notes) = self.notes {
            record.notes = Some(notes);
        }
        if let Some(travelers) = self.travelers {
            record.travelers = travelers;
            record.normalize_travelers();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beijing_to_shanghai() -> NewTrip {
        NewTrip::new(
            TripType::Flight,
            Endpoint::new("2025-01-10T08:00", "北京", "北京首都T3"),
            Endpoint::new("2025-01-10T10:15", "上海", "上海虹桥T2"),
        )
    }

    #[test]
    fn test_date_derived_from_departure_time() {
        let today = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let trip = beijing_to_shanghai();
        assert_eq!(trip.resolved_date(today), NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());

        let mut untimed = beijing_to_shanghai();
        untimed.departure.time = "20:25".to_string();
        assert_eq!(untimed.resolved_date(today), today);
    }

    #[test]
    fn test_new_record_defaults() {
        let mut trip = beijing_to_shanghai().with_price(-10.0);
        trip.travelers = vec!["  ".to_string()];
        let record = TripRecord::new(trip);

        assert!(!record.id.is_empty());
        assert_eq!(record.price, 0.0);
        assert_eq!(record.travelers, vec![SELF_TRAVELER.to_string()]);
        assert!(!record.is_linked());
    }

    #[test]
    fn test_deserializes_legacy_record() {
        let json = r#"{
            "id": "1",
            "type": "flight",
            "date": "2025-07-27",
            "departure": { "time": "20:25", "city": "重庆", "station": "重庆江北T3" },
            "arrival": { "time": "23:15", "city": "北京", "station": "北京大兴" },
            "price": 1280,
            "createdAt": "2025-07-25T10:00:00Z",
            "airline": "中国南方航空",
            "flightNumber": "CZ3114",
            "roundTrip": { "linkedTripId": "2", "type": "return" }
        }"#;

        let record: TripRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.trip_type, TripType::Flight);
        assert_eq!(record.flight_number.as_deref(), Some("CZ3114"));
        assert_eq!(record.travelers, vec![SELF_TRAVELER.to_string()]);
        assert_eq!(record.linked_trip_id(), Some("2"));
        assert_eq!(record.round_trip.as_ref().unwrap().role, LinkRole::Return);
        assert!(record.manually_unlinked_from.is_empty());

        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["roundTrip"]["linkedTripId"], "2");
        assert!(out.get("manuallyUnlinkedFrom").is_none());
    }

    #[test]
    fn test_missing_or_blank_date_is_derived() {
        let json = r#"[
            {"id":"a","type":"train","departure":{"time":"2025-03-02T07:10","city":"成都","station":""},
             "arrival":{"time":"","city":"西安","station":""},"price":-5,"createdAt":"2025-02-20T09:00:00Z"},
            {"id":"b","type":"train","date":"","departure":{"time":"07:10","city":"西安","station":""},
             "arrival":{"time":"","city":"成都","station":""},"price":260,"createdAt":"2025-02-21T09:00:00Z"}
        ]"#;

        let records: Vec<TripRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());
        assert_eq!(records[0].price, 0.0);
        assert_eq!(records[1].date, NaiveDate::from_ymd_opt(2025, 2, 21).unwrap());
        assert_eq!(records[1].price, 260.0);

        let out = serde_json::to_value(&records[1]).unwrap();
        assert_eq!(out["date"], "2025-02-21");
    }

    #[test]
    fn test_routable_mirrors_cities() {
        let outbound = TripRecord::new(beijing_to_shanghai());
        let mut back = TripRecord::new(beijing_to_shanghai());
        std::mem::swap(&mut back.departure, &mut back.arrival);

        assert!(outbound.is_routable_with(&back));
        assert!(!outbound.is_routable_with(&outbound));
        assert_eq!(outbound.route_label(), "北京 ⇄ 上海");
    }

    #[test]
    fn test_update_leaves_link_fields_alone() {
        let mut record = TripRecord::new(beijing_to_shanghai());
        record.round_trip = Some(RoundTripLink {
            linked_trip_id: "other".to_string(),
            role: LinkRole::Outbound,
        });

        TripUpdate {
            price: Some(880.0),
            travelers: Some(vec!["Alice".to_string(), "Alice".to_string()]),
            ..Default::default()
        }
        .apply_to(&mut record);

        assert_eq!(record.price, 880.0);
        assert_eq!(record.travelers, vec!["Alice".to_string()]);
        assert_eq!(record.linked_trip_id(), Some("other"));
    }
}

//! Core types for Ridepath
//!
//! Defines the wire model shared with the ride backend:
//! - Cities and driver route definitions
//! - Optimized stops and attendance payloads
//! - ETA cache entries
//! - Chat snapshots used by polling screens
//!
//! All types serialize with `camelCase` field names to match the backend.

use crate::error::TooFewCities;
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backend identifier of a city
pub type CityId = i64;

/// Minimum number of cities in a route (start and destination)
pub const MIN_ROUTE_CITIES: usize = 2;

/// City reference data returned by city search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: CityId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl City {
    /// Create new city
    #[inline]
    #[must_use]
    pub fn new(id: CityId, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

/// A latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Create new coordinates
    #[inline]
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Kind of rides the driver offers on a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideType {
    School,
    Work,
    Both,
}

impl RideType {
    /// Wire name of the ride type
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RideType::School => "school",
            RideType::Work => "work",
            RideType::Both => "both",
        }
    }
}

impl fmt::Display for RideType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RideType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "school" => Ok(RideType::School),
            "work" => Ok(RideType::Work),
            "both" => Ok(RideType::Both),
            other => Err(format!("unknown ride type: {other}")),
        }
    }
}

/// Route configured by the driver, persisted by the backend
///
/// `city_ids` is the travel order: first is the start, last the destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawRouteDefinition")]
pub struct RouteDefinition {
    city_ids: Vec<CityId>,
    ride_type: RideType,
    #[serde(with = "hms")]
    usual_start_time: NaiveTime,
    #[serde(with = "hms")]
    usual_end_time: NaiveTime,
}

/// Unvalidated wire form, checked through `RouteDefinition::new`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRouteDefinition {
    city_ids: Vec<CityId>,
    ride_type: RideType,
    #[serde(with = "hms")]
    usual_start_time: NaiveTime,
    #[serde(with = "hms")]
    usual_end_time: NaiveTime,
}

impl TryFrom<RawRouteDefinition> for RouteDefinition {
    type Error = TooFewCities;

    fn try_from(raw: RawRouteDefinition) -> Result<Self, Self::Error> {
        Self::new(
            raw.city_ids,
            raw.ride_type,
            raw.usual_start_time,
            raw.usual_end_time,
        )
    }
}

impl RouteDefinition {
    /// Create a route definition
    ///
    /// # Errors
    /// - `TooFewCities` if fewer than two cities are given
    pub fn new(
        city_ids: Vec<CityId>,
        ride_type: RideType,
        usual_start_time: NaiveTime,
        usual_end_time: NaiveTime,
    ) -> Result<Self, TooFewCities> {
        if city_ids.len() < MIN_ROUTE_CITIES {
            return Err(TooFewCities {
                min: MIN_ROUTE_CITIES,
                selected: city_ids.len(),
            });
        }
        Ok(Self {
            city_ids,
            ride_type,
            usual_start_time,
            usual_end_time,
        })
    }

    /// City ids in travel order
    #[inline]
    #[must_use]
    pub fn city_ids(&self) -> &[CityId] {
        &self.city_ids
    }

    #[inline]
    #[must_use]
    pub fn ride_type(&self) -> RideType {
        self.ride_type
    }

    #[inline]
    #[must_use]
    pub fn usual_start_time(&self) -> NaiveTime {
        self.usual_start_time
    }

    #[inline]
    #[must_use]
    pub fn usual_end_time(&self) -> NaiveTime {
        self.usual_end_time
    }

    /// Start city of the route
    #[inline]
    #[must_use]
    pub fn start(&self) -> CityId {
        self.city_ids[0]
    }

    /// Destination city of the route
    #[inline]
    #[must_use]
    pub fn destination(&self) -> CityId {
        self.city_ids[self.city_ids.len() - 1]
    }
}

/// Time of day on the wire: `HH:MM:SS`, seconds always `00`
pub mod hms {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Render a time of day the way the backend expects it
    #[must_use]
    pub fn format(time: &NaiveTime) -> String {
        time.format("%H:%M:00").to_string()
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M"))
            .map_err(serde::de::Error::custom)
    }
}

/// Response of `POST /driver/cities`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveRouteResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response of `GET /driver/route-cities` and `GET /driver/route-cities-with-eta`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteCitiesResponse {
    pub success: bool,
    pub start_point: String,
    pub end_point: String,
    pub start_city_id: CityId,
    pub end_city_id: CityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Driver route cities with an optional ETA estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteCities {
    pub start_point: String,
    pub end_point: String,
    pub start_city_id: CityId,
    pub end_city_id: CityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl RouteCities {
    /// Basic result without ETA fields
    #[must_use]
    pub fn from_response(response: &RouteCitiesResponse) -> Self {
        Self {
            start_point: response.start_point.clone(),
            end_point: response.end_point.clone(),
            start_city_id: response.start_city_id,
            end_city_id: response.end_city_id,
            eta_minutes: None,
            distance_km: None,
        }
    }

    /// Attach an ETA estimate
    #[inline]
    #[must_use]
    pub fn with_eta(mut self, eta_minutes: i64, distance_km: f64) -> Self {
        self.eta_minutes = Some(eta_minutes);
        self.distance_km = Some(distance_km);
        self
    }
}

/// ETA cache entry before it is stamped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEtaCacheEntry {
    pub start_city_id: CityId,
    pub end_city_id: CityId,
    pub start_city: String,
    pub end_city: String,
    pub eta_minutes: i64,
    pub distance_km: f64,
}

impl NewEtaCacheEntry {
    /// Stamp with a write time in epoch milliseconds
    #[must_use]
    pub fn stamp(self, timestamp: i64) -> EtaCacheEntry {
        EtaCacheEntry {
            start_city_id: self.start_city_id,
            end_city_id: self.end_city_id,
            start_city: self.start_city,
            end_city: self.end_city,
            eta_minutes: self.eta_minutes,
            distance_km: self.distance_km,
            timestamp,
        }
    }
}

/// Persisted ETA estimate for one city pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtaCacheEntry {
    pub start_city_id: CityId,
    pub end_city_id: CityId,
    pub start_city: String,
    pub end_city: String,
    pub eta_minutes: i64,
    pub distance_km: f64,
    /// Write time, epoch milliseconds
    pub timestamp: i64,
}

impl EtaCacheEntry {
    /// Check whether the entry belongs to the given city pair
    #[inline]
    #[must_use]
    pub fn matches(&self, start_city_id: CityId, end_city_id: CityId) -> bool {
        self.start_city_id == start_city_id && self.end_city_id == end_city_id
    }
}

/// Whether a stop picks a child up or drops them off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopType {
    Pickup,
    Dropoff,
}

impl fmt::Display for StopType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopType::Pickup => f.write_str("pickup"),
            StopType::Dropoff => f.write_str("dropoff"),
        }
    }
}

/// Progress of a single stop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopStatus {
    #[default]
    Pending,
    Arrived,
    Completed,
}

/// One stop of today's optimized route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "type")]
    pub stop_type: StopType,
    pub child_id: i64,
    #[serde(default)]
    pub address: String,
    /// Expected arrival, epoch seconds
    #[serde(alias = "eta")]
    pub eta_secs: i64,
    #[serde(default)]
    pub leg_distance_meters: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_name: Option<String>,
    #[serde(default)]
    pub status: StopStatus,
}

impl Stop {
    #[inline]
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }

    /// Child name, or a placeholder built from the id
    #[must_use]
    pub fn display_name(&self) -> String {
        self.child_name
            .clone()
            .unwrap_or_else(|| format!("Child #{}", self.child_id))
    }
}

/// Response of `POST /driver/optimize-route`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptimizedRoute {
    /// Optimizer fell back to a non-optimal ordering
    pub degraded: bool,
    pub total_distance_meters: i64,
    pub total_duration_secs: i64,
    pub polyline: Option<String>,
    pub stops: Vec<Stop>,
}

/// Body of `POST /driver/mark-attendance`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendancePayload {
    pub child_id: i64,
    #[serde(rename = "type")]
    pub stop_type: StopType,
    pub latitude: f64,
    pub longitude: f64,
    pub notes: String,
    pub status: StopStatus,
}

impl AttendancePayload {
    /// Payload confirming the stop was completed
    #[must_use]
    pub fn completed(stop: &Stop, notes: impl Into<String>) -> Self {
        Self {
            child_id: stop.child_id,
            stop_type: stop.stop_type,
            latitude: stop.lat,
            longitude: stop.lng,
            notes: notes.into(),
            status: StopStatus::Completed,
        }
    }
}

/// Chat list entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub unread_count: u32,
}

/// Single chat room message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: i64,
    pub sender_id: i64,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn route_definition_requires_two_cities() {
        let err = RouteDefinition::new(vec![7], RideType::School, time(7, 0), time(15, 0))
            .unwrap_err();
        assert_eq!(err.selected, 1);
        assert_eq!(err.to_string(), "Please select at least 2 cities");

        let route =
            RouteDefinition::new(vec![7, 3, 9], RideType::Both, time(7, 0), time(15, 0)).unwrap();
        assert_eq!(route.start(), 7);
        assert_eq!(route.destination(), 9);
    }

    #[test]
    fn route_definition_wire_format() {
        let route =
            RouteDefinition::new(vec![4, 2], RideType::Work, time(7, 45), time(17, 5)).unwrap();
        let json = serde_json::to_value(&route).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "cityIds": [4, 2],
                "rideType": "work",
                "usualStartTime": "07:45:00",
                "usualEndTime": "17:05:00",
            })
        );
    }

    #[test]
    fn route_definition_decode_rejects_short_routes() {
        for city_ids in ["[]", "[1]"] {
            let raw = format!(
                r#"{{"cityIds":{city_ids},"rideType":"work","usualStartTime":"07:45:00","usualEndTime":"17:05:00"}}"#
            );
            let err = serde_json::from_str::<RouteDefinition>(&raw).unwrap_err();
            assert!(err.to_string().contains("at least 2 cities"), "{err}");
        }

        let route: RouteDefinition = serde_json::from_str(
            r#"{"cityIds":[4,2],"rideType":"work","usualStartTime":"07:45:00","usualEndTime":"17:05:00"}"#,
        )
        .unwrap();
        assert_eq!(route.start(), 4);
        assert_eq!(route.destination(), 2);
    }

    #[test]
    fn hms_drops_seconds() {
        let t = NaiveTime::from_hms_opt(9, 3, 59).unwrap();
        assert_eq!(hms::format(&t), "09:03:00");
    }

    #[test]
    fn stop_decodes_backend_shape() {
        let stop: Stop = serde_json::from_value(serde_json::json!({
            "lat": 51.5,
            "lng": -0.12,
            "type": "pickup",
            "childId": 12,
            "address": "1 High St",
            "eta": 1_700_000_000,
            "legDistanceMeters": 900,
        }))
        .unwrap();

        assert_eq!(stop.stop_type, StopType::Pickup);
        assert_eq!(stop.eta_secs, 1_700_000_000);
        assert_eq!(stop.status, StopStatus::Pending);
        assert_eq!(stop.display_name(), "Child #12");
    }

    #[test]
    fn attendance_payload_from_stop() {
        let stop = Stop {
            lat: 1.0,
            lng: 2.0,
            stop_type: StopType::Dropoff,
            child_id: 3,
            address: String::new(),
            eta_secs: 0,
            leg_distance_meters: 0,
            child_name: Some("Ada".to_string()),
            status: StopStatus::Arrived,
        };
        let payload = AttendancePayload::completed(&stop, "on time");
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["childId"], 3);
        assert_eq!(json["type"], "dropoff");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["latitude"], 1.0);
        assert_eq!(json["notes"], "on time");
    }

    #[test]
    fn route_cities_response_tolerates_failure_body() {
        let response: RouteCitiesResponse =
            serde_json::from_str(r#"{"success":false,"message":"no route"}"#).unwrap();
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("no route"));
    }

    #[test]
    fn ride_type_parses_case_insensitively() {
        assert_eq!("School".parse::<RideType>().unwrap(), RideType::School);
        assert!("bus".parse::<RideType>().is_err());
    }
}

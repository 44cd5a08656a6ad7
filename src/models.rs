use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lenient string deserializer for LLM-produced JSON: accepts strings, numbers or null
fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Str(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    let value = Option::<Lenient>::deserialize(deserializer)?;
    Ok(match value {
        Some(Lenient::Str(s)) => s,
        Some(Lenient::Int(i)) => i.to_string(),
        Some(Lenient::Float(f)) => f.to_string(),
        Some(Lenient::Bool(b)) => b.to_string(),
        None => String::new(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// `"lat,lng"` as the routing endpoint expects for each `point` parameter
    pub fn as_point_param(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

/// A successfully geocoded place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub query: String,
    pub resolved_name: String,
    pub coordinates: Coordinates,
    /// OSM classification of the hit (city, street, ...), when the provider reports one
    pub location_type: Option<String>,
}

impl Place {
    pub fn latitude(&self) -> f64 {
        self.coordinates.lat
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates.lng
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VehicleMode {
    #[default]
    Car,
    Bike,
    Foot,
}

impl VehicleMode {
    pub const ALL: [VehicleMode; 3] = [VehicleMode::Car, VehicleMode::Bike, VehicleMode::Foot];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleMode::Car => "car",
            VehicleMode::Bike => "bike",
            VehicleMode::Foot => "foot",
        }
    }

    /// Comma-separated profile list shown to the user
    pub fn profile_list() -> String {
        Self::ALL
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for VehicleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "car" => Ok(VehicleMode::Car),
            "bike" => Ok(VehicleMode::Bike),
            "foot" => Ok(VehicleMode::Foot),
            other => Err(format!("Unknown vehicle profile: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub origin: Place,
    pub destination: Place,
    pub mode: VehicleMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub instruction_text: String,
    pub step_distance_meters: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub distance_meters: f64,
    pub duration_millis: f64,
    pub steps: Vec<RouteStep>,
}

/// A route together with the request that produced it.
///
/// The session only ever stores this as a whole, so a route can never be shown
/// against endpoints or a mode it was not computed for.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedTrip {
    route: Route,
    origin: Place,
    destination: Place,
    mode: VehicleMode,
}

impl PlannedTrip {
    pub fn new(request: RouteRequest, route: Route) -> Self {
        Self {
            route,
            origin: request.origin,
            destination: request.destination,
            mode: request.mode,
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn origin(&self) -> &Place {
        &self.origin
    }

    pub fn destination(&self) -> &Place {
        &self.destination
    }

    pub fn mode(&self) -> VehicleMode {
        self.mode
    }
}

/// Structured trip extracted from free text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripQuery {
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub start_location: String,
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub end_location: String,
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub vehicle_preference: String,
}

impl TripQuery {
    pub const UNSPECIFIED_VEHICLE: &'static str = "not specified";
}

impl Default for TripQuery {
    fn default() -> Self {
        Self {
            start_location: String::new(),
            end_location: String::new(),
            vehicle_preference: Self::UNSPECIFIED_VEHICLE.to_string(),
        }
    }
}

// GraphHopper geocoding response format
#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    pub hits: Vec<GeocodeHit>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeHit {
    pub point: GeoPoint,
    pub name: Option<String>,
    pub country: Option<String>,
    pub osm_value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

// GraphHopper routing response format
#[derive(Debug, Deserialize)]
pub struct RouteResponse {
    #[serde(default)]
    pub paths: Vec<RoutePath>,
}

#[derive(Debug, Deserialize)]
pub struct RoutePath {
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub time: f64,
    #[serde(default)]
    pub instructions: Vec<RouteInstruction>,
}

#[derive(Debug, Deserialize)]
pub struct RouteInstruction {
    pub text: Option<String>,
    #[serde(default)]
    pub distance: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_mode_parses_case_insensitively() {
        assert_eq!("Bike".parse::<VehicleMode>(), Ok(VehicleMode::Bike));
        assert_eq!(" foot ".parse::<VehicleMode>(), Ok(VehicleMode::Foot));
        assert!("train".parse::<VehicleMode>().is_err());
        assert_eq!(VehicleMode::profile_list(), "car, bike, foot");
    }

    #[test]
    fn trip_query_tolerates_missing_and_null_fields() {
        let q: TripQuery =
            serde_json::from_str(r#"{"start_location":"Boston","end_location":null}"#)
                .expect("lenient parse");
        assert_eq!(q.start_location, "Boston");
        assert_eq!(q.end_location, "");
        assert_eq!(q.vehicle_preference, "not specified");
    }

    #[test]
    fn coordinates_point_param() {
        assert_eq!(Coordinates::new(42.36, -71.05).as_point_param(), "42.36,-71.05");
    }
}

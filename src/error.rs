use thiserror::Error;

use crate::models::VehicleMode;

/// Failure to turn a place name into coordinates
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LookupError {
    #[error("Location query is empty")]
    EmptyQuery,

    #[error("Geocoding service unreachable: {0}")]
    Transport(String),

    #[error("No geocoding results found for {0}")]
    NotFound(String),

    #[error("Geocoding API error: Status code {code}: {message}")]
    Provider { code: u16, message: String },

    #[error("Unexpected geocoding response: {0}")]
    Parse(String),
}

/// Failure to compute a route between two resolved places
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RouteError {
    #[error("Routing service unreachable: {0}")]
    Transport(String),

    #[error("Routing API error: Status code {code}: {message}")]
    Provider { code: u16, message: String },

    #[error("No route found between the requested points")]
    NoRouteFound,

    #[error("Unexpected routing response: {0}")]
    Parse(String),
}

impl RouteError {
    /// Text shown after "Error message:" in the itinerary block
    pub fn display_message(&self) -> String {
        match self {
            RouteError::Provider { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerationError {
    #[error("{0}")]
    Transport(String),

    #[error("Text generation API error {code}: {body}")]
    Provider { code: u16, body: String },

    #[error("Could not build text generation request: {0}")]
    Request(String),
}

/// Failures surfaced by the trip assistant operations
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("No route planned yet. Plan a route first (option 1 in the main menu).")]
    NoRoute,

    #[error("Could not geocode starting location: {0}")]
    Start(#[source] LookupError),

    #[error("Could not geocode destination: {0}")]
    Destination(#[source] LookupError),

    #[error("Directions from {start} to {end} by {mode} failed: {source}")]
    Route {
        start: String,
        end: String,
        mode: VehicleMode,
        #[source]
        source: RouteError,
    },

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Could not work out a {0} from that request. Try naming both places explicitly.")]
    Incomplete(&'static str),

    #[error("Please enter a {0}.")]
    EmptyInput(&'static str),
}

/// Failures outside a single menu action: startup wiring and console I/O
#[derive(Debug, Error)]
pub enum TripAssistantError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TripAssistantError>;

/// Pull the provider's `message` field out of an error body, falling back to the raw text
pub(crate) fn provider_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "Unknown error".to_string()
            } else {
                body.to_string()
            }
        })
}

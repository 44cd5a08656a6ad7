//! Trip planning and the LLM-augmented views of a planned route.

use std::fmt::Write;
use std::sync::Arc;

use crate::error::AssistantError;
use crate::format::{format_distance, format_time};
use crate::geocode::Geocoder;
use crate::llm::{BackendId, TextGenerator};
use crate::models::{Place, PlannedTrip, RouteRequest, TripQuery, VehicleMode};
use crate::routing::RouteProvider;

pub const INVALID_MODE_WARNING: &str = "No valid vehicle profile was entered. Using the car profile.";

/// State that lives for one interactive run: the most recently planned trip
#[derive(Debug, Default)]
pub struct Session {
    current: Option<PlannedTrip>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&PlannedTrip> {
        self.current.as_ref()
    }

    pub fn has_route(&self) -> bool {
        self.current.is_some()
    }

    fn require_route(&self) -> Result<&PlannedTrip, AssistantError> {
        self.current.as_ref().ok_or(AssistantError::NoRoute)
    }
}

/// Result of a successful `plan_route`
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    pub trip: PlannedTrip,
    pub warnings: Vec<String>,
}

/// Map free-form profile input onto the closed mode set; anything else is `car`
pub fn resolve_mode(choice: &str) -> (VehicleMode, Option<String>) {
    match choice.parse::<VehicleMode>() {
        Ok(mode) => (mode, None),
        Err(_) => {
            tracing::warn!("Unrecognized vehicle profile '{}', using car", choice.trim());
            (VehicleMode::Car, Some(INVALID_MODE_WARNING.to_string()))
        }
    }
}

/// Balanced `{...}` starting at `text[0]`, skipping braces inside JSON strings
fn balanced_braces(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// First brace-delimited span in `text` that parses as a JSON object.
///
/// Spans that are not JSON (braces in surrounding prose) are skipped and the
/// scan resumes at the next `{`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    text.char_indices()
        .filter(|&(_, ch)| ch == '{')
        .filter_map(|(start, _)| balanced_braces(&text[start..]))
        .find(|span| {
            serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(span).is_ok()
        })
}

fn trip_query_prompt(free_text: &str) -> String {
    format!(
        r#"You are a travel planning assistant. Extract the trip details from the user's request.
Respond with ONLY a JSON object, no explanation, using exactly these fields:
{{"start_location": "<starting place>", "end_location": "<destination>", "vehicle_preference": "<car, bike, foot or not specified>"}}
If a field cannot be determined, use an empty string (or "not specified" for vehicle_preference).

User request: {free_text}"#
    )
}

pub struct TripAssistant {
    geocoder: Arc<dyn Geocoder>,
    router: Arc<dyn RouteProvider>,
    generator: Arc<dyn TextGenerator>,
    max_prompt_steps: usize,
}

impl TripAssistant {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        router: Arc<dyn RouteProvider>,
        generator: Arc<dyn TextGenerator>,
        max_prompt_steps: usize,
    ) -> Self {
        Self {
            geocoder,
            router,
            generator,
            max_prompt_steps,
        }
    }

    pub async fn resolve_start(&self, query: &str) -> Result<Place, AssistantError> {
        self.geocoder
            .resolve(query)
            .await
            .map_err(AssistantError::Start)
    }

    pub async fn resolve_destination(&self, query: &str) -> Result<Place, AssistantError> {
        self.geocoder
            .resolve(query)
            .await
            .map_err(AssistantError::Destination)
    }

    /// Route between two resolved places; the session's trip is replaced only on success
    pub async fn route_between(
        &self,
        session: &mut Session,
        origin: Place,
        destination: Place,
        mode: VehicleMode,
    ) -> Result<PlannedTrip, AssistantError> {
        let route = self
            .router
            .route(origin.coordinates, destination.coordinates, mode)
            .await
            .map_err(|source| AssistantError::Route {
                start: origin.resolved_name.clone(),
                end: destination.resolved_name.clone(),
                mode,
                source,
            })?;

        tracing::info!(
            "Planned {} route {} -> {} ({} steps)",
            mode,
            origin.resolved_name,
            destination.resolved_name,
            route.steps.len()
        );

        let trip = PlannedTrip::new(
            RouteRequest {
                origin,
                destination,
                mode,
            },
            route,
        );
        session.current = Some(trip.clone());
        Ok(trip)
    }

    /// Geocode both ends, route between them and, only on success, replace the session's trip
    pub async fn plan_route(
        &self,
        session: &mut Session,
        start_query: &str,
        end_query: &str,
        mode_choice: &str,
    ) -> Result<PlanOutcome, AssistantError> {
        let (mode, warning) = resolve_mode(mode_choice);

        let origin = self.resolve_start(start_query).await?;
        let destination = self.resolve_destination(end_query).await?;
        let trip = self.route_between(session, origin, destination, mode).await?;

        Ok(PlanOutcome {
            trip,
            warnings: warning.into_iter().collect(),
        })
    }

    /// Ask the backend for start/end/mode as JSON.
    ///
    /// Transport and provider failures are returned; an answer without a usable
    /// JSON object yields an empty `TripQuery`.
    pub async fn parse_natural_language(
        &self,
        free_text: &str,
        backend: BackendId,
    ) -> Result<TripQuery, AssistantError> {
        if free_text.trim().is_empty() {
            return Ok(TripQuery::default());
        }

        let raw = self
            .generator
            .generate(&trip_query_prompt(free_text.trim()), backend)
            .await?;

        let Some(object) = extract_json_object(&raw) else {
            tracing::warn!("No JSON object in trip parsing response: {}", raw);
            return Ok(TripQuery::default());
        };
        Ok(serde_json::from_str(object).unwrap_or_else(|e| {
            tracing::warn!("Failed to deserialize trip JSON: {}. Raw: {}", e, object);
            TripQuery::default()
        }))
    }

    /// Parse free text and plan the trip it describes, replacing the current one
    pub async fn plan_from_natural_language(
        &self,
        session: &mut Session,
        free_text: &str,
        backend: BackendId,
    ) -> Result<(TripQuery, PlanOutcome), AssistantError> {
        session.require_route()?;

        let query = self.parse_natural_language(free_text, backend).await?;
        if query.start_location.trim().is_empty() {
            return Err(AssistantError::Incomplete("starting location"));
        }
        if query.end_location.trim().is_empty() {
            return Err(AssistantError::Incomplete("destination"));
        }

        let pref = query.vehicle_preference.trim();
        let mode_choice = if pref.is_empty() || pref.eq_ignore_ascii_case(TripQuery::UNSPECIFIED_VEHICLE) {
            VehicleMode::Car.as_str()
        } else {
            pref
        };

        let outcome = self
            .plan_route(session, &query.start_location, &query.end_location, mode_choice)
            .await?;
        Ok((query, outcome))
    }

    pub async fn summarize_route(
        &self,
        session: &Session,
        backend: BackendId,
    ) -> Result<String, AssistantError> {
        let trip = session.require_route()?;
        let prompt = format!(
            "You are a friendly travel companion. Give a short, conversational summary of this trip: \
             how long it takes, what kind of roads or paths it follows, and anything the traveler \
             should keep in mind.\n\n{}",
            self.route_context(trip, true)
        );
        Ok(self.generator.generate(&prompt, backend).await?)
    }

    pub async fn suggest_points_of_interest(
        &self,
        session: &Session,
        backend: BackendId,
    ) -> Result<String, AssistantError> {
        let trip = session.require_route()?;
        let prompt = format!(
            "Suggest 3 to 5 interesting places to stop along this trip (landmarks, food, scenic \
             spots, rest areas). For each, give the name and one sentence on why it is worth a visit.\n\n{}",
            self.route_context(trip, false)
        );
        Ok(self.generator.generate(&prompt, backend).await?)
    }

    pub async fn answer_question(
        &self,
        session: &Session,
        question: &str,
        backend: BackendId,
    ) -> Result<String, AssistantError> {
        let trip = session.require_route()?;
        let question = question.trim();
        if question.is_empty() {
            return Err(AssistantError::EmptyInput("question"));
        }
        let prompt = format!(
            "Answer the traveler's question about their planned trip. Use the route details below \
             and keep the answer brief.\n\n{}\nQuestion: {question}",
            self.route_context(trip, true)
        );
        Ok(self.generator.generate(&prompt, backend).await?)
    }

    /// Route facts embedded in prompts; directions are capped at `max_prompt_steps`
    fn route_context(&self, trip: &PlannedTrip, with_steps: bool) -> String {
        let route = trip.route();
        let mut ctx = String::new();
        let _ = writeln!(ctx, "From: {}", trip.origin().resolved_name);
        let _ = writeln!(ctx, "To: {}", trip.destination().resolved_name);
        let _ = writeln!(ctx, "Travel mode: {}", trip.mode());
        let _ = writeln!(ctx, "Distance: {}", format_distance(route.distance_meters));
        let _ = writeln!(ctx, "Duration: {}", format_time(route.duration_millis));

        if with_steps && self.max_prompt_steps > 0 && !route.steps.is_empty() {
            let _ = writeln!(ctx, "Directions:");
            for (i, step) in route.steps.iter().take(self.max_prompt_steps).enumerate() {
                let _ = writeln!(ctx, "{}. {}", i + 1, step.instruction_text);
            }
            let remaining = route.steps.len().saturating_sub(self.max_prompt_steps);
            if remaining > 0 {
                let _ = writeln!(ctx, "... and {remaining} more steps");
            }
        }
        ctx
    }
}

use std::fmt::Write;

use crate::models::{PlannedTrip, VehicleMode};

pub const MILES_PER_KM: f64 = 0.621371;
pub const SEPARATOR_WIDTH: usize = 49;

pub fn separator(ch: char) -> String {
    std::iter::repeat_n(ch, SEPARATOR_WIDTH).collect()
}

fn km_and_miles(meters: f64) -> (f64, f64) {
    let km = meters.max(0.0) / 1000.0;
    (km, km * MILES_PER_KM)
}

/// Total trip distance, miles first: `"12.4 miles / 20.0 km"`
pub fn format_distance(meters: f64) -> String {
    let (km, miles) = km_and_miles(meters);
    format!("{miles:.1} miles / {km:.1} km")
}

/// Per-instruction distance, km first: `"( 0.4 km / 0.2 miles )"`
pub fn format_step_distance(meters: f64) -> String {
    let (km, miles) = km_and_miles(meters);
    format!("( {km:.1} km / {miles:.1} miles )")
}

/// `HH:MM:SS` from whole seconds; fractional seconds are dropped, hours are not wrapped at 24
pub fn format_time(duration_millis: f64) -> String {
    let total_secs = if duration_millis.is_finite() && duration_millis > 0.0 {
        (duration_millis / 1000.0).floor() as u64
    } else {
        0
    };
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

fn directions_heading(start: &str, end: &str, mode: VehicleMode) -> String {
    format!("Directions from {start} to {end} by {mode}")
}

/// Full itinerary block for a planned trip
pub fn render_itinerary(trip: &PlannedTrip) -> String {
    let route = trip.route();
    let line = separator('=');
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{}",
        directions_heading(
            &trip.origin().resolved_name,
            &trip.destination().resolved_name,
            trip.mode()
        )
    );
    let _ = writeln!(out, "{line}");
    let _ = writeln!(out, "Distance Traveled: {}", format_distance(route.distance_meters));
    let _ = writeln!(out, "Trip Duration: {}", format_time(route.duration_millis));
    let _ = writeln!(out, "{line}");
    for step in &route.steps {
        let text = if step.instruction_text.trim().is_empty() {
            "Continue"
        } else {
            step.instruction_text.as_str()
        };
        let _ = writeln!(
            out,
            "{text} {}",
            format_step_distance(step.step_distance_meters)
        );
    }
    let _ = writeln!(out, "{line}");
    out
}

/// Block shown when the routing call fails for an otherwise resolved pair of places
pub fn render_route_failure(start: &str, end: &str, mode: VehicleMode, message: &str) -> String {
    format!(
        "{}\n{}\nError message: {message}\n{}\n",
        directions_heading(start, end, mode),
        separator('='),
        separator('*')
    )
}

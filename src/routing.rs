use async_trait::async_trait;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::error::{RouteError, provider_message};
use crate::models::{Coordinates, Route, RouteResponse, RouteStep, VehicleMode};
use crate::transport::{HttpRequest, HttpTransport};

/// Computes a single point-to-point route for one vehicle profile
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        mode: VehicleMode,
    ) -> Result<Route, RouteError>;
}

pub struct GraphHopperRouter {
    tx: Arc<dyn HttpTransport>,
    url: String,
    api_key: String,
}

impl GraphHopperRouter {
    pub fn new(tx: Arc<dyn HttpTransport>, url: String, api_key: String) -> Self {
        Self { tx, url, api_key }
    }

    fn request(&self, origin: Coordinates, destination: Coordinates, mode: VehicleMode) -> HttpRequest {
        HttpRequest::get(&self.url)
            .param("key", &self.api_key)
            .param("vehicle", mode.as_str())
            .param("point", origin.as_point_param())
            .param("point", destination.as_point_param())
    }
}

fn into_route(parsed: RouteResponse) -> Result<Route, RouteError> {
    // Alternates, if any, are ignored
    let path = parsed
        .paths
        .into_iter()
        .next()
        .ok_or(RouteError::NoRouteFound)?;

    Ok(Route {
        distance_meters: path.distance,
        duration_millis: path.time,
        steps: path
            .instructions
            .into_iter()
            .map(|i| RouteStep {
                instruction_text: i.text.unwrap_or_else(|| "Continue".to_string()),
                step_distance_meters: i.distance,
            })
            .collect(),
    })
}

#[async_trait]
impl RouteProvider for GraphHopperRouter {
    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        mode: VehicleMode,
    ) -> Result<Route, RouteError> {
        let req = self.request(origin, destination, mode);
        let reply = self.tx.send(&req).await.map_err(|e| {
            tracing::warn!("Error during routing: {}", e);
            RouteError::Transport(e.0)
        })?;

        tracing::info!(
            status = reply.status,
            url = %req.display_url(),
            "Routing API call completed"
        );

        if !reply.is_success() {
            return Err(RouteError::Provider {
                code: reply.status,
                message: provider_message(&reply.body),
            });
        }

        let parsed: RouteResponse = serde_json::from_str(&reply.body)
            .map_err(|e| RouteError::Parse(e.to_string()))?;
        into_route(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    const ROUTE: &str = r#"{
        "paths": [
            {
                "distance": 80523.4,
                "time": 3725123,
                "instructions": [
                    {"text": "Continue onto Congress Street", "distance": 120.5, "time": 20000},
                    {"text": "Turn right onto I-93 S", "distance": 80000.0, "time": 3600000},
                    {"distance": 402.9}
                ]
            },
            {"distance": 99999.0, "time": 1.0, "instructions": []}
        ]
    }"#;

    fn router(tx: Arc<MockTransport>) -> GraphHopperRouter {
        GraphHopperRouter::new(
            tx,
            "https://graphhopper.com/api/1/route".to_string(),
            "test-key".to_string(),
        )
    }

    fn boston() -> Coordinates {
        Coordinates::new(42.36, -71.06)
    }

    fn providence() -> Coordinates {
        Coordinates::new(41.82, -71.41)
    }

    #[tokio::test]
    async fn takes_primary_path_only() {
        let tx = Arc::new(MockTransport::replying(200, ROUTE));
        let route = router(tx)
            .route(boston(), providence(), VehicleMode::Car)
            .await
            .expect("route should succeed");

        assert_eq!(route.distance_meters, 80523.4);
        assert_eq!(route.duration_millis, 3725123.0);
        assert_eq!(route.steps.len(), 3);
        assert_eq!(route.steps[1].instruction_text, "Turn right onto I-93 S");
        assert_eq!(route.steps[1].step_distance_meters, 80000.0);
        assert_eq!(route.steps[2].instruction_text, "Continue");
    }

    #[tokio::test]
    async fn sends_exactly_two_waypoints_and_vehicle() {
        let tx = Arc::new(MockTransport::replying(200, ROUTE));
        router(tx.clone())
            .route(boston(), providence(), VehicleMode::Foot)
            .await
            .expect("route should succeed");

        let req = tx.last_request();
        let points: Vec<&str> = req
            .query
            .iter()
            .filter(|(k, _)| k == "point")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(points, vec!["42.36,-71.06", "41.82,-71.41"]);
        assert!(req.query.contains(&("vehicle".to_string(), "foot".to_string())));
        assert!(req.query.contains(&("key".to_string(), "test-key".to_string())));
    }

    #[tokio::test]
    async fn empty_paths_is_no_route() {
        let tx = Arc::new(MockTransport::replying(200, r#"{"paths":[]}"#));
        let err = router(tx)
            .route(boston(), providence(), VehicleMode::Bike)
            .await
            .unwrap_err();
        assert_eq!(err, RouteError::NoRouteFound);
    }

    #[tokio::test]
    async fn provider_message_is_propagated() {
        let tx = Arc::new(MockTransport::replying(
            400,
            r#"{"message":"Connection between locations not found","hints":[]}"#,
        ));
        let err = router(tx)
            .route(boston(), Coordinates::new(51.5, -0.12), VehicleMode::Car)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RouteError::Provider {
                code: 400,
                message: "Connection between locations not found".to_string()
            }
        );
    }

    #[tokio::test]
    async fn unreachable_is_transport_error() {
        let tx = Arc::new(MockTransport::unreachable("dns error"));
        let err = router(tx)
            .route(boston(), providence(), VehicleMode::Car)
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::Transport(msg) if msg == "dns error"));
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let tx = Arc::new(MockTransport::replying(200, "<html>oops</html>"));
        let err = router(tx)
            .route(boston(), providence(), VehicleMode::Car)
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::Parse(_)));
    }
}

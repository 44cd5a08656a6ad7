use async_trait::async_trait;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::debug_dump::DebugDump;
use crate::error::{LookupError, provider_message};
use crate::models::{Coordinates, GeocodeHit, GeocodeResponse, Place};
use crate::transport::{HttpRequest, HttpTransport};

/// Turns free-text place names into coordinates
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, query: &str) -> Result<Place, LookupError>;
}

pub struct GraphHopperGeocoder {
    tx: Arc<dyn HttpTransport>,
    url: String,
    api_key: String,
    limit: u32,
    dump: DebugDump,
}

impl GraphHopperGeocoder {
    pub fn new(
        tx: Arc<dyn HttpTransport>,
        url: String,
        api_key: String,
        limit: u32,
        dump: DebugDump,
    ) -> Self {
        Self {
            tx,
            url,
            api_key,
            limit: limit.max(1),
            dump,
        }
    }

    fn request(&self, query: &str) -> HttpRequest {
        HttpRequest::get(&self.url)
            .param("q", query)
            .param("limit", self.limit.to_string())
            .param("key", &self.api_key)
    }
}

/// Display name: the hit's name (or the raw query) plus `", {country}"` when known
fn display_name(query: &str, hit: &GeocodeHit) -> String {
    let name = hit
        .name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(query);
    match hit.country.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(country) => format!("{name}, {country}"),
        None => name.to_string(),
    }
}

#[async_trait]
impl Geocoder for GraphHopperGeocoder {
    async fn resolve(&self, query: &str) -> Result<Place, LookupError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(LookupError::EmptyQuery);
        }

        let req = self.request(query);
        let reply = self.tx.send(&req).await.map_err(|e| {
            tracing::warn!("Error during geocoding of '{}': {}", query, e);
            LookupError::Transport(e.0)
        })?;

        if !reply.is_success() {
            tracing::warn!("Geocoding API error: Status code {}", reply.status);
            return Err(LookupError::Provider {
                code: reply.status,
                message: provider_message(&reply.body),
            });
        }

        let raw = reply
            .json()
            .map_err(|e| LookupError::Parse(format!("body is not JSON: {e}")))?;
        self.dump.write_or_warn("geocode", query, &raw);

        let parsed: GeocodeResponse = serde_json::from_value(raw)
            .map_err(|e| LookupError::Parse(format!("unexpected hit shape: {e}")))?;

        let hit = parsed.hits.into_iter().next().ok_or_else(|| {
            tracing::info!("No geocoding results found for {}", query);
            LookupError::NotFound(query.to_string())
        })?;

        let resolved_name = display_name(query, &hit);
        tracing::info!(
            "Geocoding API URL for {} (Location Type: {}): {}",
            resolved_name,
            hit.osm_value.as_deref().unwrap_or(""),
            req.display_url()
        );

        Ok(Place {
            query: query.to_string(),
            resolved_name,
            coordinates: Coordinates::new(hit.point.lat, hit.point.lng),
            location_type: hit.osm_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    const BOSTON: &str = r#"{
        "hits": [
            {"point": {"lat": 42.3554334, "lng": -71.060511}, "name": "Boston",
             "country": "United States", "osm_value": "city"},
            {"point": {"lat": 52.97, "lng": -0.02}, "name": "Boston", "country": "United Kingdom"}
        ],
        "took": 3
    }"#;

    fn geocoder(tx: Arc<MockTransport>, dump: DebugDump) -> GraphHopperGeocoder {
        GraphHopperGeocoder::new(
            tx,
            "https://graphhopper.com/api/1/geocode".to_string(),
            "test-key".to_string(),
            1,
            dump,
        )
    }

    #[tokio::test]
    async fn resolves_first_hit_with_country() {
        let tx = Arc::new(MockTransport::replying(200, BOSTON));
        let place = geocoder(tx.clone(), DebugDump::disabled())
            .resolve("  Boston ")
            .await
            .expect("lookup should succeed");

        assert_eq!(place.query, "Boston");
        assert_eq!(place.resolved_name, "Boston, United States");
        assert_eq!(place.latitude(), 42.3554334);
        assert_eq!(place.longitude(), -71.060511);
        assert_eq!(place.location_type.as_deref(), Some("city"));

        let req = tx.last_request();
        assert_eq!(
            req.query,
            vec![
                ("q".to_string(), "Boston".to_string()),
                ("limit".to_string(), "1".to_string()),
                ("key".to_string(), "test-key".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn bare_name_without_country() {
        let body = r#"{"hits":[{"point":{"lat":1.0,"lng":2.0},"name":"Null Island"}]}"#;
        let tx = Arc::new(MockTransport::replying(200, body));
        let place = geocoder(tx, DebugDump::disabled())
            .resolve("null island")
            .await
            .expect("lookup should succeed");
        assert_eq!(place.resolved_name, "Null Island");
        assert_eq!(place.location_type, None);
    }

    #[tokio::test]
    async fn blank_query_never_hits_the_network() {
        let tx = Arc::new(MockTransport::new(vec![]));
        let err = geocoder(tx.clone(), DebugDump::disabled())
            .resolve("   ")
            .await
            .unwrap_err();
        assert_eq!(err, LookupError::EmptyQuery);
        assert_eq!(tx.request_count(), 0);
    }

    #[tokio::test]
    async fn empty_hits_is_not_found() {
        let tx = Arc::new(MockTransport::replying(200, r#"{"hits":[]}"#));
        let err = geocoder(tx, DebugDump::disabled())
            .resolve("Atlantis")
            .await
            .unwrap_err();
        assert_eq!(err, LookupError::NotFound("Atlantis".to_string()));
    }

    #[tokio::test]
    async fn non_success_status_is_provider_error() {
        let tx = Arc::new(MockTransport::replying(
            401,
            r#"{"message":"Wrong credentials. Register and get a valid API key"}"#,
        ));
        let err = geocoder(tx, DebugDump::disabled())
            .resolve("Boston")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            LookupError::Provider {
                code: 401,
                message: "Wrong credentials. Register and get a valid API key".to_string()
            }
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let tx = Arc::new(MockTransport::unreachable("connection refused"));
        let err = geocoder(tx, DebugDump::disabled())
            .resolve("Boston")
            .await
            .unwrap_err();
        assert_eq!(err, LookupError::Transport("connection refused".to_string()));
    }

    #[tokio::test]
    async fn dumps_raw_response_keyed_by_query() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let tx = Arc::new(MockTransport::replying(200, BOSTON));
        geocoder(tx, DebugDump::new(tmp.path(), true))
            .resolve("Boston, MA")
            .await
            .expect("lookup should succeed");

        let dumped = std::fs::read_to_string(tmp.path().join("geocode_Boston__MA.json"))
            .expect("dump file exists");
        assert!(dumped.contains("United Kingdom"));
    }

    #[tokio::test]
    async fn dump_failure_does_not_fail_lookup() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "x").expect("write blocker");
        let tx = Arc::new(MockTransport::replying(200, BOSTON));

        let place = geocoder(tx, DebugDump::new(blocker.join("data"), true))
            .resolve("Boston")
            .await
            .expect("lookup should still succeed");
        assert_eq!(place.resolved_name, "Boston, United States");
    }
}

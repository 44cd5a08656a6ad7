pub mod assistant;
pub mod config;
pub mod debug_dump;
pub mod error;
pub mod format;
pub mod geocode;
pub mod llm;
pub mod models;
pub mod routing;
pub mod transport;

use std::sync::Arc;

use crate::assistant::TripAssistant;
use crate::config::Config;
use crate::debug_dump::DebugDump;
use crate::error::{Result, TripAssistantError};
use crate::geocode::GraphHopperGeocoder;
use crate::llm::{BackendId, GenerationClient};
use crate::routing::GraphHopperRouter;
use crate::transport::{HttpTransport, ReqwestTransport};

/// Everything the CLI needs, wired from one `Config`
pub struct TripApp {
    pub assistant: TripAssistant,
    generation: Arc<GenerationClient>,
}

impl TripApp {
    pub fn new(cfg: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(cfg.llm_timeout())
            .map_err(|e| TripAssistantError::Config(e.to_string()))?;
        Ok(Self::with_transport(cfg, Arc::new(transport)))
    }

    pub fn with_transport(cfg: &Config, transport: Arc<dyn HttpTransport>) -> Self {
        let dump = DebugDump::new(&cfg.debug.dir, cfg.debug.enabled);

        let geocoder = Arc::new(GraphHopperGeocoder::new(
            Arc::clone(&transport),
            cfg.graphhopper.geocode_url.clone(),
            cfg.graphhopper.api_key.clone(),
            cfg.graphhopper.geocode_limit,
            dump,
        ));
        let router = Arc::new(GraphHopperRouter::new(
            Arc::clone(&transport),
            cfg.graphhopper.route_url.clone(),
            cfg.graphhopper.api_key.clone(),
        ));
        let generation = Arc::new(GenerationClient::new(transport, &cfg.llm));

        let assistant = TripAssistant::new(
            geocoder,
            router,
            Arc::clone(&generation) as Arc<dyn llm::TextGenerator>,
            cfg.assistant.max_prompt_steps,
        );

        Self {
            assistant,
            generation,
        }
    }

    pub fn default_backend(&self) -> BackendId {
        self.generation.default_backend()
    }

    /// Backend for a user-typed name; unknown names fall back to the default with a warning
    pub fn select_backend(&self, name: &str) -> BackendId {
        self.generation.select(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::Session;
    use crate::transport::HttpReply;
    use crate::transport::mock::MockTransport;

    #[tokio::test]
    async fn wired_app_plans_over_one_transport() {
        let tx = Arc::new(MockTransport::new(vec![
            Ok(HttpReply::new(
                200,
                r#"{"hits":[{"point":{"lat":42.36,"lng":-71.06},"name":"Boston","country":"United States"}]}"#,
            )),
            Ok(HttpReply::new(
                200,
                r#"{"hits":[{"point":{"lat":40.71,"lng":-74.0},"name":"New York","country":"United States"}]}"#,
            )),
            Ok(HttpReply::new(
                200,
                r#"{"paths":[{"distance":306400.0,"time":13500000,"instructions":[{"text":"Head north","distance":50.0}]}]}"#,
            )),
        ]));
        let mut cfg = Config::default();
        cfg.debug.enabled = false;
        cfg.llm.default_backend = "mystery".to_string();
        let app = TripApp::with_transport(&cfg, tx.clone());
        let mut session = Session::new();

        let outcome = app
            .assistant
            .plan_route(&mut session, "Boston", "New York", "car")
            .await
            .expect("plan should succeed");

        assert_eq!(tx.request_count(), 3);
        assert_eq!(outcome.trip.route().steps[0].instruction_text, "Head north");
        assert_eq!(app.default_backend(), BackendId::Ollama);
        assert_eq!(app.select_backend("nonsense"), BackendId::Ollama);
        assert_eq!(app.select_backend("gemini"), BackendId::Gemini);
    }
}

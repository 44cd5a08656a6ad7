//! Local model server running Ollama's `/api/generate` endpoint.

use serde::Serialize;

use super::BackendAdapter;
use crate::config::OllamaConfig;
use crate::transport::HttpRequest;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

pub struct OllamaAdapter {
    cfg: OllamaConfig,
}

impl OllamaAdapter {
    pub fn new(cfg: OllamaConfig) -> Self {
        Self { cfg }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.cfg.base_url.trim_end_matches('/'))
    }
}

impl BackendAdapter for OllamaAdapter {
    fn build_request(&self, prompt: &str) -> Result<HttpRequest, serde_json::Error> {
        let body = GenerateRequest {
            model: &self.cfg.model,
            prompt,
            stream: false,
        };
        let request = HttpRequest::post_json(self.endpoint(), serde_json::to_value(&body)?)
            .header("Content-Type", "application/json");
        Ok(request)
    }

    fn extract_text(&self, body: &serde_json::Value) -> Option<String> {
        body.get("response")?.as_str().map(str::to_string)
    }

    fn unreachable_message(&self, cause: &str) -> String {
        format!(
            "Could not connect to Ollama at {}: {}. Make sure the Ollama service is running \
             (start it with `ollama serve`) and the model is available (`ollama pull {}`).",
            self.cfg.base_url, cause, self.cfg.model
        )
    }
}

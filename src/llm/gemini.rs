//! Hosted multi-turn API (`generateContent`) with the credential in the query string.

use serde::Serialize;

use super::BackendAdapter;
use crate::config::GeminiConfig;
use crate::transport::HttpRequest;

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

pub struct GeminiAdapter {
    cfg: GeminiConfig,
}

impl GeminiAdapter {
    pub fn new(cfg: GeminiConfig) -> Self {
        Self { cfg }
    }
}

impl BackendAdapter for GeminiAdapter {
    fn build_request(&self, prompt: &str) -> Result<HttpRequest, serde_json::Error> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };
        let url = format!(
            "{}/models/{}:generateContent",
            self.cfg.base_url.trim_end_matches('/'),
            self.cfg.model
        );
        let request = HttpRequest::post_json(url, serde_json::to_value(&body)?)
            .param("key", &self.cfg.api_key)
            .header("Content-Type", "application/json");
        Ok(request)
    }

    /// Text parts of the first candidate, concatenated
    fn extract_text(&self, body: &serde_json::Value) -> Option<String> {
        let parts = body
            .get("candidates")?
            .get(0)?
            .get("content")?
            .get("parts")?
            .as_array()?;
        let text: Vec<&str> = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text.concat())
        }
    }

    fn unreachable_message(&self, cause: &str) -> String {
        format!("Could not reach the Gemini API: {cause}")
    }
}

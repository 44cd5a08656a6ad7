//! Hosted inference API with bearer-token auth.

use serde::Serialize;

use super::BackendAdapter;
use crate::config::HuggingFaceConfig;
use crate::transport::HttpRequest;

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_new_tokens: u32,
    temperature: f32,
    return_full_text: bool,
}

pub struct HuggingFaceAdapter {
    cfg: HuggingFaceConfig,
}

impl HuggingFaceAdapter {
    pub fn new(cfg: HuggingFaceConfig) -> Self {
        Self { cfg }
    }
}

impl BackendAdapter for HuggingFaceAdapter {
    fn build_request(&self, prompt: &str) -> Result<HttpRequest, serde_json::Error> {
        let body = InferenceRequest {
            inputs: prompt,
            parameters: InferenceParameters {
                max_new_tokens: self.cfg.max_new_tokens,
                temperature: self.cfg.temperature,
                return_full_text: false,
            },
        };
        let url = format!(
            "{}/{}",
            self.cfg.base_url.trim_end_matches('/'),
            self.cfg.model
        );
        let request = HttpRequest::post_json(url, serde_json::to_value(&body)?)
            .header("Authorization", format!("Bearer {}", self.cfg.api_key))
            .header("Content-Type", "application/json");
        Ok(request)
    }

    /// Text-generation models answer with `[{"generated_text": ...}]`; some return the bare object
    fn extract_text(&self, body: &serde_json::Value) -> Option<String> {
        let first = match body {
            serde_json::Value::Array(items) => items.first()?,
            other => other,
        };
        first.get("generated_text")?.as_str().map(str::to_string)
    }

    fn unreachable_message(&self, cause: &str) -> String {
        format!("Could not reach the Hugging Face Inference API: {cause}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn adapter() -> HuggingFaceAdapter {
        HuggingFaceAdapter::new(HuggingFaceConfig {
            api_key: "hf_test".to_string(),
            base_url: "https://api-inference.huggingface.co/models".to_string(),
            model: "mistralai/Mistral-7B-Instruct-v0.2".to_string(),
            max_new_tokens: 256,
            temperature: 0.5,
        })
    }

    #[test]
    fn request_uses_bearer_auth_and_generation_parameters() {
        let req = adapter().build_request("Plan my trip").expect("request builds");
        assert_eq!(
            req.url,
            "https://api-inference.huggingface.co/models/mistralai/Mistral-7B-Instruct-v0.2"
        );
        assert!(req
            .headers
            .contains(&("Authorization".to_string(), "Bearer hf_test".to_string())));
        assert!(req.query.is_empty());
        let body = req.body.expect("json body");
        assert_eq!(body["inputs"], "Plan my trip");
        assert_eq!(body["parameters"]["max_new_tokens"], 256);
        assert_eq!(body["parameters"]["return_full_text"], false);
    }

    #[test]
    fn extracts_generated_text_from_list_or_object() {
        let a = adapter();
        assert_eq!(
            a.extract_text(&json!([{"generated_text": "first"}, {"generated_text": "second"}])),
            Some("first".to_string())
        );
        assert_eq!(
            a.extract_text(&json!({"generated_text": "solo"})),
            Some("solo".to_string())
        );
        assert_eq!(a.extract_text(&json!([])), None);
        assert_eq!(a.extract_text(&json!({"error": "loading"})), None);
    }
}

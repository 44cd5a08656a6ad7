//! Text generation over interchangeable backends.
//!
//! Each backend adapter only knows how to build its request and where the
//! generated text sits in its response. [`GenerationClient`] does the sending and
//! reduces every outcome to `Result<String, GenerationError>`.

pub mod gemini;
pub mod huggingface;
pub mod ollama;

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::config::LlmConfig;
use crate::error::GenerationError;
use crate::transport::{HttpRequest, HttpTransport};

pub use gemini::GeminiAdapter;
pub use huggingface::HuggingFaceAdapter;
pub use ollama::OllamaAdapter;

/// Returned in place of text when a backend answers without the expected field
pub const NO_RESPONSE: &str = "No response generated";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendId {
    /// Local model server (Ollama)
    Ollama,
    /// Hosted inference API (Hugging Face)
    HuggingFace,
    /// Hosted multi-turn API (Gemini)
    Gemini,
}

impl BackendId {
    pub const ALL: [BackendId; 3] = [BackendId::Ollama, BackendId::HuggingFace, BackendId::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendId::Ollama => "ollama",
            BackendId::HuggingFace => "huggingface",
            BackendId::Gemini => "gemini",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BackendId::Ollama => "Ollama (local)",
            BackendId::HuggingFace => "Hugging Face Inference API",
            BackendId::Gemini => "Google Gemini",
        }
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" | "local" => Ok(BackendId::Ollama),
            "huggingface" | "hugging_face" | "hf" => Ok(BackendId::HuggingFace),
            "gemini" | "google" => Ok(BackendId::Gemini),
            other => Err(format!("Unknown text generation backend: {other}")),
        }
    }
}

/// Parse a backend name, falling back to `default` with a warning
pub fn select_backend(name: &str, default: BackendId) -> BackendId {
    name.parse().unwrap_or_else(|e| {
        tracing::warn!("{} - using {} instead", e, default);
        default
    })
}

/// Request construction and response-field extraction for one backend
pub trait BackendAdapter: Send + Sync {
    fn build_request(&self, prompt: &str) -> Result<HttpRequest, serde_json::Error>;

    /// The generated text, if the response envelope carries it
    fn extract_text(&self, body: &serde_json::Value) -> Option<String>;

    /// Transport failure message, including how to fix the usual cause
    fn unreachable_message(&self, cause: &str) -> String;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, backend: BackendId) -> Result<String, GenerationError>;
}

pub struct GenerationClient {
    tx: Arc<dyn HttpTransport>,
    ollama: OllamaAdapter,
    huggingface: HuggingFaceAdapter,
    gemini: GeminiAdapter,
    default_backend: BackendId,
}

impl GenerationClient {
    pub fn new(tx: Arc<dyn HttpTransport>, cfg: &LlmConfig) -> Self {
        Self {
            tx,
            ollama: OllamaAdapter::new(cfg.ollama.clone()),
            huggingface: HuggingFaceAdapter::new(cfg.huggingface.clone()),
            gemini: GeminiAdapter::new(cfg.gemini.clone()),
            default_backend: select_backend(&cfg.default_backend, BackendId::Ollama),
        }
    }

    pub fn default_backend(&self) -> BackendId {
        self.default_backend
    }

    /// Resolve a user-supplied backend name against this client's default
    pub fn select(&self, name: &str) -> BackendId {
        select_backend(name, self.default_backend)
    }

    fn adapter(&self, backend: BackendId) -> &dyn BackendAdapter {
        match backend {
            BackendId::Ollama => &self.ollama,
            BackendId::HuggingFace => &self.huggingface,
            BackendId::Gemini => &self.gemini,
        }
    }
}

#[async_trait]
impl TextGenerator for GenerationClient {
    async fn generate(&self, prompt: &str, backend: BackendId) -> Result<String, GenerationError> {
        let adapter = self.adapter(backend);
        let req = adapter
            .build_request(prompt)
            .map_err(|e| GenerationError::Request(e.to_string()))?;
        tracing::info!("Sending prompt to {} ({} chars)", backend.label(), prompt.len());

        let reply = self
            .tx
            .send(&req)
            .await
            .map_err(|e| GenerationError::Transport(adapter.unreachable_message(&e.0)))?;

        if !reply.is_success() {
            tracing::warn!("{} returned status {}", backend.label(), reply.status);
            return Err(GenerationError::Provider {
                code: reply.status,
                body: reply.body,
            });
        }

        let text = reply
            .json()
            .ok()
            .and_then(|body| adapter.extract_text(&body));
        Ok(text.unwrap_or_else(|| {
            tracing::warn!("{} response had no generated text", backend.label());
            NO_RESPONSE.to_string()
        }))
    }
}

//! Pluggable AI backend abstraction
//!
//! The AI layer is optional. Categorization and insight narratives both work
//! without it; a backend only improves their output.
//!
//! # Architecture
//!
//! - `AIBackend` trait: defines the interface for all AI operations
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `OpenAICompatibleBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (ollama, openai_compatible, mock). Default: ollama
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Default model name (default: llama3.2)
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required for openai_compatible backend)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-3.5-turbo)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)

mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;
pub mod types;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use types::*;

use async_trait::async_trait;

use crate::error::Result;

/// Trait defining the interface for all AI backends
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Zero-shot classification of a transaction description over `labels`
    async fn classify_category(&self, description: &str, labels: &[&str]) -> Result<CategoryGuess>;

    /// Short encouraging summary of one insight's data
    async fn narrate_insights(&self, data: &str) -> Result<String>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// OpenAI-compatible backend (vLLM, LocalAI, llama-server, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// Returns None if the required environment variables are not set.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "ollama".to_string());

        match backend.to_lowercase().as_str() {
            "ollama" => OllamaBackend::from_env().map(AIClient::Ollama),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to ollama");
                OllamaBackend::from_env().map(AIClient::Ollama)
            }
        }
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str, model: &str) -> Self {
        AIClient::Ollama(OllamaBackend::new(host, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        match self {
            AIClient::Ollama(b) => AIClient::Ollama(b.with_model(model)),
            AIClient::OpenAICompatible(b) => AIClient::OpenAICompatible(b.with_model(model)),
            AIClient::Mock(b) => AIClient::Mock(b.with_model(model)),
        }
    }
}

// Implement AIBackend for AIClient by delegating to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn classify_category(&self, description: &str, labels: &[&str]) -> Result<CategoryGuess> {
        match self {
            AIClient::Ollama(b) => b.classify_category(description, labels).await,
            AIClient::OpenAICompatible(b) => b.classify_category(description, labels).await,
            AIClient::Mock(b) => b.classify_category(description, labels).await,
        }
    }

    async fn narrate_insights(&self, data: &str) -> Result<String> {
        match self {
            AIClient::Ollama(b) => b.narrate_insights(data).await,
            AIClient::OpenAICompatible(b) => b.narrate_insights(data).await,
            AIClient::Mock(b) => b.narrate_insights(data).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.model(),
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_client_classifies_by_keyword() {
        let client = AIClient::mock();
        let guess = client
            .classify_category("Uber to office", &["Food", "Transport", "Other"])
            .await
            .unwrap();
        assert_eq!(guess.label, "Transport");
        assert!(guess.score > 0.3);

        let unknown = client
            .classify_category("zzz", &["Food", "Transport", "Other"])
            .await
            .unwrap();
        assert_eq!(unknown.label, "Other");
    }

    #[tokio::test]
    async fn test_mock_client_health_and_identity() {
        let client = AIClient::mock();
        assert!(client.health_check().await);
        assert_eq!(client.model(), "mock");
        assert_eq!(client.with_model("x").model(), "mock");

        let down = AIClient::Mock(MockBackend::unhealthy());
        assert!(!down.health_check().await);
    }

    #[tokio::test]
    async fn test_failing_mock_errors() {
        let client = AIClient::Mock(MockBackend::failing());
        assert!(client.narrate_insights("data").await.is_err());
        assert!(client.classify_category("x", &["Food"]).await.is_err());
    }

    #[test]
    fn test_ollama_constructor() {
        let client = AIClient::ollama("http://localhost:11434", "llama3.2");
        assert_eq!(client.host(), "http://localhost:11434");
        assert_eq!(client.model(), "llama3.2");
    }
}

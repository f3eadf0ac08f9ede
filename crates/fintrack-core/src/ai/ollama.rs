//! Ollama backend implementation
//!
//! HTTP client for the Ollama `/api/generate` endpoint. Prompts come from the
//! prompt library so they can be overridden without rebuilding.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::prompts::{PromptId, PromptLibrary};

use super::parsing::{parse_category_guess, parse_narrative};
use super::types::CategoryGuess;
use super::AIBackend;

/// Ollama backend
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl OllamaBackend {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
        }
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    /// Create from environment variables
    ///
    /// Required: `OLLAMA_HOST`. Optional: `OLLAMA_MODEL` (default: llama3.2)
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        Some(Self::new(&host, &model))
    }

    fn render(&self, id: PromptId, vars: &HashMap<&str, &str>) -> Result<String> {
        let mut prompts = self
            .prompts
            .write()
            .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
        let template = prompts.get(id)?;
        Ok(template.render_user(vars))
    }

    async fn generate(&self, prompt: String) -> Result<String> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt,
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let ollama_response: OllamaResponse = response.json().await?;
        debug!("Ollama response: {}", ollama_response.response);
        Ok(ollama_response.response)
    }
}

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl AIBackend for OllamaBackend {
    async fn classify_category(&self, description: &str, labels: &[&str]) -> Result<CategoryGuess> {
        let label_list = labels.join(", ");
        let mut vars = HashMap::new();
        vars.insert("description", description);
        vars.insert("labels", label_list.as_str());
        let prompt = self.render(PromptId::ClassifyCategory, &vars)?;

        let response = self.generate(prompt).await?;
        parse_category_guess(&response, labels)
    }

    async fn narrate_insights(&self, data: &str) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("data", data);
        let prompt = self.render(PromptId::InsightNarrative, &vars)?;

        let response = self.generate(prompt).await?;
        parse_narrative(&response)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockOllamaServer;

    #[tokio::test]
    async fn test_classify_against_mock_server() {
        let server = MockOllamaServer::start(r#"{"label": "Transport", "score": 0.91}"#).await;
        let backend = OllamaBackend::new(&server.url(), "test-model");

        let guess = backend
            .classify_category("Uber to airport", &["Food", "Transport"])
            .await
            .unwrap();
        assert_eq!(guess.label, "Transport");
        assert!(guess.score > 0.9);
        assert!(backend.health_check().await);
    }

    #[tokio::test]
    async fn test_narrate_against_mock_server() {
        let server = MockOllamaServer::start("You are doing great. Keep it up.").await;
        let backend = OllamaBackend::new(&server.url(), "test-model");

        let text = backend.narrate_insights("Forecast: Food").await.unwrap();
        assert_eq!(text, "You are doing great. Keep it up.");
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let backend = OllamaBackend::new("http://127.0.0.1:1", "test-model");
        assert!(!backend.health_check().await);
        assert!(backend.narrate_insights("x").await.is_err());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let backend = OllamaBackend::new("http://localhost:11434/", "m");
        assert_eq!(backend.host(), "http://localhost:11434");
        assert_eq!(backend.with_model("other").model(), "other");
    }
}

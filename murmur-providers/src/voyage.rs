//! Voyage text-embedding adapter

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use murmur_core::embedding::{Embedding, Vector};

use crate::transport::{HttpTransport, Transport};
use crate::{Error, Result};

const VOYAGE_API_URL: &str = "https://api.voyageai.com/v1/embeddings";

/// Voyage model constants
/// General-purpose embedding model - the default
pub const VOYAGE_2: &str = "voyage-2";
/// Larger general-purpose model
pub const VOYAGE_LARGE_2: &str = "voyage-large-2";
/// Code-tuned model
pub const VOYAGE_CODE_2: &str = "voyage-code-2";
/// Lightweight instruct model
pub const VOYAGE_LITE_02_INSTRUCT: &str = "voyage-lite-02-instruct";

fn default_allowed_models() -> Vec<String> {
    vec![
        VOYAGE_2.to_string(),
        VOYAGE_LARGE_2.to_string(),
        VOYAGE_CODE_2.to_string(),
        VOYAGE_LITE_02_INSTRUCT.to_string(),
    ]
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Voyage AI embeddings API client
pub struct VoyageEmbedding {
    transport: Arc<dyn Transport>,
    api_key: String,
    model: String,
    api_url: String,
}

impl VoyageEmbedding {
    /// Create from API key and model, with the default allow-list
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::with_allowed_models(api_key, model, default_allowed_models())
    }

    /// Create from environment variable VOYAGE_API_KEY
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("VOYAGE_API_KEY")
            .map_err(|_| Error::ProviderAuth("VOYAGE_API_KEY not set".to_string()))?;
        Self::new(api_key, VOYAGE_2)
    }

    /// Create with an injected model allow-list
    pub fn with_allowed_models(
        api_key: impl Into<String>,
        model: impl Into<String>,
        allowed_models: Vec<String>,
    ) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new()?);
        Self::with_transport(api_key, model, allowed_models, transport)
    }

    /// Create with an injected transport (used by tests)
    pub fn with_transport(
        api_key: impl Into<String>,
        model: impl Into<String>,
        allowed_models: Vec<String>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let model = model.into();
        if !allowed_models.iter().any(|m| m == &model) {
            return Err(Error::Config(format!(
                "invalid model '{}', allowed models are: {}",
                model,
                allowed_models.join(", ")
            )));
        }

        Ok(Self {
            transport,
            api_key: api_key.into(),
            model,
            api_url: VOYAGE_API_URL.to_string(),
        })
    }

    /// The configured model identifier
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| Error::Internal(e.to_string()))?,
        );
        Ok(headers)
    }
}

#[async_trait]
impl Embedding for VoyageEmbedding {
    async fn transform(&self, data: &[String]) -> Result<Vec<Vector>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let payload = serde_json::to_value(EmbeddingRequest {
            input: data,
            model: &self.model,
        })?;
        tracing::debug!(model = %self.model, count = data.len(), "dispatching embedding request");

        let response = self
            .transport
            .unary_call(&self.api_url, self.build_headers()?, &payload)
            .await?;

        let parsed: EmbeddingResponse = serde_json::from_value(response)
            .map_err(|e| Error::response_shape(format!("invalid embedding response: {}", e)))?;

        Ok(parsed
            .data
            .into_iter()
            .map(|d| Vector::new(d.embedding))
            .collect())
    }
}

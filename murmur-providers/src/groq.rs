//! Groq vision chat adapter
//!
//! Wraps the Groq OpenAI-compatible chat-completions API behind the
//! conversation-update operations: `predict` (unary), `stream` (incremental
//! deltas with commit-at-end), and `batch` (bounded-concurrency fan-out).

use std::sync::Arc;

use futures::Stream;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use murmur_core::batch::run_bounded;
use murmur_core::conversation::Conversation;
use murmur_core::message::{Content, Message, UsageData};
use murmur_core::streaming::{reassemble, Frame};

use crate::transport::{HttpTransport, Transport};
use crate::{Error, Result};

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

const SSE_DATA_PREFIX: &str = "data: ";
const SSE_DONE: &str = "[DONE]";

/// Groq model constants
/// Llama 3.2 11B vision preview - the default vision model
pub const LLAMA_3_2_11B_VISION: &str = "llama-3.2-11b-vision-preview";

fn default_allowed_models() -> Vec<String> {
    vec![LLAMA_3_2_11B_VISION.to_string()]
}

/// Sampling and output parameters for one chat completion
#[derive(Debug, Clone)]
pub struct GenerationParams {
    /// Sampling temperature
    pub temperature: f64,
    /// Maximum tokens to generate
    pub max_tokens: u64,
    /// Nucleus sampling cumulative probability
    pub top_p: f64,
    /// Stop sequences
    pub stop: Vec<String>,
    /// Request a JSON-object response
    pub json_mode: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 256,
            top_p: 1.0,
            stop: Vec::new(),
            json_mode: false,
        }
    }
}

/// A message in the wire shape expected by the chat API
#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    content: serde_json::Value,
}

/// Streaming chunk from the chat API
#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

/// Groq vision-model API client
pub struct GroqVision {
    transport: Arc<dyn Transport>,
    api_key: String,
    model: String,
    api_url: String,
}

impl GroqVision {
    /// Create from API key and model, with the default allow-list
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::with_allowed_models(api_key, model, default_allowed_models())
    }

    /// Create from environment variable GROQ_API_KEY
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GROQ_API_KEY")
            .map_err(|_| Error::ProviderAuth("GROQ_API_KEY not set".to_string()))?;
        Self::new(api_key, LLAMA_3_2_11B_VISION)
    }

    /// Create with an injected model allow-list
    ///
    /// The model identifier is checked here; an unknown identifier fails
    /// immediately without any network activity.
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
            api_url: GROQ_API_URL.to_string(),
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

    /// Map conversation messages into the wire shape
    ///
    /// Optional fields that are `None` are omitted entirely. Structured
    /// content blocks pass through with their `type` tag preserved; block
    /// contents are not validated here.
    fn format_messages(messages: &[Message]) -> Result<Vec<WireMessage>> {
        messages
            .iter()
            .map(|message| {
                let content = match &message.content {
                    Content::Text(text) => serde_json::Value::String(text.clone()),
                    Content::Parts(parts) => serde_json::to_value(parts)?,
                };
                Ok(WireMessage {
                    role: message.role.as_str().to_string(),
                    name: message.name.clone(),
                    content,
                })
            })
            .collect()
    }

    fn build_payload(
        &self,
        conversation: &Conversation,
        params: &GenerationParams,
        stream: bool,
    ) -> Result<serde_json::Value> {
        let mut payload = serde_json::json!({
            "model": self.model,
            "messages": Self::format_messages(conversation.history())?,
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
            "top_p": params.top_p,
            "stop": params.stop,
        });
        if params.json_mode {
            payload["response_format"] = serde_json::json!({ "type": "json_object" });
        }
        if stream {
            payload["stream"] = serde_json::Value::Bool(true);
        }
        Ok(payload)
    }

    /// Generate a completion and append it to the conversation
    ///
    /// On success exactly one assistant message is appended, carrying the
    /// validated token usage when the response reports any. On any transport,
    /// shape, or usage-validation error the conversation is left untouched.
    pub async fn predict(
        &self,
        conversation: &mut Conversation,
        params: &GenerationParams,
    ) -> Result<()> {
        let payload = self.build_payload(conversation, params, false)?;
        tracing::debug!(model = %self.model, "dispatching chat completion");

        let response = self
            .transport
            .unary_call(&self.api_url, self.build_headers()?, &payload)
            .await?;

        let content = response
            .pointer("/choices/0/message/content")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| Error::response_shape("response missing choices[0].message.content"))?
            .to_string();

        // Absent (or null) usage is represented as None; a present but
        // malformed mapping fails the whole operation.
        let usage = match response.get("usage").filter(|u| !u.is_null()) {
            Some(raw) => Some(UsageData::from_response(raw)?),
            None => None,
        };

        let mut message = Message::assistant(content);
        if let Some(usage) = usage {
            message = message.with_usage(usage);
        }
        conversation.add_message(message);
        Ok(())
    }

    /// Stream a completion, yielding text fragments as they arrive
    ///
    /// The full accumulation is appended to the conversation as one assistant
    /// message when the provider stream ends. Dropping the returned stream
    /// before it ends appends nothing; a mid-stream transport error is yielded
    /// and likewise appends nothing.
    pub async fn stream<'a>(
        &'a self,
        conversation: &'a mut Conversation,
        params: &GenerationParams,
    ) -> Result<impl Stream<Item = Result<String>> + 'a> {
        let payload = self.build_payload(conversation, params, true)?;
        tracing::debug!(model = %self.model, "dispatching streaming chat completion");

        let lines = self
            .transport
            .stream_call(&self.api_url, self.build_headers()?, &payload)
            .await?;

        Ok(reassemble(lines, conversation, decode_frame))
    }

    /// Update many conversations with bounded concurrency
    ///
    /// At most `max_concurrent` requests are in flight at once. Items fail
    /// independently; results come back in input order.
    pub async fn batch(
        &self,
        conversations: Vec<Conversation>,
        params: &GenerationParams,
        max_concurrent: usize,
    ) -> Vec<Result<Conversation>> {
        run_bounded(conversations, max_concurrent, |mut conversation| async move {
            self.predict(&mut conversation, params).await?;
            Ok(conversation)
        })
        .await
    }
}

/// Classify one line of the SSE stream
///
/// Keep-alives, the `[DONE]` sentinel, and well-formed chunks without a text
/// delta are control frames; undecodable lines are discarded without
/// aborting reassembly.
fn decode_frame(line: &str) -> Frame {
    let data = line.strip_prefix(SSE_DATA_PREFIX).unwrap_or(line).trim();
    if data.is_empty() || data == SSE_DONE {
        return Frame::Control;
    }

    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => match chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
        {
            Some(delta) if !delta.is_empty() => Frame::Delta(delta),
            _ => Frame::Control,
        },
        Err(_) => Frame::Discard,
    }
}

//! Transport abstraction over unary and streaming HTTP exchanges
//!
//! Adapters talk to providers exclusively through [`Transport`], so the same
//! request/reassembly logic runs against real HTTP and against canned
//! responses in tests.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::header::HeaderMap;

use murmur_core::streaming::LineStream;

use crate::utils::LineBuffer;
use crate::{Error, HttpConfig, Result};

/// Capability set a provider adapter requires of its HTTP layer
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a request and return the full JSON response document
    async fn unary_call(
        &self,
        url: &str,
        headers: HeaderMap,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value>;

    /// Execute a request and return the response body as a stream of lines
    async fn stream_call(
        &self,
        url: &str,
        headers: HeaderMap,
        payload: &serde_json::Value,
    ) -> Result<LineStream>;
}

/// HTTP transport backed by a pooled reqwest client
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create with default HTTP configuration
    pub fn new() -> Result<Self> {
        Self::with_config(&HttpConfig::default())
    }

    /// Create from an explicit HTTP configuration
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            client: config.build_client()?,
        })
    }

    async fn send(
        &self,
        url: &str,
        headers: HeaderMap,
        payload: &serde_json::Value,
    ) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::ProviderApi(format!("API error {}: {}", status, text)));
        }

        Ok(response)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn unary_call(
        &self,
        url: &str,
        headers: HeaderMap,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let response = self.send(url, headers, payload).await?;
        Ok(response.json().await?)
    }

    async fn stream_call(
        &self,
        url: &str,
        headers: HeaderMap,
        payload: &serde_json::Value,
    ) -> Result<LineStream> {
        let response = self.send(url, headers, payload).await?;
        Ok(frame_lines(response.bytes_stream()))
    }
}

/// Frame a byte stream into complete text lines
fn frame_lines<S>(stream: S) -> LineStream
where
    S: Stream<Item = std::result::Result<bytes::Bytes, reqwest::Error>> + Send + Unpin + 'static,
{
    struct State<S> {
        stream: S,
        buffer: LineBuffer,
        source_done: bool,
    }

    let state = State {
        stream,
        buffer: LineBuffer::new(),
        source_done: false,
    };

    Box::pin(futures::stream::unfold(Some(state), |state| async move {
        let mut state = state?;
        loop {
            match state.buffer.next_line() {
                Ok(Some(line)) => return Some((Ok(line), Some(state))),
                Ok(None) => {}
                Err(e) => return Some((Err(e), None)),
            }

            if state.source_done {
                return match state.buffer.take_remaining() {
                    Ok(Some(rest)) => Some((Ok(rest), Some(state))),
                    Ok(None) => None,
                    Err(e) => Some((Err(e), None)),
                };
            }

            match state.stream.next().await {
                Some(Ok(bytes)) => {
                    if let Err(e) = state.buffer.push(&bytes) {
                        return Some((Err(e), None));
                    }
                }
                Some(Err(e)) => return Some((Err(Error::Http(e)), None)),
                None => state.source_done = true,
            }
        }
    }))
}

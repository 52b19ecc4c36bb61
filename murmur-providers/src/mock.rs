//! Mock transport for testing

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use murmur_core::streaming::LineStream;

use crate::transport::Transport;
use crate::{Error, Result};

enum CannedLine {
    Line(String),
    Error(String),
}

/// A transport that serves canned responses instead of making network calls
#[derive(Default)]
pub struct MockTransport {
    unary_response: Option<serde_json::Value>,
    unary_error: Option<String>,
    stream_lines: Vec<CannedLine>,
    calls: AtomicUsize,
    last_payload: Mutex<Option<serde_json::Value>>,
}

impl MockTransport {
    /// Create a mock with no canned responses
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the JSON document returned by `unary_call`
    pub fn unary_response(mut self, response: serde_json::Value) -> Self {
        self.unary_response = Some(response);
        self
    }

    /// Make `unary_call` fail with a provider API error
    pub fn unary_error(mut self, message: impl Into<String>) -> Self {
        self.unary_error = Some(message.into());
        self
    }

    /// Append a line to the canned stream
    pub fn stream_line(mut self, line: impl Into<String>) -> Self {
        self.stream_lines.push(CannedLine::Line(line.into()));
        self
    }

    /// Append a transport error to the canned stream
    pub fn stream_error(mut self, message: impl Into<String>) -> Self {
        self.stream_lines.push(CannedLine::Error(message.into()));
        self
    }

    /// Number of calls made through this transport
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The payload of the most recent call, if any
    pub fn last_payload(&self) -> Option<serde_json::Value> {
        self.last_payload.lock().ok().and_then(|p| p.clone())
    }

    fn record(&self, payload: &serde_json::Value) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_payload.lock() {
            *last = Some(payload.clone());
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn unary_call(
        &self,
        _url: &str,
        _headers: HeaderMap,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        self.record(payload);
        if let Some(message) = &self.unary_error {
            return Err(Error::ProviderApi(message.clone()));
        }
        self.unary_response
            .clone()
            .ok_or_else(|| Error::Internal("no canned unary response".to_string()))
    }

    async fn stream_call(
        &self,
        _url: &str,
        _headers: HeaderMap,
        payload: &serde_json::Value,
    ) -> Result<LineStream> {
        self.record(payload);
        let items: Vec<Result<String>> = self
            .stream_lines
            .iter()
            .map(|line| match line {
                CannedLine::Line(s) => Ok(s.clone()),
                CannedLine::Error(m) => Err(Error::ProviderApi(m.clone())),
            })
            .collect();
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

//! Message and token-usage types for LLM communication

use serde::{Deserialize, Serialize};

/// Role of the message sender
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message (instructions)
    System,
    /// User message
    User,
    /// Assistant (AI) message
    Assistant,
}

impl Role {
    /// Wire name of the role
    pub fn as_str(&self) -> &str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Content of a message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// Simple text content
    Text(String),
    /// Structured content with multiple typed blocks
    Parts(Vec<ContentPart>),
}

impl Content {
    /// Create text content
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create multi-part content
    pub fn parts(parts: Vec<ContentPart>) -> Self {
        Self::Parts(parts)
    }

    /// Get as text (concatenates text parts if needed)
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(t) => t.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// A block of structured content
///
/// Blocks keep their `type` discriminator on the wire and pass any extra
/// fields through untouched; adapters do not reinterpret them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text content
    Text {
        /// The text
        text: String,
    },
    /// Image content (base64 or URL)
    Image {
        /// Image source (base64 data or URL)
        source: ImageSource,
    },
}

/// Source for image content
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSource {
    /// Base64 encoded image
    Base64 {
        /// Media type (e.g., "image/png")
        media_type: String,
        /// Base64 encoded data
        data: String,
    },
    /// URL to an image
    Url {
        /// Image URL
        url: String,
    },
}

/// Token usage reported by a provider for one completion
///
/// Validation is strict: a usage mapping that is present but missing any of
/// the required counters fails with [`Error::UsageValidation`] rather than
/// defaulting to zero. A response with no usage mapping at all is represented
/// as `usage: None` on the appended message.
///
/// [`Error::UsageValidation`]: crate::error::Error::UsageValidation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageData {
    /// Tokens consumed by the prompt
    pub prompt_tokens: u64,
    /// Tokens generated for the completion
    pub completion_tokens: u64,
    /// Total tokens billed
    pub total_tokens: u64,
}

impl UsageData {
    /// Validate a raw usage mapping from a provider response
    ///
    /// Unknown extra fields (queue times, per-stage timings) are ignored.
    pub fn from_response(raw: &serde_json::Value) -> crate::error::Result<Self> {
        serde_json::from_value(raw.clone())
            .map_err(|e| crate::error::Error::UsageValidation(format!("invalid usage data: {}", e)))
    }
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the sender
    pub role: Role,
    /// Content of the message
    pub content: Content,
    /// Optional name (for multi-participant scenarios)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Token usage for the completion that produced this message, if reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageData>,
}

impl Message {
    /// Create a new message
    pub fn new(role: Role, content: impl Into<Content>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
            usage: None,
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<Content>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<Content>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<Content>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Set the name for this message
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach token usage to this message
    pub fn with_usage(mut self, usage: UsageData) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Get the text content of this message
    pub fn text(&self) -> String {
        self.content.as_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), "Hello");
        assert!(msg.usage.is_none());
    }

    #[test]
    fn test_content_part_tag_preserved() {
        let part = ContentPart::Text {
            text: "hi".to_string(),
        };
        let value = serde_json::to_value(&part).expect("serialize should succeed");
        assert_eq!(value["type"], "text");
        assert_eq!(value["text"], "hi");
    }

    #[test]
    fn test_name_omitted_when_none() {
        let msg = Message::user("Hello");
        let value = serde_json::to_value(&msg).expect("serialize should succeed");
        assert!(value.get("name").is_none());
        assert!(value.get("usage").is_none());
    }

    #[test]
    fn test_usage_valid() {
        let raw = serde_json::json!({
            "prompt_tokens": 12,
            "completion_tokens": 34,
            "total_tokens": 46,
            "queue_time": 0.002
        });
        let usage = UsageData::from_response(&raw).expect("valid usage should parse");
        assert_eq!(usage.prompt_tokens, 12);
        assert_eq!(usage.completion_tokens, 34);
        assert_eq!(usage.total_tokens, 46);
    }

    #[test]
    fn test_usage_missing_field_fails() {
        let raw = serde_json::json!({ "prompt_tokens": 12 });
        let err = UsageData::from_response(&raw).expect_err("missing fields must fail");
        assert!(matches!(err, crate::error::Error::UsageValidation(_)));
    }

    #[test]
    fn test_usage_malformed_fails() {
        let raw = serde_json::json!({
            "prompt_tokens": "twelve",
            "completion_tokens": 34,
            "total_tokens": 46
        });
        assert!(UsageData::from_response(&raw).is_err());
    }
}

//! # Murmur Core
//!
//! Core types and streaming primitives for the Murmuration LLM adapters.
//!
//! This crate provides:
//! - Message types (`message`) - Conversation messages and token usage
//! - Conversation (`conversation`) - Append-only message history
//! - Streaming (`streaming`) - Delta reassembly and conversation commit
//! - Batch (`batch`) - Bounded-concurrency batch execution
//! - Embedding (`embedding`) - Embedding trait and vector type

#![warn(missing_docs)]

pub mod batch;
pub mod conversation;
pub mod embedding;
pub mod error;
pub mod logging;
pub mod message;
pub mod streaming;

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::batch::run_bounded;
    pub use crate::conversation::Conversation;
    pub use crate::embedding::{Embedding, Vector};
    pub use crate::error::{Error, Result};
    pub use crate::message::{Content, ContentPart, ImageSource, Message, Role, UsageData};
    pub use crate::streaming::{reassemble, Frame, LineStream};
}

//! Embedding trait and vector type

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A dense embedding vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    /// Vector components
    pub value: Vec<f32>,
}

impl Vector {
    /// Create a vector from its components
    pub fn new(value: Vec<f32>) -> Self {
        Self { value }
    }

    /// Dimensionality of the vector
    pub fn dim(&self) -> usize {
        self.value.len()
    }
}

/// Trait for text-embedding providers
#[async_trait]
pub trait Embedding: Send + Sync {
    /// Transform a batch of texts into embedding vectors
    async fn transform(&self, data: &[String]) -> Result<Vec<Vector>>;

    /// Transform a single text
    async fn infer_vector(&self, data: &str) -> Result<Vec<Vector>> {
        self.transform(&[data.to_string()]).await
    }
}

//! Test adapter construction (without needing API keys)
//!
//! Run with: cargo test --package murmur-providers --all-features

#[cfg(feature = "groq")]
#[test]
fn test_groq_vision_creation() {
    use crate::groq::{GroqVision, LLAMA_3_2_11B_VISION};
    let adapter = GroqVision::new("test-key", LLAMA_3_2_11B_VISION);
    assert!(adapter.is_ok());
    let adapter = adapter.unwrap();
    assert_eq!(adapter.model(), LLAMA_3_2_11B_VISION);
}

#[cfg(feature = "groq")]
#[test]
fn test_groq_vision_rejects_unknown_model() {
    use crate::groq::GroqVision;
    assert!(GroqVision::new("test-key", "gpt-4o").is_err());
}

#[cfg(feature = "voyage")]
#[test]
fn test_voyage_creation() {
    use crate::voyage::{VoyageEmbedding, VOYAGE_CODE_2};
    let adapter = VoyageEmbedding::new("test-key", VOYAGE_CODE_2);
    assert!(adapter.is_ok());
    let adapter = adapter.unwrap();
    assert_eq!(adapter.model(), VOYAGE_CODE_2);
}

#[cfg(feature = "voyage")]
#[test]
fn test_voyage_rejects_unknown_model() {
    use crate::voyage::VoyageEmbedding;
    assert!(VoyageEmbedding::new("test-key", "voyage-99").is_err());
}

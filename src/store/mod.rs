//! Knowledge store — vector storage for captured text.
//!
//! `KnowledgeStore` abstracts the vector database behind the operations the
//! rest of the system needs; the production implementation is `QdrantStore`
//! over the Qdrant REST API. Embedding happens inside the store so callers
//! only ever hand it text.

pub mod qdrant;

pub use qdrant::QdrantStore;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::errors::ApiError;

/// Payload key under which the original text is stored, so it comes back
/// with every search hit.
pub const TEXT_PAYLOAD_KEY: &str = "text";

/// One nearest-neighbor match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Cosine similarity, higher is more similar.
    pub score: f32,
    /// The stored payload, including the original text and metadata.
    pub payload: Value,
}

impl SearchHit {
    /// The stored text, if the payload carries one.
    pub fn text(&self) -> Option<&str> {
        self.payload.get(TEXT_PAYLOAD_KEY).and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    pub total_points: u64,
    pub vectors_count: u64,
    pub status: String,
}

/// Abstract interface over the vector database.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Idempotent: create the collection (embedding dimension, cosine
    /// distance) if it does not exist yet.
    async fn ensure_collection(&self) -> Result<(), ApiError>;

    /// Embed and store one text; returns the fresh point id. The point is
    /// visible to searches once this returns.
    async fn add_text(&self, text: &str, metadata: Option<Value>) -> Result<String, ApiError>;

    /// Embed and store several texts as one batch. `metadatas` must match
    /// `texts` in length or be absent.
    async fn add_texts_batch(
        &self,
        texts: &[String],
        metadatas: Option<Vec<Value>>,
    ) -> Result<Vec<String>, ApiError>;

    /// Nearest neighbors for the query text, best match first.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, ApiError>;

    async fn stats(&self) -> Result<CollectionStats, ApiError>;

    /// Irreversibly drop the collection and everything in it. Callers that
    /// keep using the store must `ensure_collection` again.
    async fn delete_collection(&self) -> Result<(), ApiError>;
}

/// Build the point payload for a text: caller metadata (if any), a
/// `timestamp` stamped in when absent, and the text itself under
/// `TEXT_PAYLOAD_KEY`.
pub fn build_payload(text: &str, metadata: Option<Value>) -> Value {
    let mut map = match metadata {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    map.entry("timestamp".to_string())
        .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
    map.insert(
        TEXT_PAYLOAD_KEY.to_string(),
        Value::String(text.to_string()),
    );
    Value::Object(map)
}

/// Validate a batch's metadata list against its texts; absent means one
/// empty metadata object per text.
pub fn normalize_batch_metadata(
    texts: &[String],
    metadatas: Option<Vec<Value>>,
) -> Result<Vec<Value>, ApiError> {
    match metadatas {
        Some(list) if list.len() != texts.len() => Err(ApiError::BadRequest(format!(
            "metadata list length {} does not match {} texts",
            list.len(),
            texts.len()
        ))),
        Some(list) => Ok(list),
        None => Ok(vec![Value::Object(Map::new()); texts.len()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_keeps_metadata_and_adds_text() {
        let payload = build_payload("hello world", Some(json!({"source": "screenshot"})));
        assert_eq!(payload["source"], "screenshot");
        assert_eq!(payload[TEXT_PAYLOAD_KEY], "hello world");
        assert!(payload["timestamp"].is_string());
    }

    #[test]
    fn payload_respects_existing_timestamp() {
        let payload = build_payload("t", Some(json!({"timestamp": "2024-01-01T00:00:00Z"})));
        assert_eq!(payload["timestamp"], "2024-01-01T00:00:00Z");
    }

    #[test]
    fn payload_tolerates_non_object_metadata() {
        let payload = build_payload("t", Some(json!("not a map")));
        assert_eq!(payload[TEXT_PAYLOAD_KEY], "t");
    }

    #[test]
    fn batch_metadata_length_mismatch_is_rejected() {
        let texts = vec!["a".to_string(), "b".to_string()];
        let err = normalize_batch_metadata(&texts, Some(vec![json!({})])).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let defaults = normalize_batch_metadata(&texts, None).unwrap();
        assert_eq!(defaults.len(), 2);
    }
}

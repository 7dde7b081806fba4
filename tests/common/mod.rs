//! Shared test doubles: an in-memory knowledge store with a deterministic
//! bag-of-words embedder, a stub LLM provider, and a stub capture source.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::net::TcpListener;
use uuid::Uuid;

use second_brain::capture::{CaptureRegion, CaptureSource};
use second_brain::config::AppConfig;
use second_brain::core::errors::ApiError;
use second_brain::llm::{ChatRequest, LlmProvider};
use second_brain::rag::QueryPipeline;
use second_brain::server::router::router;
use second_brain::state::{AppState, Components};
use second_brain::store::{
    build_payload, normalize_batch_metadata, CollectionStats, KnowledgeStore, SearchHit,
};

pub const EMBED_DIM: usize = 64;

/// Deterministic bag-of-words embedding: texts sharing words land close
/// under cosine similarity.
pub fn hash_embed(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; EMBED_DIM];
    for word in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in word.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        vector[(hash % EMBED_DIM as u64) as usize] += 1.0;
    }
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

struct MemPoint {
    id: String,
    vector: Vec<f32>,
    payload: Value,
}

/// In-memory `KnowledgeStore` with the same visible semantics as the
/// Qdrant adapter.
#[derive(Default)]
pub struct MemoryStore {
    points: Mutex<Vec<MemPoint>>,
    deleted: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_exists(&self) -> Result<(), ApiError> {
        if self.deleted.load(Ordering::SeqCst) {
            Err(ApiError::Upstream("collection does not exist".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KnowledgeStore for MemoryStore {
    async fn ensure_collection(&self) -> Result<(), ApiError> {
        self.deleted.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn add_text(&self, text: &str, metadata: Option<Value>) -> Result<String, ApiError> {
        self.check_exists()?;
        let id = Uuid::new_v4().to_string();
        self.points.lock().unwrap().push(MemPoint {
            id: id.clone(),
            vector: hash_embed(text),
            payload: build_payload(text, metadata),
        });
        Ok(id)
    }

    async fn add_texts_batch(
        &self,
        texts: &[String],
        metadatas: Option<Vec<Value>>,
    ) -> Result<Vec<String>, ApiError> {
        self.check_exists()?;
        let metadatas = normalize_batch_metadata(texts, metadatas)?;
        let mut ids = Vec::with_capacity(texts.len());
        let mut points = self.points.lock().unwrap();
        for (text, metadata) in texts.iter().zip(metadatas) {
            let id = Uuid::new_v4().to_string();
            points.push(MemPoint {
                id: id.clone(),
                vector: hash_embed(text),
                payload: build_payload(text, Some(metadata)),
            });
            ids.push(id);
        }
        Ok(ids)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, ApiError> {
        self.check_exists()?;
        let query_vec = hash_embed(query);
        let points = self.points.lock().unwrap();
        let mut hits: Vec<SearchHit> = points
            .iter()
            .map(|p| SearchHit {
                score: cosine(&query_vec, &p.vector),
                payload: p.payload.clone(),
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn stats(&self) -> Result<CollectionStats, ApiError> {
        self.check_exists()?;
        let count = self.points.lock().unwrap().len() as u64;
        Ok(CollectionStats {
            total_points: count,
            vectors_count: count,
            status: "green".to_string(),
        })
    }

    async fn delete_collection(&self) -> Result<(), ApiError> {
        self.points.lock().unwrap().clear();
        self.deleted.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Stub LLM: canned chat reply, deterministic embeddings, records the last
/// prompt it saw.
pub struct StubLlm {
    pub reply: String,
    pub fail_chat: bool,
    pub last_prompt: Mutex<Option<String>>,
}

impl StubLlm {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            fail_chat: false,
            last_prompt: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: String::new(),
            fail_chat: true,
            last_prompt: Mutex::new(None),
        }
    }
}

#[async_trait]
impl LlmProvider for StubLlm {
    fn name(&self) -> &str {
        "stub"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        Ok(true)
    }

    async fn chat(&self, request: ChatRequest, _model_id: &str) -> Result<String, ApiError> {
        if self.fail_chat {
            return Err(ApiError::Upstream("model exploded".to_string()));
        }
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        *self.last_prompt.lock().unwrap() = Some(prompt);
        Ok(self.reply.clone())
    }

    async fn embed(
        &self,
        inputs: &[String],
        _model_id: &str,
    ) -> Result<Vec<Vec<f32>>, ApiError> {
        Ok(inputs.iter().map(|text| hash_embed(text)).collect())
    }
}

/// Capture source that "extracts" a fixed text.
pub struct StubCapture {
    pub text: String,
}

#[async_trait]
impl CaptureSource for StubCapture {
    async fn capture_text(&self, _region: Option<CaptureRegion>) -> Result<String, ApiError> {
        Ok(self.text.clone())
    }
}

/// A `Ready` application state wired to the given doubles.
pub async fn ready_state(
    store: Arc<MemoryStore>,
    llm: Arc<StubLlm>,
    capture: Option<Arc<dyn CaptureSource>>,
) -> Arc<AppState> {
    let config = AppConfig::default();
    let store_dyn: Arc<dyn KnowledgeStore> = store;
    let llm_dyn: Arc<dyn LlmProvider> = llm;
    let pipeline = Arc::new(QueryPipeline::new(
        Arc::clone(&store_dyn),
        Arc::clone(&llm_dyn),
        config.ollama.chat_model.clone(),
        config.rag,
    ));
    AppState::with_components(
        config,
        Components {
            store: store_dyn,
            llm: llm_dyn,
            pipeline,
            capture,
        },
    )
    .await
}

/// Serve the router on an ephemeral port; returns the base URL.
pub async fn spawn_app(state: Arc<AppState>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

//! Qdrant REST adapter.
//!
//! Talks to a locally running Qdrant instance over its HTTP API. One
//! collection, cosine distance, dimension fixed at connect time to whatever
//! the embedding model produces.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{
    build_payload, normalize_batch_metadata, CollectionStats, KnowledgeStore, SearchHit,
};
use crate::config::QdrantConfig;
use crate::core::errors::ApiError;
use crate::llm::LlmProvider;

pub struct QdrantStore {
    client: Client,
    base_url: String,
    collection: String,
    llm: Arc<dyn LlmProvider>,
    embedding_model: String,
    dimension: usize,
}

impl QdrantStore {
    /// Connect to Qdrant: probe the embedding model once to learn its
    /// output dimension, then create the collection if absent.
    pub async fn connect(
        config: &QdrantConfig,
        llm: Arc<dyn LlmProvider>,
        embedding_model: &str,
    ) -> Result<Self, ApiError> {
        let probe = llm
            .embed(&["dimension probe".to_string()], embedding_model)
            .await?;
        let dimension = probe
            .first()
            .map(Vec::len)
            .filter(|len| *len > 0)
            .ok_or_else(|| {
                ApiError::Upstream(format!(
                    "embedding model {} returned an empty vector",
                    embedding_model
                ))
            })?;

        let store = Self {
            client: Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            llm,
            embedding_model: embedding_model.to_string(),
            dimension,
        };

        store.ensure_collection().await?;
        tracing::info!(
            "Connected to Qdrant at {} (collection {}, dimension {})",
            store.base_url,
            store.collection,
            store.dimension
        );

        Ok(store)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        self.llm.embed(inputs, &self.embedding_model).await
    }

    /// Upsert points with `wait=true` so they are searchable once the call
    /// returns.
    async fn upsert_points(&self, points: Vec<Value>) -> Result<(), ApiError> {
        let url = format!("{}/points?wait=true", self.collection_url());
        let res = self
            .client
            .put(&url)
            .json(&json!({ "points": points }))
            .send()
            .await
            .map_err(ApiError::upstream)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!("Qdrant upsert error: {}", text)));
        }

        Ok(())
    }
}

#[async_trait]
impl KnowledgeStore for QdrantStore {
    async fn ensure_collection(&self) -> Result<(), ApiError> {
        let res = self
            .client
            .get(self.collection_url())
            .send()
            .await
            .map_err(ApiError::upstream)?;

        match res.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                tracing::info!("Creating collection {}", self.collection);
                let body = json!({
                    "vectors": {
                        "size": self.dimension,
                        "distance": "Cosine",
                    }
                });
                let res = self
                    .client
                    .put(self.collection_url())
                    .json(&body)
                    .send()
                    .await
                    .map_err(ApiError::upstream)?;
                if !res.status().is_success() {
                    let text = res.text().await.unwrap_or_default();
                    return Err(ApiError::Upstream(format!(
                        "Qdrant create collection error: {}",
                        text
                    )));
                }
                Ok(())
            }
            status => Err(ApiError::Upstream(format!(
                "Qdrant collection check failed with status {}",
                status
            ))),
        }
    }

    async fn add_text(&self, text: &str, metadata: Option<Value>) -> Result<String, ApiError> {
        let inputs = [text.to_string()];
        let embedding = self
            .embed(&inputs)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Upstream("embedding call returned nothing".to_string()))?;

        let point_id = Uuid::new_v4().to_string();
        let payload = build_payload(text, metadata);

        self.upsert_points(vec![json!({
            "id": point_id,
            "vector": embedding,
            "payload": payload,
        })])
        .await?;

        Ok(point_id)
    }

    async fn add_texts_batch(
        &self,
        texts: &[String],
        metadatas: Option<Vec<Value>>,
    ) -> Result<Vec<String>, ApiError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let metadatas = normalize_batch_metadata(texts, metadatas)?;
        let embeddings = self.embed(texts).await?;

        let mut ids = Vec::with_capacity(texts.len());
        let mut points = Vec::with_capacity(texts.len());
        for ((text, embedding), metadata) in texts.iter().zip(embeddings).zip(metadatas) {
            let point_id = Uuid::new_v4().to_string();
            points.push(json!({
                "id": point_id,
                "vector": embedding,
                "payload": build_payload(text, Some(metadata)),
            }));
            ids.push(point_id);
        }

        self.upsert_points(points).await?;
        tracing::debug!("Added {} texts to {}", ids.len(), self.collection);

        Ok(ids)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, ApiError> {
        let inputs = [query.to_string()];
        let embedding = self
            .embed(&inputs)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Upstream("embedding call returned nothing".to_string()))?;

        let url = format!("{}/points/search", self.collection_url());
        let body = json!({
            "vector": embedding,
            "limit": limit,
            "with_payload": true,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::upstream)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!("Qdrant search error: {}", text)));
        }

        let payload: Value = res.json().await.map_err(ApiError::upstream)?;
        let hits = payload["result"]
            .as_array()
            .map(|results| {
                results
                    .iter()
                    .map(|hit| SearchHit {
                        score: hit["score"].as_f64().unwrap_or(0.0) as f32,
                        payload: hit.get("payload").cloned().unwrap_or(Value::Null),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(hits)
    }

    async fn stats(&self) -> Result<CollectionStats, ApiError> {
        let res = self
            .client
            .get(self.collection_url())
            .send()
            .await
            .map_err(ApiError::upstream)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!("Qdrant stats error: {}", text)));
        }

        let payload: Value = res.json().await.map_err(ApiError::upstream)?;
        let info = &payload["result"];

        Ok(CollectionStats {
            total_points: info["points_count"].as_u64().unwrap_or(0),
            vectors_count: info["vectors_count"]
                .as_u64()
                .unwrap_or_else(|| info["points_count"].as_u64().unwrap_or(0)),
            status: info["status"].as_str().unwrap_or("unknown").to_string(),
        })
    }

    async fn delete_collection(&self) -> Result<(), ApiError> {
        let res = self
            .client
            .delete(self.collection_url())
            .send()
            .await
            .map_err(ApiError::upstream)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!(
                "Qdrant delete collection error: {}",
                text
            )));
        }

        tracing::info!("Deleted collection {}", self.collection);
        Ok(())
    }
}

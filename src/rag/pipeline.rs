//! Query pipeline: retrieve nearest captures, stuff them into a prompt,
//! generate once, and return the answer with its sources.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::RagConfig;
use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::store::{KnowledgeStore, SearchHit, TEXT_PAYLOAD_KEY};

/// A retrieved record surfaced alongside the answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSnippet {
    /// Leading slice of the stored text.
    pub content: String,
    /// The record's metadata (payload minus the text itself).
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub text: String,
    pub sources: Vec<SourceSnippet>,
}

pub struct QueryPipeline {
    store: Arc<dyn KnowledgeStore>,
    llm: Arc<dyn LlmProvider>,
    chat_model: String,
    config: RagConfig,
}

impl QueryPipeline {
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        llm: Arc<dyn LlmProvider>,
        chat_model: String,
        config: RagConfig,
    ) -> Self {
        Self {
            store,
            llm,
            chat_model,
            config,
        }
    }

    /// Answer a question over the stored captures: top-k retrieval, one
    /// generation call, no refinement.
    pub async fn answer(&self, question: &str) -> Result<QueryAnswer, ApiError> {
        let hits = self.store.search(question, self.config.top_k).await?;

        let prompt = build_prompt(&hits, question);
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)]);
        let text = self.llm.chat(request, &self.chat_model).await?;

        let sources = hits
            .iter()
            .take(self.config.max_sources)
            .filter_map(|hit| snippet_from_hit(hit, self.config.snippet_chars))
            .collect();

        Ok(QueryAnswer { text, sources })
    }
}

/// Stuffed prompt: the retrieved texts followed by the question. The model
/// is told to admit ignorance rather than invent an answer.
fn build_prompt(hits: &[SearchHit], question: &str) -> String {
    let context = hits
        .iter()
        .filter_map(SearchHit::text)
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Use the following pieces of context to answer the question at the end. \
         If you don't know the answer, just say that you don't know, don't try \
         to make up an answer.\n\n{}\n\nQuestion: {}\nHelpful Answer:",
        context, question
    )
}

fn snippet_from_hit(hit: &SearchHit, max_chars: usize) -> Option<SourceSnippet> {
    let text = hit.text()?;
    let mut metadata = hit.payload.clone();
    if let Some(map) = metadata.as_object_mut() {
        map.remove(TEXT_PAYLOAD_KEY);
    }
    Some(SourceSnippet {
        content: truncate_chars(text, max_chars),
        metadata,
    })
}

/// Truncate to at most `max_chars` characters, never splitting a char.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

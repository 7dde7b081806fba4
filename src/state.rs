//! Application context: configuration, chat history, and the one-shot
//! component initialization.
//!
//! Everything handlers touch hangs off one `AppState` built at startup.
//! Readiness is a watch channel that transitions `Initializing` to either
//! `Ready` or `Failed` exactly once; `Failed` is terminal for the process
//! lifetime and its message is surfaced verbatim by the health endpoint.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, RwLock};

use crate::capture::{CaptureSource, OcrCapture};
use crate::config::AppConfig;
use crate::core::errors::ApiError;
use crate::history::ChatHistory;
use crate::llm::{LlmProvider, OllamaProvider};
use crate::rag::QueryPipeline;
use crate::store::{KnowledgeStore, QdrantStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Initializing,
    Ready,
    Failed(String),
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }

    pub fn message(&self) -> String {
        match self {
            Readiness::Initializing => "Initializing...".to_string(),
            Readiness::Ready => "All systems ready!".to_string(),
            Readiness::Failed(msg) => format!("Error: {}", msg),
        }
    }
}

/// The initialized pipeline components, published together once the
/// background startup task finishes.
#[derive(Clone)]
pub struct Components {
    pub store: Arc<dyn KnowledgeStore>,
    pub llm: Arc<dyn LlmProvider>,
    pub pipeline: Arc<QueryPipeline>,
    /// Absent when no OCR toolchain was found; capture commands fail with
    /// an upstream error while query keeps working.
    pub capture: Option<Arc<dyn CaptureSource>>,
}

pub struct AppState {
    pub config: AppConfig,
    pub history: ChatHistory,
    pub started_at: DateTime<Utc>,
    readiness_tx: watch::Sender<Readiness>,
    components: RwLock<Option<Components>>,
}

impl AppState {
    /// A state in `Initializing` with no components published yet.
    pub fn new(config: AppConfig) -> Arc<Self> {
        let (readiness_tx, _) = watch::channel(Readiness::Initializing);
        Arc::new(Self {
            config,
            history: ChatHistory::new(),
            started_at: Utc::now(),
            readiness_tx,
            components: RwLock::new(None),
        })
    }

    /// A state that is `Ready` from the start, with caller-supplied
    /// components. Used by tests and by embedders that bring their own
    /// store/model handles.
    pub async fn with_components(config: AppConfig, components: Components) -> Arc<Self> {
        let state = Self::new(config);
        state.publish_ready(components).await;
        state
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness_tx.borrow().clone()
    }

    /// A receiver that observes readiness transitions.
    pub fn watch_readiness(&self) -> watch::Receiver<Readiness> {
        self.readiness_tx.subscribe()
    }

    /// The initialized components, or `NotReady` when initialization has
    /// not completed (or failed).
    pub async fn components(&self) -> Result<Components, ApiError> {
        let readiness = self.readiness();
        match readiness {
            Readiness::Ready => {
                let guard = self.components.read().await;
                guard
                    .clone()
                    .ok_or_else(|| ApiError::Internal("ready without components".to_string()))
            }
            other => Err(ApiError::NotReady(other.message())),
        }
    }

    pub async fn publish_ready(&self, components: Components) {
        {
            let mut guard = self.components.write().await;
            *guard = Some(components);
        }
        // send_replace: the value must land even when nobody subscribed yet,
        // since readiness() reads it directly.
        self.readiness_tx.send_replace(Readiness::Ready);
    }

    pub fn publish_failed(&self, message: String) {
        self.readiness_tx.send_replace(Readiness::Failed(message));
    }

    /// Spawn the one-time background initialization: Ollama provider,
    /// Qdrant store (dimension probe + collection create), query pipeline,
    /// OCR capture. Publishes `Ready` or a terminal `Failed`.
    pub fn spawn_bootstrap(self: &Arc<Self>) {
        let state = Arc::clone(self);
        tokio::spawn(async move {
            match initialize_components(&state.config).await {
                Ok(components) => {
                    state.publish_ready(components).await;
                    tracing::info!("Backend initialization complete");
                }
                Err(err) => {
                    tracing::error!("Initialization failed: {}", err);
                    state.publish_failed(err.to_string());
                }
            }
        });
    }
}

async fn initialize_components(config: &AppConfig) -> Result<Components, ApiError> {
    tracing::info!("Initializing second-brain backend...");

    let llm: Arc<dyn LlmProvider> = Arc::new(OllamaProvider::new(config.ollama.url.clone()));
    if !llm.health_check().await? {
        return Err(ApiError::Upstream(format!(
            "Ollama is not reachable at {}",
            config.ollama.url
        )));
    }

    tracing::info!("Connecting to vector database...");
    let store: Arc<dyn KnowledgeStore> = Arc::new(
        QdrantStore::connect(&config.qdrant, Arc::clone(&llm), &config.ollama.embedding_model)
            .await?,
    );

    let pipeline = Arc::new(QueryPipeline::new(
        Arc::clone(&store),
        Arc::clone(&llm),
        config.ollama.chat_model.clone(),
        config.rag,
    ));

    let capture: Option<Arc<dyn CaptureSource>> = match OcrCapture::detect() {
        Ok(ocr) => Some(Arc::new(ocr)),
        Err(err) => {
            tracing::warn!("Capture disabled: {}", err);
            None
        }
    };

    Ok(Components {
        store,
        llm,
        pipeline,
        capture,
    })
}

//! Second Brain backend.
//!
//! Captures on-screen text via OCR, stores it as embeddings in Qdrant, and
//! answers questions over the captured corpus with retrieval-augmented
//! generation through Ollama. Exposed as a local HTTP API plus an embedded
//! browser chat page.

pub mod capture;
pub mod commands;
pub mod config;
pub mod core;
pub mod history;
pub mod llm;
pub mod logging;
pub mod rag;
pub mod server;
pub mod state;
pub mod store;

pub use config::AppConfig;
pub use state::{AppState, Components, Readiness};

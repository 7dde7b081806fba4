//! Application configuration.
//!
//! Every knob has a working local default (API on 127.0.0.1:5555, Qdrant on
//! localhost:6333, Ollama on localhost:11434). An optional TOML file can
//! override any section; `PORT` overrides the listen port.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "SECOND_BRAIN_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "second-brain.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub qdrant: QdrantConfig,
    pub ollama: OllamaConfig,
    pub rag: RagConfig,
    pub capture: CaptureConfig,
    /// Directory for daily-rolling log files.
    pub log_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QdrantConfig {
    pub url: String,
    pub collection: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub url: String,
    pub chat_model: String,
    pub embedding_model: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Number of nearest neighbors fed into the prompt.
    pub top_k: usize,
    /// Number of retrieved records surfaced as sources.
    pub max_sources: usize,
    /// Source snippets are truncated to this many characters.
    pub snippet_chars: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Extractions with fewer non-whitespace characters than this are
    /// dropped instead of stored.
    pub min_chars: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5555,
        }
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".to_string(),
            collection: "book_knowledge".to_string(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434".to_string(),
            chat_model: "llama3.1:8b".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
        }
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_sources: 2,
            snippet_chars: 150,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { min_chars: 10 }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            qdrant: QdrantConfig::default(),
            ollama: OllamaConfig::default(),
            rag: RagConfig::default(),
            capture: CaptureConfig::default(),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl AppConfig {
    /// Load configuration: `SECOND_BRAIN_CONFIG` path if set, else
    /// `second-brain.toml` in the working directory if present, else
    /// defaults. A `PORT` env var overrides the listen port either way.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        if let Some(port) = env::var("PORT").ok().and_then(|val| val.parse::<u16>().ok()) {
            config.server.port = port;
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

//! Retrieval-augmented generation over the captured corpus.

mod pipeline;

pub use pipeline::{QueryAnswer, QueryPipeline, SourceSnippet};

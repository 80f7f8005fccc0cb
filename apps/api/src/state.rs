use std::sync::Arc;

use crate::config::Config;
use crate::extraction::DocumentExtractor;
use crate::llm_client::TextGenerator;
use crate::storage::UploadStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// Built once in `main`; every field is immutable for the life of the process.
#[derive(Clone)]
pub struct AppState {
    /// Generative model. Default: `GeminiClient`.
    pub generator: Arc<dyn TextGenerator>,
    /// Resume text extractor. Default: `ResumeTextExtractor`.
    pub extractor: Arc<dyn DocumentExtractor>,
    pub uploads: UploadStore,
    pub config: Config,
}

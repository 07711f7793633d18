use std::sync::Arc;

use crate::analysis::assessor::Assessor;
use crate::config::Config;
use crate::pdf::PdfTextExtractor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// PDF → text. Default: `PdfExtractor` (pdf-extract).
    pub extractor: Arc<dyn PdfTextExtractor>,
    /// Pluggable assessor. Chosen at startup via ASSESSOR_BACKEND.
    pub assessor: Arc<dyn Assessor>,
}

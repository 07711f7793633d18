//! Analysis pipeline — the single request flow behind `analyze`.
//!
//! Flow: decode base64 ×2 → extract text ×2 → reject empty text →
//!       assess → stamp metadata.
//!
//! Every failure is logged once where it is detected, then returned as a
//! classified `AppError`. Nothing is retried.

use base64::{
    alphabet,
    engine::{general_purpose::GeneralPurpose, DecodePaddingMode, GeneralPurposeConfig},
    Engine,
};
use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};

use crate::analysis::assessor::Assessor;
use crate::analysis::models::{AnalysisInput, AnalysisMetadata, AnalysisOutput};
use crate::errors::AppError;
use crate::pdf::PdfTextExtractor;

/// Standard alphabet, padding optional.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const DATA_URL_PREFIX: &str = "data:application/pdf;base64,";

/// Which uploaded document a failure relates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Document {
    JobDescription,
    Cv,
}

impl Document {
    pub fn label(self) -> &'static str {
        match self {
            Document::JobDescription => "job description",
            Document::Cv => "CV",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Document::JobDescription => "Job description",
            Document::Cv => "CV",
        }
    }
}

/// Runs the full analysis for one request.
pub async fn perform_analysis(
    input: AnalysisInput,
    extractor: &dyn PdfTextExtractor,
    assessor: &dyn Assessor,
) -> Result<AnalysisOutput, AppError> {
    let job_bytes = decode_pdf(&input.job_description_pdf, Document::JobDescription)?;
    let cv_bytes = decode_pdf(&input.cv_pdf, Document::Cv)?;

    let job_text = extract(extractor, job_bytes, Document::JobDescription).await?;
    let cv_text = extract(extractor, cv_bytes, Document::Cv).await?;

    ensure_text(&job_text, Document::JobDescription)?;
    ensure_text(&cv_text, Document::Cv)?;

    let analysis = assessor.assess(&job_text, &cv_text).await?;

    info!(
        backend = assessor.backend_name(),
        alignment_score = analysis.alignment_score,
        "Analysis complete"
    );

    Ok(AnalysisOutput {
        analysis,
        metadata: AnalysisMetadata {
            processed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            job_description_length: job_text.chars().count(),
            cv_length: cv_text.chars().count(),
        },
    })
}

/// Decodes one base64 PDF field. Tolerates line-wrapped input, a
/// `data:application/pdf;base64,` prefix and missing padding.
pub fn decode_pdf(encoded: &str, document: Document) -> Result<Vec<u8>, AppError> {
    let trimmed = encoded.trim();
    let trimmed = trimmed.strip_prefix(DATA_URL_PREFIX).unwrap_or(trimmed);
    let compact: String = trimmed.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    if compact.is_empty() {
        warn!("{} PDF is empty", document.title());
        return Err(AppError::BadInput(format!(
            "{} PDF is empty",
            document.title()
        )));
    }

    let bytes = LENIENT_BASE64.decode(compact.as_bytes()).map_err(|e| {
        warn!("{} PDF is not valid base64: {e}", document.title());
        AppError::BadInput(format!(
            "{} PDF is not valid base64: {e}",
            document.title()
        ))
    })?;

    if bytes.is_empty() {
        warn!("{} PDF decoded to zero bytes", document.title());
        return Err(AppError::BadInput(format!(
            "{} PDF is empty",
            document.title()
        )));
    }

    Ok(bytes)
}

async fn extract(
    extractor: &dyn PdfTextExtractor,
    bytes: Vec<u8>,
    document: Document,
) -> Result<String, AppError> {
    extractor.extract_text(bytes).await.map_err(|e| {
        warn!("Failed to extract text from {} PDF: {e}", document.label());
        AppError::BadInput(format!(
            "Could not extract text from {} PDF",
            document.label()
        ))
    })
}

fn ensure_text(text: &str, document: Document) -> Result<(), AppError> {
    if text.trim().is_empty() {
        warn!("{} PDF contains no extractable text", document.title());
        return Err(AppError::BadInput(format!(
            "{} PDF contains no extractable text",
            document.title()
        )));
    }
    Ok(())
}

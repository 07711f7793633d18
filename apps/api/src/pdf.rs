//! PDF text extraction. A thin async wrapper over `pdf-extract`.

use async_trait::async_trait;
use thiserror::Error;

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("document is not a PDF (missing %PDF- header)")]
    NotAPdf,

    #[error("PDF parser rejected the document: {0}")]
    Parse(String),

    #[error("PDF parser crashed while reading the document")]
    Crashed,
}

/// Converts raw PDF bytes to plain text. Implement this to swap the parser
/// (or stub it in tests) without touching the analysis pipeline.
#[async_trait]
pub trait PdfTextExtractor: Send + Sync {
    async fn extract_text(&self, bytes: Vec<u8>) -> Result<String, ExtractError>;
}

/// Production extractor backed by `pdf_extract::extract_text_from_mem`.
/// Parsing is CPU-bound, so it runs on the blocking pool.
pub struct PdfExtractor;

#[async_trait]
impl PdfTextExtractor for PdfExtractor {
    async fn extract_text(&self, bytes: Vec<u8>) -> Result<String, ExtractError> {
        if !is_pdf(&bytes) {
            return Err(ExtractError::NotAPdf);
        }

        // pdf-extract panics on some malformed inputs; a panicked task surfaces as a JoinError.
        tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
        })
        .await
        .map_err(|_| ExtractError::Crashed)?
        .map_err(ExtractError::Parse)
    }
}

/// True if the bytes start with the PDF magic, ignoring leading whitespace.
pub fn is_pdf(bytes: &[u8]) -> bool {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    bytes[start..].starts_with(PDF_MAGIC)
}

/// Builds a one-page PDF showing `text` in Helvetica, with a correct xref table.
#[cfg(test)]
pub(crate) fn single_page_pdf(text: &str) -> Vec<u8> {
    let content = format!("BT /F1 24 Tf 72 720 Td ({text}) Tj ET");
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }

    let xref_at = pdf.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        xref.push_str(&format!("{offset:010} 00000 n \n"));
    }
    xref.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
        objects.len() + 1
    ));
    pdf.extend_from_slice(xref.as_bytes());
    pdf
}

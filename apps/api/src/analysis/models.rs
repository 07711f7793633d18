use serde::{Deserialize, Serialize};

/// Body of the `analyze` procedure. Both fields are base64-encoded PDFs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisInput {
    pub job_description_pdf: String,
    pub cv_pdf: String,
}

/// Structured suitability assessment of one CV against one job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub candidate_strengths: Vec<String>,
    pub candidate_weaknesses: Vec<String>,
    /// Always within 0 – 100.
    pub alignment_score: u8,
    pub key_matches: Vec<String>,
    pub recommendations: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    /// ISO-8601 UTC, millisecond precision.
    pub processed_at: String,
    /// Characters (Unicode scalar values) in the extracted, untrimmed job
    /// description text. An emoji such as 🦀 counts as 1, not as the 2 UTF-16
    /// code units a JavaScript `.length` would report.
    pub job_description_length: usize,
    /// Characters in the extracted, untrimmed CV text, counted the same way.
    pub cv_length: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutput {
    pub analysis: AnalysisResult,
    pub metadata: AnalysisMetadata,
}

/// The assessment exactly as the model returned it, before clamping.
///
/// Strengths, weaknesses and summary are mandatory; a payload missing any of them
/// fails deserialization. The other fields tolerate omission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAssessment {
    pub candidate_strengths: Vec<String>,
    pub candidate_weaknesses: Vec<String>,
    #[serde(default)]
    pub alignment_score: f64,
    #[serde(default)]
    pub key_matches: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub summary: String,
}

impl From<RawAssessment> for AnalysisResult {
    fn from(raw: RawAssessment) -> Self {
        AnalysisResult {
            candidate_strengths: raw.candidate_strengths,
            candidate_weaknesses: raw.candidate_weaknesses,
            alignment_score: clamp_score(raw.alignment_score),
            key_matches: raw.key_matches,
            recommendations: raw.recommendations,
            summary: raw.summary,
        }
    }
}

/// Rounds and clamps a raw score into 0 – 100. Non-finite values become 0.
pub fn clamp_score(raw: f64) -> u8 {
    if !raw.is_finite() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

// CV / job-description suitability analysis.
// Implements: input decoding, PDF text extraction, assessment, output assembly.
// All Gemini calls go through llm_client; no direct HTTP calls here.

pub mod assessor;
pub mod handlers;
pub mod keywords;
pub mod models;
pub mod pipeline;
pub mod prompts;

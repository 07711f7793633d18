// Analysis LLM prompt templates.
// The prompt is assembled from fixed segments so document text is never
// re-scanned for placeholders.

const ANALYSIS_PROMPT_INTRO: &str = "\
You are an expert HR analyst. Analyze the following job description and CV/resume, \
then provide a comprehensive evaluation.

JOB DESCRIPTION:
";

const ANALYSIS_PROMPT_CV: &str = "

CANDIDATE CV/RESUME:
";

const ANALYSIS_PROMPT_INSTRUCTIONS: &str = r#"

Please analyze and provide a response in the following JSON format:
{
  "candidateStrengths": ["strength1", "strength2", ...],
  "candidateWeaknesses": ["weakness1", "weakness2", ...],
  "alignmentScore": 85,
  "keyMatches": ["match1", "match2", ...],
  "recommendations": ["recommendation1", "recommendation2", ...],
  "summary": "Overall assessment summary"
}

Focus on:
1. Technical skills alignment
2. Experience relevance
3. Educational background fit
4. Cultural/role alignment indicators
5. Growth potential

Provide specific, actionable insights. The alignment score should be 0-100 based on how well the candidate matches the job requirements.

IMPORTANT: Respond ONLY with valid JSON. No markdown formatting, no explanations, just the JSON object."#;

/// Builds the assessment prompt. Output depends only on the two texts.
pub fn build_analysis_prompt(job_description: &str, cv: &str) -> String {
    let mut prompt = String::with_capacity(
        ANALYSIS_PROMPT_INTRO.len()
            + job_description.len()
            + ANALYSIS_PROMPT_CV.len()
            + cv.len()
            + ANALYSIS_PROMPT_INSTRUCTIONS.len(),
    );
    prompt.push_str(ANALYSIS_PROMPT_INTRO);
    prompt.push_str(job_description);
    prompt.push_str(ANALYSIS_PROMPT_CV);
    prompt.push_str(cv);
    prompt.push_str(ANALYSIS_PROMPT_INSTRUCTIONS);
    prompt
}

//! Keyword heuristic — a deterministic, offline stand-in for the LLM assessment.
//!
//! Algorithm:
//! 1. Lowercase both texts and collect which entries of `SKILL_VOCABULARY` occur
//!    as substrings in each.
//! 2. A job skill matches if any CV skill contains it or is contained by it.
//! 3. alignment = round(clamp(matched / job_skills × 100, 15, 95)).
//!
//! The result never claims certainty: score stays within 15 – 95.

use crate::analysis::models::AnalysisResult;

const SKILL_VOCABULARY: &[&str] = &[
    "javascript", "python", "java", "react", "node", "sql", "aws", "docker",
    "kubernetes", "git", "api", "database", "frontend", "backend", "fullstack",
    "agile", "scrum", "testing", "ci/cd", "devops", "cloud", "microservices",
    "typescript", "angular", "vue", "mongodb", "postgresql", "redis", "nginx",
];

const MIN_SCORE: f64 = 15.0;
const MAX_SCORE: f64 = 95.0;
const MAX_KEY_MATCHES: usize = 5;

/// Vocabulary skills present in `text`, in vocabulary order.
pub fn extract_skills(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    SKILL_VOCABULARY
        .iter()
        .copied()
        .filter(|skill| lower.contains(skill))
        .collect()
}

/// Scores a CV against a job description by skill-vocabulary overlap.
pub fn keyword_assessment(job_description: &str, cv: &str) -> AnalysisResult {
    let job_skills = extract_skills(job_description);
    let cv_skills = extract_skills(cv);

    let matches: Vec<&str> = job_skills
        .iter()
        .copied()
        .filter(|job_skill| {
            cv_skills
                .iter()
                .any(|cv_skill| cv_skill.contains(job_skill) || job_skill.contains(cv_skill))
        })
        .collect();

    let ratio = if job_skills.is_empty() {
        0.0
    } else {
        matches.len() as f64 / job_skills.len() as f64 * 100.0
    };
    let alignment_score = ratio.clamp(MIN_SCORE, MAX_SCORE).round() as u8;

    AnalysisResult {
        candidate_strengths: to_strings(&[
            "Relevant technical skills identified",
            "Professional experience documented",
            "Educational background present",
            "Career progression shown",
        ]),
        candidate_weaknesses: to_strings(&[
            "Some skill gaps may exist",
            "Specific domain experience needs verification",
            "Certification status unclear",
        ]),
        alignment_score,
        key_matches: matches
            .iter()
            .take(MAX_KEY_MATCHES)
            .map(|s| s.to_string())
            .collect(),
        recommendations: to_strings(&[
            "Interview to assess technical depth",
            "Verify specific technology experience",
            "Evaluate cultural fit",
            "Discuss career goals and motivation",
        ]),
        summary: build_summary(alignment_score, matches.len()),
    }
}

fn build_summary(score: u8, match_count: usize) -> String {
    let (band, next_step) = if score > 70 {
        ("strong", "interview")
    } else if score > 50 {
        ("moderate", "further evaluation")
    } else {
        ("limited", "consideration with reservations")
    };

    format!(
        "The candidate shows {band} alignment with the job requirements. \
         {match_count} key skills/requirements match. Recommended for {next_step}."
    )
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

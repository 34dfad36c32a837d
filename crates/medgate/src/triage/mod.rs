//! Message severity triage
//!
//! Maps free-form user text onto a severity tier via ordered keyword
//! tables. First tier with any matching keyword wins; matching is
//! case-insensitive substring containment, not word-boundary aware, so
//! "can't breathe" matches as a literal substring. A pure decision table,
//! not a learned model.

pub mod prompts;

pub use prompts::{
    EMERGENCY_RESPONSE, MEDICAL_DISCLAIMER, MedicalPrompt, prompt_by_id, select_prompt,
    system_prompt,
};

use serde::{Deserialize, Serialize};

/// Severity tier for a user message, ordered from least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Keywords indicating an emergency requiring immediate attention
const CRITICAL_KEYWORDS: &[&str] = &[
    "chest pain",
    "heart attack",
    "stroke",
    "can't breathe",
    "severe bleeding",
    "unconscious",
    "seizure",
    "overdose",
    "suicidal",
    "kill myself",
];

/// Keywords indicating symptoms that warrant urgent care
const HIGH_KEYWORDS: &[&str] = &[
    "severe pain",
    "high fever",
    "vomiting blood",
    "difficulty breathing",
    "confusion",
    "severe headache",
    "allergic reaction",
    "depression",
];

/// Keywords indicating symptoms worth a closer look
const MEDIUM_KEYWORDS: &[&str] = &[
    "pain",
    "fever",
    "vomiting",
    "diarrhea",
    "rash",
    "swelling",
    "medication",
    "side effect",
    "anxiety",
    "stress",
];

/// Tier tables in priority order; the first tier with a match wins
const SEVERITY_TABLE: &[(Severity, &[&str])] = &[
    (Severity::Critical, CRITICAL_KEYWORDS),
    (Severity::High, HIGH_KEYWORDS),
    (Severity::Medium, MEDIUM_KEYWORDS),
];

/// Classify a user message into a severity tier.
///
/// Deterministic and total: any input produces a tier, defaulting to
/// [`Severity::Low`] when no keyword matches.
pub fn detect_severity(message: &str) -> Severity {
    let lowered = message.to_lowercase();
    for (severity, keywords) in SEVERITY_TABLE {
        if keywords.iter().any(|keyword| lowered.contains(keyword)) {
            return *severity;
        }
    }
    Severity::Low
}

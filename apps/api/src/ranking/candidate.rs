//! Candidate name resolution. Non-critical: every failure degrades to `Unknown`.

use std::fmt;

use tracing::{info, warn};

use crate::llm_client::prompts::EXTRACTION_TEMPERATURE;
use crate::llm_client::{ChatModel, CompletionRequest};
use crate::ranking::excerpt;
use crate::ranking::prompts::{NAME_EXCERPT_CHARS, NAME_MAX_TOKENS, NAME_PROMPT_TEMPLATE, NAME_SYSTEM};

/// Best-effort candidate name. Never empty when displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateName {
    Extracted(String),
    Unknown,
}

impl CandidateName {
    pub const UNKNOWN: &'static str = "Unknown Candidate";

    pub fn as_str(&self) -> &str {
        match self {
            CandidateName::Extracted(name) => name,
            CandidateName::Unknown => Self::UNKNOWN,
        }
    }

    /// Cleans a raw model reply into a name.
    ///
    /// Any mention of "unknown" anywhere in the reply maps to the sentinel, as does
    /// a reply that is empty after trimming. Otherwise the first non-blank line is used.
    fn from_reply(reply: &str) -> Self {
        if reply.to_lowercase().contains("unknown") {
            return CandidateName::Unknown;
        }

        let line = reply
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or_default();

        let name = line.trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c.is_whitespace());
        if name.is_empty() {
            CandidateName::Unknown
        } else {
            CandidateName::Extracted(name.to_string())
        }
    }
}

impl fmt::Display for CandidateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Asks the model for the candidate's name using the head of the resume.
pub async fn extract_candidate_name(resume_text: &str, model: &dyn ChatModel) -> CandidateName {
    info!("Extracting candidate name from resume");
    let prompt =
        NAME_PROMPT_TEMPLATE.replace("{resume_text}", excerpt(resume_text, NAME_EXCERPT_CHARS));
    let request = CompletionRequest {
        system: NAME_SYSTEM,
        prompt: &prompt,
        temperature: EXTRACTION_TEMPERATURE,
        max_tokens: NAME_MAX_TOKENS,
    };

    match model.complete(&request).await {
        Ok(reply) => {
            let name = CandidateName::from_reply(&reply);
            info!("Extracted name: {name}");
            name
        }
        Err(e) => {
            warn!("Name extraction failed, using sentinel: {e}");
            CandidateName::Unknown
        }
    }
}

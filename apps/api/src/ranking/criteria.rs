//! Criteria — extraction of ranking criteria from a job description, and the
//! ordered criteria list used for scoring and export.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::llm_client::prompts::EXTRACTION_TEMPERATURE;
use crate::llm_client::{ChatModel, CompletionRequest, LlmError};
use crate::ranking::prompts::{CRITERIA_MAX_TOKENS, CRITERIA_PROMPT_TEMPLATE, CRITERIA_SYSTEM};

/// Criteria extraction has no meaningful default, so every failure surfaces.
#[derive(Debug, Error)]
pub enum CriteriaError {
    #[error("provider error: {0}")]
    Provider(#[from] LlmError),

    #[error("criteria list not found in model output")]
    NotFound,

    #[error("criteria list is not a JSON array of strings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Ordered, de-duplicated list of criteria. Position drives CSV column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria(Vec<String>);

impl Criteria {
    /// Trims entries, drops blanks and keeps only the first occurrence of each criterion.
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut criteria: Vec<String> = Vec::new();
        for item in items {
            let item = item.as_ref().trim();
            if !item.is_empty() && !criteria.iter().any(|c| c == item) {
                criteria.push(item.to_string());
            }
        }
        Criteria(criteria)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }
}

/// Parses the `criteria` form field: a JSON array, or a comma-separated list.
///
/// Valid JSON that is not an array also falls back to comma splitting.
/// Non-string array items are kept in their JSON text form.
pub fn parse_criteria_field(raw: &str) -> Criteria {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => Criteria::new(items.iter().map(|item| match item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })),
        _ => Criteria::new(raw.split(',')),
    }
}

/// Asks the model for the ranking criteria of a job description.
///
/// The reply may wrap the array in prose; the span from the first `[` to the
/// last `]` is parsed. Order is preserved exactly as the model returned it.
pub async fn extract_criteria(
    jd_text: &str,
    model: &dyn ChatModel,
) -> Result<Vec<String>, CriteriaError> {
    info!("Extracting criteria from job description");
    let prompt = CRITERIA_PROMPT_TEMPLATE.replace("{jd_text}", jd_text);
    let request = CompletionRequest {
        system: CRITERIA_SYSTEM,
        prompt: &prompt,
        temperature: EXTRACTION_TEMPERATURE,
        max_tokens: CRITERIA_MAX_TOKENS,
    };

    let reply = model.complete(&request).await?;
    debug!("Raw LLM response for criteria: {reply}");

    let criteria = parse_criteria_reply(&reply).map_err(|e| {
        error!("Failed to extract criteria list from response: {e}");
        e
    })?;
    info!("Successfully extracted {} criteria", criteria.len());
    Ok(criteria)
}

fn parse_criteria_reply(reply: &str) -> Result<Vec<String>, CriteriaError> {
    let span = bracketed_span(reply).ok_or(CriteriaError::NotFound)?;
    Ok(serde_json::from_str::<Vec<String>>(span)?)
}

/// First `[` through last `]`, inclusive.
fn bracketed_span(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedModel;

    const JD: &str = "Senior ML Engineer. Required: 5+ years Python, PyTorch, AWS certification.";

    #[test]
    fn test_criteria_new_trims_and_dedups() {
        let criteria = Criteria::new([" Python ", "ML", "", "Python", "  "]);
        assert_eq!(criteria.iter().collect::<Vec<_>>(), vec!["Python", "ML"]);
        assert_eq!(criteria.first(), Some("Python"));
    }

    #[test]
    fn test_parse_criteria_field_json_array() {
        let criteria = parse_criteria_field(r#"["5+ years Python", "ML, NLP", 3]"#);
        assert_eq!(
            criteria.iter().collect::<Vec<_>>(),
            vec!["5+ years Python", "ML, NLP", "3"]
        );
    }

    #[test]
    fn test_parse_criteria_field_comma_fallback() {
        let criteria = parse_criteria_field("Python, Machine Learning ,,SQL");
        assert_eq!(
            criteria.iter().collect::<Vec<_>>(),
            vec!["Python", "Machine Learning", "SQL"]
        );
    }

    #[test]
    fn test_parse_criteria_field_non_array_json_falls_back() {
        let criteria = parse_criteria_field(r#""Python""#);
        assert_eq!(criteria.iter().collect::<Vec<_>>(), vec![r#""Python""#]);
    }

    #[test]
    fn test_parse_criteria_field_blank_is_empty() {
        assert!(parse_criteria_field("  ").is_empty());
        assert!(parse_criteria_field("[]").is_empty());
    }

    #[test]
    fn test_reply_with_prose_around_array() {
        let reply = "Sure! Here are the criteria:\n[\n  \"5+ years Python\",\n  \"PyTorch\"\n]\nGood luck.";
        let criteria = parse_criteria_reply(reply).unwrap();
        assert_eq!(criteria, vec!["5+ years Python", "PyTorch"]);
    }

    #[test]
    fn test_reply_order_is_preserved() {
        let reply = r#"["c", "a", "b", "a"]"#;
        assert_eq!(parse_criteria_reply(reply).unwrap(), vec!["c", "a", "b", "a"]);
    }

    #[test]
    fn test_reply_without_array_is_not_found() {
        let err = parse_criteria_reply("I could not find any criteria.").unwrap_err();
        assert!(matches!(err, CriteriaError::NotFound));
        assert_eq!(err.to_string(), "criteria list not found in model output");
    }

    #[test]
    fn test_reply_with_reversed_brackets_is_not_found() {
        assert!(matches!(
            parse_criteria_reply("] nothing ["),
            Err(CriteriaError::NotFound)
        ));
    }

    #[test]
    fn test_reply_with_broken_json_is_parse_error() {
        let err = parse_criteria_reply(r#"["Python", "ML",]"#).unwrap_err();
        assert!(matches!(err, CriteriaError::Parse(_)));
    }

    #[tokio::test]
    async fn test_extract_criteria_sends_job_description() {
        let model = ScriptedModel::new(|request| {
            assert_eq!(request.system, CRITERIA_SYSTEM);
            assert!(request.prompt.contains(JD));
            assert_eq!(request.max_tokens, CRITERIA_MAX_TOKENS);
            Ok(r#"["5+ years Python", "PyTorch", "AWS certification"]"#.to_string())
        });

        let criteria = extract_criteria(JD, &model).await.unwrap();
        assert_eq!(criteria, vec!["5+ years Python", "PyTorch", "AWS certification"]);
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_extract_criteria_surfaces_provider_error() {
        let model = ScriptedModel::failing();
        let err = extract_criteria(JD, &model).await.unwrap_err();
        assert!(matches!(err, CriteriaError::Provider(_)));
        assert_eq!(model.calls(), 1, "no retries");
    }

    #[tokio::test]
    async fn test_extract_criteria_never_returns_empty_on_missing_list() {
        let model = ScriptedModel::replying("No criteria here.");
        assert!(matches!(
            extract_criteria(JD, &model).await,
            Err(CriteriaError::NotFound)
        ));
    }
}

//! Resume scoring — asks the model for per-criterion scores and normalizes the
//! reply into a `ScoreRecord`.
//!
//! Criteria are sent under positional tags (`criterion1`, `criterion2`, …) and the
//! reply's keys are resolved back through `CriterionTags`. The model's own total is
//! never trusted: `total_score` is always the sum of the normalized scores.
//!
//! Scoring never fails. Provider errors and unusable replies yield a zeroed record
//! wrapped in `ScoreOutcome::Degraded`.

use std::collections::HashMap;
use std::fmt::Write as _;

use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::llm_client::prompts::{EXTRACTION_TEMPERATURE, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{strip_code_fence, ChatModel, CompletionRequest};
use crate::ranking::criteria::Criteria;
use crate::ranking::{excerpt, fill_template};
use crate::ranking::prompts::{
    SCORING_EXCERPT_CHARS, SCORING_MAX_TOKENS, SCORING_PROMPT_TEMPLATE, SCORING_SYSTEM,
};

pub const MAX_SCORE: u8 = 5;

// ────────────────────────────────────────────────────────────────────────────
// Data model
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriterionScore {
    pub criterion: String,
    pub score: u8, // 0 – 5
}

/// Canonical per-candidate result: one score per requested criterion, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    pub candidate_name: String,
    pub scores: Vec<CriterionScore>,
    pub total_score: u32,
}

impl ScoreRecord {
    pub fn new(candidate_name: impl Into<String>, scores: Vec<CriterionScore>) -> Self {
        let mut record = Self {
            candidate_name: candidate_name.into(),
            scores,
            total_score: 0,
        };
        record.recompute_total();
        record
    }

    /// Every criterion scored 0.
    pub fn zeroed(candidate_name: impl Into<String>, criteria: &Criteria) -> Self {
        let scores = criteria
            .iter()
            .map(|criterion| CriterionScore {
                criterion: criterion.to_string(),
                score: 0,
            })
            .collect();
        Self::new(candidate_name, scores)
    }

    pub fn score(&self, criterion: &str) -> Option<u8> {
        self.scores
            .iter()
            .find(|s| s.criterion == criterion)
            .map(|s| s.score)
    }

    pub fn is_all_zero(&self) -> bool {
        self.scores.iter().all(|s| s.score == 0)
    }

    /// Overrides one criterion's score and keeps the total consistent.
    pub fn set_score(&mut self, criterion: &str, score: u8) {
        if let Some(entry) = self.scores.iter_mut().find(|s| s.criterion == criterion) {
            entry.score = score.min(MAX_SCORE);
        }
        self.recompute_total();
    }

    fn recompute_total(&mut self) {
        self.total_score = self.scores.iter().map(|s| u32::from(s.score)).sum();
    }
}

/// Result kind of the scoring client. Both variants carry a complete record.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreOutcome {
    Scored(ScoreRecord),
    Degraded { record: ScoreRecord, reason: String },
}

// ────────────────────────────────────────────────────────────────────────────
// Positional tags
// ────────────────────────────────────────────────────────────────────────────

/// Bidirectional map between positional tags and criteria.
pub struct CriterionTags<'a> {
    ordered: Vec<(String, &'a str)>,
    by_tag: HashMap<String, &'a str>,
    by_criterion: HashMap<&'a str, String>,
}

impl<'a> CriterionTags<'a> {
    pub fn new(criteria: &'a Criteria) -> Self {
        let ordered: Vec<(String, &'a str)> = criteria
            .iter()
            .enumerate()
            .map(|(i, criterion)| (format!("criterion{}", i + 1), criterion))
            .collect();
        let by_tag = ordered
            .iter()
            .map(|(tag, criterion)| (tag.clone(), *criterion))
            .collect();
        let by_criterion = ordered
            .iter()
            .map(|(tag, criterion)| (*criterion, tag.clone()))
            .collect();
        Self {
            ordered,
            by_tag,
            by_criterion,
        }
    }

    pub fn tag_for(&self, criterion: &str) -> Option<&str> {
        self.by_criterion.get(criterion).map(String::as_str)
    }

    /// Resolves a key from the model's reply back to a criterion.
    ///
    /// Tags match regardless of case, whitespace, `_` or `-` ("Criterion 1",
    /// "criterion_1"). A key equal to a criterion's own text also resolves.
    pub fn criterion_for(&self, key: &str) -> Option<&'a str> {
        let canonical: String = key
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        self.by_tag.get(&canonical).copied().or_else(|| {
            self.by_criterion
                .get_key_value(key.trim())
                .map(|(criterion, _)| *criterion)
        })
    }

    /// Pretty JSON object of tag → criterion, in criteria order.
    pub fn prompt_listing(&self) -> String {
        let mut out = String::from("{\n");
        for (i, (tag, criterion)) in self.ordered.iter().enumerate() {
            let quoted = Value::String((*criterion).to_string());
            let separator = if i + 1 < self.ordered.len() { "," } else { "" };
            let _ = writeln!(out, "  \"{tag}\": {quoted}{separator}");
        }
        out.push('}');
        out
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scoring client
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ScoreParseError {
    #[error("reply is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("reply has no \"scores\" object")]
    MissingScores,
}

/// Scores one resume against the criteria.
pub async fn score_resume(
    resume_text: &str,
    criteria: &Criteria,
    candidate_name: &str,
    model: &dyn ChatModel,
) -> ScoreOutcome {
    info!("Scoring resume for candidate: {candidate_name}");
    let tags = CriterionTags::new(criteria);

    let listing = tags.prompt_listing();
    let prompt = fill_template(
        SCORING_PROMPT_TEMPLATE,
        &[
            ("json_only", JSON_ONLY_INSTRUCTION),
            ("candidate_name", candidate_name),
            ("criteria_json", &listing),
            ("resume_text", excerpt(resume_text, SCORING_EXCERPT_CHARS)),
        ],
    );
    let request = CompletionRequest {
        system: SCORING_SYSTEM,
        prompt: &prompt,
        temperature: EXTRACTION_TEMPERATURE,
        max_tokens: SCORING_MAX_TOKENS,
    };

    let reply = match model.complete(&request).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!("Scoring call failed for {candidate_name}: {e}");
            return ScoreOutcome::Degraded {
                record: ScoreRecord::zeroed(candidate_name, criteria),
                reason: e.to_string(),
            };
        }
    };

    let json_text = strip_code_fence(&reply);
    match normalize_scores(json_text, criteria, &tags) {
        Ok(scores) => {
            info!("Successfully parsed score data for {candidate_name}");
            ScoreOutcome::Scored(ScoreRecord::new(candidate_name, scores))
        }
        Err(e) => {
            error!("Error parsing JSON response for {candidate_name}: {e}");
            error!("Problematic JSON text: {json_text}");
            ScoreOutcome::Degraded {
                record: ScoreRecord::zeroed(candidate_name, criteria),
                reason: e.to_string(),
            }
        }
    }
}

/// Maps the reply's `scores` object onto the requested criteria.
///
/// Unknown keys are ignored and unresolved criteria score 0. An exact tag key
/// takes precedence over a drifted spelling of the same tag.
fn normalize_scores(
    json_text: &str,
    criteria: &Criteria,
    tags: &CriterionTags<'_>,
) -> Result<Vec<CriterionScore>, ScoreParseError> {
    let reply: Value = serde_json::from_str(json_text)?;
    let returned = reply
        .get("scores")
        .and_then(Value::as_object)
        .ok_or(ScoreParseError::MissingScores)?;

    let mut resolved: HashMap<&str, u8> = HashMap::new();
    for (key, value) in returned {
        let Some(criterion) = tags.criterion_for(key) else {
            continue;
        };
        if tags.tag_for(criterion) == Some(key.as_str()) {
            resolved.insert(criterion, coerce_score(value));
        } else {
            resolved.entry(criterion).or_insert_with(|| coerce_score(value));
        }
    }

    Ok(criteria
        .iter()
        .map(|criterion| CriterionScore {
            criterion: criterion.to_string(),
            score: resolved.get(criterion).copied().unwrap_or(0),
        })
        .collect())
}

/// Integers, floats (rounded) and numeric strings are accepted and clamped to 0–5.
/// Anything else counts as 0.
fn coerce_score(value: &Value) -> u8 {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(v) if v.is_finite() => v.round().clamp(0.0, f64::from(MAX_SCORE)) as u8,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedModel;
    use serde_json::json;

    fn criteria() -> Criteria {
        Criteria::new(["5+ years Python", "Machine Learning", "AWS certification"])
    }

    fn scores_of(record: &ScoreRecord) -> Vec<u8> {
        record.scores.iter().map(|s| s.score).collect()
    }

    fn expect_scored(outcome: ScoreOutcome) -> ScoreRecord {
        match outcome {
            ScoreOutcome::Scored(record) => record,
            other => panic!("expected scored outcome, got {other:?}"),
        }
    }

    fn expect_degraded(outcome: ScoreOutcome) -> (ScoreRecord, String) {
        match outcome {
            ScoreOutcome::Degraded { record, reason } => (record, reason),
            other => panic!("expected degraded outcome, got {other:?}"),
        }
    }

    #[test]
    fn test_tags_are_bidirectional() {
        let criteria = criteria();
        let tags = CriterionTags::new(&criteria);
        assert_eq!(tags.tag_for("Machine Learning"), Some("criterion2"));
        assert_eq!(tags.criterion_for("criterion3"), Some("AWS certification"));
        assert_eq!(tags.criterion_for("criterion4"), None);
    }

    #[test]
    fn test_tag_lookup_tolerates_key_drift() {
        let criteria = criteria();
        let tags = CriterionTags::new(&criteria);
        assert_eq!(tags.criterion_for("Criterion 1"), Some("5+ years Python"));
        assert_eq!(tags.criterion_for("criterion_2"), Some("Machine Learning"));
        assert_eq!(tags.criterion_for(" CRITERION-3 "), Some("AWS certification"));
        assert_eq!(tags.criterion_for("Machine Learning"), Some("Machine Learning"));
    }

    #[test]
    fn test_prompt_listing_keeps_order_past_nine() {
        let criteria = Criteria::new((1..=11).map(|i| format!("skill {i}")));
        let listing = CriterionTags::new(&criteria).prompt_listing();
        let second = listing.find("\"criterion2\"").unwrap();
        let tenth = listing.find("\"criterion10\"").unwrap();
        assert!(second < tenth);
        let parsed: Value = serde_json::from_str(&listing).unwrap();
        assert_eq!(parsed["criterion11"], "skill 11");
    }

    #[test]
    fn test_prompt_listing_escapes_criterion_text() {
        let criteria = Criteria::new([r#"Knows "quoted" {json}"#]);
        let listing = CriterionTags::new(&criteria).prompt_listing();
        let parsed: Value = serde_json::from_str(&listing).unwrap();
        assert_eq!(parsed["criterion1"], r#"Knows "quoted" {json}"#);
    }

    #[test]
    fn test_normalize_reordered_missing_and_extra_keys() {
        let criteria = criteria();
        let tags = CriterionTags::new(&criteria);
        let reply = json!({
            "candidate_name": "Jane",
            "scores": {"criterion3": 2, "bonus": 5, "criterion1": 4},
            "total_score": 42
        })
        .to_string();

        let scores = normalize_scores(&reply, &criteria, &tags).unwrap();
        let record = ScoreRecord::new("Jane", scores);
        assert_eq!(scores_of(&record), vec![4, 0, 2]);
        assert_eq!(record.total_score, 6, "model total is discarded");
        assert_eq!(record.scores.len(), criteria.len());
    }

    #[test]
    fn test_normalize_exact_tag_beats_drifted_key() {
        let criteria = Criteria::new(["Python"]);
        let tags = CriterionTags::new(&criteria);
        let reply = r#"{"scores": {"criterion1": 2, "Criterion 1": 5}}"#;
        let scores = normalize_scores(reply, &criteria, &tags).unwrap();
        assert_eq!(scores[0].score, 2);
    }

    #[test]
    fn test_normalize_without_scores_object_fails() {
        let criteria = criteria();
        let tags = CriterionTags::new(&criteria);
        assert!(matches!(
            normalize_scores(r#"{"total_score": 3}"#, &criteria, &tags),
            Err(ScoreParseError::MissingScores)
        ));
        assert!(matches!(
            normalize_scores("not json", &criteria, &tags),
            Err(ScoreParseError::Json(_))
        ));
    }

    #[test]
    fn test_coerce_score_variants() {
        assert_eq!(coerce_score(&json!(4)), 4);
        assert_eq!(coerce_score(&json!(3.6)), 4);
        assert_eq!(coerce_score(&json!(" 2 ")), 2);
        assert_eq!(coerce_score(&json!(9)), 5);
        assert_eq!(coerce_score(&json!(-1)), 0);
        assert_eq!(coerce_score(&json!("high")), 0);
        assert_eq!(coerce_score(&json!(null)), 0);
    }

    #[test]
    fn test_set_score_keeps_total_consistent() {
        let mut record = ScoreRecord::zeroed("Jane", &criteria());
        record.set_score("Machine Learning", 3);
        assert_eq!(record.total_score, 3);
        assert_eq!(record.score("Machine Learning"), Some(3));
        assert!(!record.is_all_zero());
    }

    #[tokio::test]
    async fn test_score_resume_strips_fence_and_normalizes() {
        let model = ScriptedModel::new(|request| {
            assert_eq!(request.system, SCORING_SYSTEM);
            assert!(request.prompt.contains("\"criterion2\": \"Machine Learning\""));
            assert!(request.prompt.contains("For the candidate named \"Jane Doe\""));
            Ok("```json\n{\"candidate_name\": \"Jane Doe\", \"scores\": {\"criterion1\": 5, \"criterion2\": 3, \"criterion3\": 1}, \"total_score\": 100}\n```".to_string())
        });

        let outcome = score_resume("Jane Doe\nPython for 8 years", &criteria(), "Jane Doe", &model).await;
        let record = expect_scored(outcome);
        assert_eq!(record.candidate_name, "Jane Doe");
        assert_eq!(scores_of(&record), vec![5, 3, 1]);
        assert_eq!(record.total_score, 9);
    }

    #[tokio::test]
    async fn test_score_resume_provider_failure_degrades_to_zero() {
        let model = ScriptedModel::failing();
        let outcome = score_resume("text", &criteria(), "Jane Doe", &model).await;
        let (record, reason) = expect_degraded(outcome);
        assert_eq!(record.total_score, 0);
        assert_eq!(record.scores.len(), 3);
        assert!(record.is_all_zero());
        assert!(reason.contains("503"), "{reason}");
    }

    #[tokio::test]
    async fn test_score_resume_unparsable_reply_degrades_to_zero() {
        let model = ScriptedModel::replying("The candidate looks great, 5/5 overall!");
        let outcome = score_resume("text", &criteria(), "Jane Doe", &model).await;
        let (record, reason) = expect_degraded(outcome);
        assert!(record.is_all_zero());
        assert!(reason.contains("JSON"), "{reason}");
    }

    #[tokio::test]
    async fn test_markers_in_names_and_criteria_stay_literal() {
        let criteria = Criteria::new(["Writes {resume_text} templates"]);
        let model = ScriptedModel::new(|request| {
            assert_eq!(request.prompt.matches("SECRET-RESUME-BODY").count(), 1);
            assert!(request.prompt.contains("Writes {resume_text} templates"));
            assert!(request.prompt.contains("named \"Ann {criteria_json}\""));
            Ok(r#"{"scores": {"criterion1": 4}}"#.to_string())
        });

        let outcome =
            score_resume("SECRET-RESUME-BODY", &criteria, "Ann {criteria_json}", &model).await;
        assert_eq!(scores_of(&expect_scored(outcome)), vec![4]);
    }

    #[tokio::test]
    async fn test_score_resume_sends_bounded_excerpt() {
        let resume = "y".repeat(10_000);
        let model = ScriptedModel::new(|request| {
            let ys = request.prompt.chars().filter(|c| *c == 'y').count();
            // "you"/"years" etc. in the template contribute a handful of extra 'y's.
            assert!(ys < SCORING_EXCERPT_CHARS + 50, "sent {ys} 'y' characters");
            assert!(ys >= SCORING_EXCERPT_CHARS);
            Ok(r#"{"scores": {}}"#.to_string())
        });
        let outcome = score_resume(&resume, &criteria(), "Jane", &model).await;
        expect_scored(outcome);
    }
}

//! Per-resume orchestration: Extract → NameResolve → Score → PostProcess.
//!
//! `process_resume` always yields a record. A resume that cannot be read becomes an
//! "Error Processing {filename}" row with zero scores; the rest of the batch is unaffected.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::documents::extract_upload;
use crate::llm_client::ChatModel;
use crate::ranking::candidate::extract_candidate_name;
use crate::ranking::criteria::Criteria;
use crate::ranking::scoring::{score_resume, ScoreOutcome, ScoreRecord};

/// Score forced onto the first criterion by `AllZeroPolicy::Legacy`.
pub const LEGACY_FALLBACK_SCORE: u8 = 3;

/// What to do when every criterion comes back 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AllZeroPolicy {
    /// Force the first criterion to 3 so the row does not look like a failure.
    #[default]
    Legacy,
    /// Keep the zeros and mark the record `ScoreStatus::Unscored`.
    Unscored,
}

impl FromStr for AllZeroPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "legacy" => Ok(AllZeroPolicy::Legacy),
            "unscored" => Ok(AllZeroPolicy::Unscored),
            other => Err(format!("expected 'legacy' or 'unscored', got '{other}'")),
        }
    }
}

/// How a record came to be. Kept alongside the record so an all-zero row can be
/// told apart from a provider failure or an unreadable upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreStatus {
    Scored,
    /// The model answered but scored every criterion 0.
    Unscored,
    /// The scoring call failed or its reply was unusable.
    Degraded,
    /// The upload could not be read.
    Failed,
}

impl fmt::Display for ScoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScoreStatus::Scored => "scored",
            ScoreStatus::Unscored => "unscored",
            ScoreStatus::Degraded => "degraded",
            ScoreStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// One uploaded document, held in memory for the duration of the request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content: Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResumeOutcome {
    pub filename: String,
    pub status: ScoreStatus,
    pub record: ScoreRecord,
}

impl ResumeOutcome {
    fn failed(filename: &str, criteria: &Criteria) -> Self {
        Self {
            filename: filename.to_string(),
            status: ScoreStatus::Failed,
            record: ScoreRecord::zeroed(format!("Error Processing {filename}"), criteria),
        }
    }
}

/// Runs the full chain for one resume. Never fails.
pub async fn process_resume(
    upload: &UploadedFile,
    criteria: &Criteria,
    model: &dyn ChatModel,
    policy: AllZeroPolicy,
) -> ResumeOutcome {
    let filename = upload.filename.as_str();
    info!("Processing resume file: {filename}");

    let resume_text = match extract_upload(filename, upload.content.clone()).await {
        Ok(text) => text,
        Err(e) => {
            error!("Error processing resume {filename}: {e}");
            return ResumeOutcome::failed(filename, criteria);
        }
    };
    if resume_text.trim().is_empty() {
        warn!("Empty text extracted from {filename}");
    }

    let candidate_name = extract_candidate_name(&resume_text, model).await;
    let outcome = score_resume(&resume_text, criteria, candidate_name.as_str(), model).await;

    let (mut record, mut status) = match outcome {
        ScoreOutcome::Scored(record) => (record, ScoreStatus::Scored),
        ScoreOutcome::Degraded { record, reason } => {
            warn!("Scoring degraded for {filename}: {reason}");
            (record, ScoreStatus::Degraded)
        }
    };

    if !criteria.is_empty() && record.is_all_zero() {
        if status == ScoreStatus::Scored {
            status = ScoreStatus::Unscored;
        }
        apply_all_zero_policy(&mut record, criteria, policy);
    }

    info!(
        "Scored {filename} as '{}' ({status}): total {}",
        record.candidate_name, record.total_score
    );
    ResumeOutcome {
        filename: filename.to_string(),
        status,
        record,
    }
}

fn apply_all_zero_policy(record: &mut ScoreRecord, criteria: &Criteria, policy: AllZeroPolicy) {
    match policy {
        AllZeroPolicy::Legacy => {
            if let Some(first) = criteria.first() {
                info!(
                    "All scores are 0 for {}, forcing {LEGACY_FALLBACK_SCORE} for '{first}'",
                    record.candidate_name
                );
                record.set_score(first, LEGACY_FALLBACK_SCORE);
            }
        }
        AllZeroPolicy::Unscored => {
            info!("All scores are 0 for {}, leaving unscored", record.candidate_name);
        }
    }
}

/// Scores a batch of resumes, returning one outcome per upload in upload order.
///
/// `concurrency` of 1 processes resumes strictly one after another. Larger values
/// run up to that many resume chains at once. A task that panics becomes a failed
/// outcome for its own file only.
pub async fn score_batch(
    uploads: Vec<UploadedFile>,
    criteria: Arc<Criteria>,
    model: Arc<dyn ChatModel>,
    concurrency: usize,
    policy: AllZeroPolicy,
) -> Vec<ResumeOutcome> {
    info!(
        "Scoring {} resumes against {} criteria (concurrency {concurrency})",
        uploads.len(),
        criteria.len()
    );

    if concurrency <= 1 {
        let mut outcomes = Vec::with_capacity(uploads.len());
        for upload in &uploads {
            outcomes.push(process_resume(upload, &criteria, model.as_ref(), policy).await);
        }
        return outcomes;
    }

    let permits = Arc::new(Semaphore::new(concurrency));
    let mut handles = Vec::with_capacity(uploads.len());
    for upload in uploads {
        let filename = upload.filename.clone();
        let criteria = Arc::clone(&criteria);
        let model = Arc::clone(&model);
        let permits = Arc::clone(&permits);
        let handle = tokio::spawn(async move {
            // Never closed, so acquire cannot fail.
            let _permit = permits.acquire_owned().await.ok();
            process_resume(&upload, &criteria, model.as_ref(), policy).await
        });
        handles.push((filename, handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (filename, handle) in handles {
        match handle.await {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                error!("Resume task for {filename} aborted: {e}");
                outcomes.push(ResumeOutcome::failed(&filename, &criteria));
            }
        }
    }
    outcomes
}

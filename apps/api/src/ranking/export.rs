use anyhow::{Context, Result};

use crate::ranking::criteria::Criteria;
use crate::ranking::scoring::ScoreRecord;

pub const CSV_FILENAME: &str = "resume_scores.csv";

/// Renders score records as CSV: `Candidate Name, <criteria…>, Total Score`,
/// one row per record in the given order.
pub fn write_scores_csv(criteria: &Criteria, records: &[ScoreRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let header = std::iter::once("Candidate Name")
        .chain(criteria.iter())
        .chain(std::iter::once("Total Score"));
    writer.write_record(header).context("failed to write CSV header")?;

    for record in records {
        let mut row = Vec::with_capacity(criteria.len() + 2);
        row.push(record.candidate_name.clone());
        for criterion in criteria.iter() {
            row.push(record.score(criterion).unwrap_or(0).to_string());
        }
        row.push(record.total_score.to_string());
        writer
            .write_record(&row)
            .with_context(|| format!("failed to write CSV row for {}", record.candidate_name))?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush CSV: {}", e.error()))
}

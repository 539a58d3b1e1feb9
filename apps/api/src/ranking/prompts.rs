// All LLM prompt constants for the ranking module.
// Templates use `{placeholder}` markers that are replaced before sending.

/// System prompt for criteria extraction.
pub const CRITERIA_SYSTEM: &str =
    "You are a helpful assistant that extracts key criteria from job descriptions.";

/// Criteria extraction prompt. Replace `{jd_text}` before sending.
pub const CRITERIA_PROMPT_TEMPLATE: &str = r#"You are an AI assistant that helps recruiters extract key ranking criteria from job descriptions.

Given the following job description, extract a list of clear, specific criteria that can be used to evaluate candidates.
Focus on required skills, certifications, experience, and qualifications. Format your response as a JSON array of strings,
with each string representing one specific criterion.

Job Description:
{jd_text}

Format your response as a JSON array of strings like this:
["Must have certification XYZ", "5+ years of experience in Python development", "Strong background in Machine Learning"]"#;

pub const CRITERIA_MAX_TOKENS: u32 = 1024;

/// System prompt for candidate name extraction.
pub const NAME_SYSTEM: &str = "You extract candidate names from resumes.";

/// Name extraction prompt. Replace `{resume_text}` before sending.
pub const NAME_PROMPT_TEMPLATE: &str = r#"Extract the full name of the candidate from this resume text. If no name is found,
return "Unknown Candidate". Just return the name, nothing else.

Resume:
{resume_text}"#;

pub const NAME_MAX_TOKENS: u32 = 50;

/// Characters of resume text sent for name extraction. The name sits near the top.
pub const NAME_EXCERPT_CHARS: usize = 1000;

/// System prompt for resume scoring.
pub const SCORING_SYSTEM: &str = "You are a helpful assistant that scores resumes based on job criteria. \
    Return only clean JSON without comments.";

/// Scoring prompt. Replace `{resume_text}`, `{criteria_json}`, `{candidate_name}`
/// and `{json_only}` before sending.
pub const SCORING_PROMPT_TEMPLATE: &str = r#"You are an AI assistant that helps recruiters score resumes against job criteria.

Given the following resume and criteria, score the candidate on each criterion on a scale of 0-5,
where 0 means not mentioned/completely missing and 5 means excellent match/fully meets the criterion.

Resume:
{resume_text}

Criteria to evaluate:
{criteria_json}

For the candidate named "{candidate_name}", provide scores in clean JSON format WITHOUT ANY COMMENTS:
{
  "candidate_name": "{candidate_name}",
  "scores": {
    "criterion1": score,
    "criterion2": score,
    ...
  },
  "total_score": sum_of_scores
}

{json_only}"#;

pub const SCORING_MAX_TOKENS: u32 = 1024;

/// Characters of resume text sent for scoring.
pub const SCORING_EXCERPT_CHARS: usize = 4000;

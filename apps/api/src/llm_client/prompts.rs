// Shared prompt constants and request tuning.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Low temperature keeps extraction and scoring close to deterministic.
pub const EXTRACTION_TEMPERATURE: f32 = 0.3;

/// Instruction appended to every prompt whose reply is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "\
IMPORTANT: Return only the JSON without any comments, explanations, or backticks.";

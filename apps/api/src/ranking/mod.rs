// Resume ranking engine.
// Implements: criteria extraction, candidate naming, per-criterion scoring,
// per-resume orchestration and CSV export.
// All LLM calls go through llm_client::ChatModel — no direct provider calls here.

pub mod candidate;
pub mod criteria;
pub mod export;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod scoring;

/// Returns at most `max_chars` characters from the start of `text`.
pub(crate) fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Replaces `{key}` markers in one pass. Substituted values are never rescanned,
/// so a value containing another marker is inserted verbatim.
pub(crate) fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let hit = values.iter().find(|(key, _)| {
            tail.strip_prefix('{')
                .and_then(|t| t.strip_prefix(*key))
                .is_some_and(|t| t.starts_with('}'))
        });
        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 2..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

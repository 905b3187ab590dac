pub mod image_gen;
pub mod plan_llm;
pub mod research_llm;

pub use image_gen::OpenAiImageAdapter;
pub use plan_llm::OpenAiPlanAdapter;
pub use research_llm::OpenAiResearchAdapter;

/// Strips a surrounding markdown code fence from a provider payload.
///
/// Models occasionally wrap the requested JSON in ```json fences even when
/// told not to; anything beyond that is still rejected by the strict parse.
pub(crate) fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

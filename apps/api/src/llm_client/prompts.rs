// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.

/// Instruction appended to prompts whose output is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    Respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction appended to every prompt that rewrites resume content.
pub const NO_FABRICATION_INSTRUCTION: &str = "\
    Keep the same factual information. Do NOT invent employers, titles, dates, \
    degrees, certifications, or metrics that are not present in the resume.";

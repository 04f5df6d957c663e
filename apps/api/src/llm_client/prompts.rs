// Cross-cutting prompt fragments. Extraction prompts live in extraction/prompts.rs.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every extraction prompt.
pub const EVIDENCE_INSTRUCTION: &str = "\
    CRITICAL: Extract only what the document states. Do NOT infer, interpolate, or invent \
    skills, years, degrees, or certifications. If a field is not supported by the text, \
    return an empty list, an empty string, or 0.";

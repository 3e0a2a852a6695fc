// Shared prompt fragments.
// Each pipeline stage keeps its own prompt templates next to it; this file only
// holds the pieces every stage appends.

/// Appended to every system prompt: the response is parsed as-is.
pub const JSON_ONLY_SYSTEM: &str = "Output ONLY valid JSON. \
    Do NOT include any text before or after the JSON. \
    Do NOT use markdown code fences. \
    Do NOT include commentary, explanations or apologies.";

/// Appended to prompts whose answer must be a JSON array, even when unsure.
pub const JSON_ARRAY_INSTRUCTION: &str = "IMPORTANT: Return ONLY a plain JSON array of objects. \
    Even if you are unsure, still return a JSON array. \
    The response must be parseable by a strict JSON parser.";

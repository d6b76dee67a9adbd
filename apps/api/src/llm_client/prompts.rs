// Shared prompt fragments. Each module that calls the model keeps its own
// prompts.rs alongside it; cross-cutting constraints live here.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every extraction prompt.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL: Every value you return must be copied from, or directly supported by, \
    the source text provided. Do NOT infer, interpolate, or invent details. \
    If the text does not contain a value, return an empty string (or an empty list).";

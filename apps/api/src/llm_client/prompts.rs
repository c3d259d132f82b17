// Shared prompt fragments and prompt-building utilities.
// Each module that needs model calls defines its own prompts.rs alongside it.
// This file contains cross-cutting fragments.

/// Persona preamble prepended to every interview-engine system prompt.
pub const INTERVIEWER_PERSONA: &str = "You are part of a professional interview panel. \
    Stay professional and constructive. \
    Your output must be accurate and suited to a job interview setting.";

/// Instruction appended when a call expects structured output.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences.";

/// Instruction appended when a call expects a single plain-text question back.
pub const PLAIN_QUESTION_INSTRUCTION: &str =
    "Return only the question itself, with no numbering, quotes, or extra formatting.";

/// Joins the persona with a role description and a task body.
pub fn system_prompt(role: &str, task: &str) -> String {
    format!("{INTERVIEWER_PERSONA}\nYour role: {role}\n\n{task}")
}

/// `system_prompt` followed by an output-format instruction.
pub fn system_prompt_with(role: &str, task: &str, instruction: &str) -> String {
    format!("{}\n\n{instruction}", system_prompt(role, task))
}

//! Chat-completion access to the language model.

mod client;
mod types;

pub use client::{ChatModel, LlmError, OpenAiClient};
pub use types::{ChatMessage, Role};

/// Strips a surrounding Markdown code fence (```json ... ```) from a model reply.
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

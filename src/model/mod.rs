//! Intent models — turn a user question into a tool call.
//!
//! The model is a black box behind [`IntentModel`]. Its output is untrusted:
//! the dispatcher validates whatever comes back.

pub mod llama;
pub mod prompt;

pub use llama::LlamaServerModel;
pub use prompt::system_prompt;

use crate::error::QueryError;
use crate::tools::Intent;

pub trait IntentModel {
    /// Propose one tool call for `text`.
    ///
    /// Timeouts map to [`QueryError::Timeout`]; unreachable endpoints and
    /// unparseable output map to [`QueryError::ModelFailure`].
    fn propose(&self, text: &str) -> Result<Intent, QueryError>;
}

impl<M: IntentModel + ?Sized> IntentModel for &M {
    fn propose(&self, text: &str) -> Result<Intent, QueryError> {
        (**self).propose(text)
    }
}

impl<M: IntentModel + ?Sized> IntentModel for Box<M> {
    fn propose(&self, text: &str) -> Result<Intent, QueryError> {
        (**self).propose(text)
    }
}

/// First balanced `{...}` in `text`, skipping braces inside strings.
///
/// Models often wrap the tool call in prose or code fences.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse model output into an intent.
pub fn parse_intent(content: &str) -> Result<Intent, QueryError> {
    let trimmed = content.trim();
    if let Ok(intent) = serde_json::from_str::<Intent>(trimmed) {
        return Ok(intent);
    }
    let object = extract_json_object(trimmed).ok_or_else(|| {
        QueryError::ModelFailure(format!("no JSON object in model output: {}", snippet(trimmed)))
    })?;
    Intent::from_json(object)
}

fn snippet(text: &str) -> String {
    const MAX: usize = 120;
    match text.char_indices().nth(MAX) {
        Some((i, _)) => format!("{}...", &text[..i]),
        None => text.to_string(),
    }
}

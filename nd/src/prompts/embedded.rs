//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

pub const SUMMARIZE: &str = include_str!("../../prompts/summarize.pmt");
pub const ANALYZE: &str = include_str!("../../prompts/analyze.pmt");
pub const SUGGESTIONS: &str = include_str!("../../prompts/suggestions.pmt");
pub const IMPROVE: &str = include_str!("../../prompts/improve.pmt");
pub const QUESTIONS: &str = include_str!("../../prompts/questions.pmt");
pub const KEY_INFO: &str = include_str!("../../prompts/key-info.pmt");
pub const INTERPRET_COMMAND: &str = include_str!("../../prompts/interpret-command.pmt");
pub const CREATE_PAGE: &str = include_str!("../../prompts/create-page.pmt");
pub const ADD_BLOCKS: &str = include_str!("../../prompts/add-blocks.pmt");
pub const GENERATE: &str = include_str!("../../prompts/generate.pmt");
pub const CUSTOM: &str = include_str!("../../prompts/custom.pmt");
pub const GENERAL: &str = include_str!("../../prompts/general.pmt");

/// Names of every embedded template
pub const NAMES: &[&str] = &[
    "summarize",
    "analyze",
    "suggestions",
    "improve",
    "questions",
    "key-info",
    "interpret-command",
    "create-page",
    "add-blocks",
    "generate",
    "custom",
    "general",
];

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    let found = match name {
        "summarize" => Some(SUMMARIZE),
        "analyze" => Some(ANALYZE),
        "suggestions" => Some(SUGGESTIONS),
        "improve" => Some(IMPROVE),
        "questions" => Some(QUESTIONS),
        "key-info" => Some(KEY_INFO),
        "interpret-command" => Some(INTERPRET_COMMAND),
        "create-page" => Some(CREATE_PAGE),
        "add-blocks" => Some(ADD_BLOCKS),
        "generate" => Some(GENERATE),
        "custom" => Some(CUSTOM),
        "general" => Some(GENERAL),
        _ => None,
    };
    if found.is_none() {
        debug!("get_embedded: no match found");
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_name_is_embedded() {
        for name in NAMES {
            let body = get_embedded(name).unwrap();
            assert!(!body.trim().is_empty(), "{name} is empty");
        }
    }

    #[test]
    fn test_interpret_command_lists_actions() {
        assert!(INTERPRET_COMMAND.contains("read|create|update|search|analyze|generate"));
        assert!(INTERPRET_COMMAND.contains("content_type"));
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("unknown-template").is_none());
    }
}

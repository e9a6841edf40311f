//! Length limits and input validation shared by the stores and requests.

use crate::error::{RapportError, Result};

/// Maximum characters in a message.
pub const MAX_MESSAGE_CHARS: usize = 10_000;
/// Maximum characters in a context entry.
pub const MAX_CONTEXT_CHARS: usize = 2_000;
/// Maximum characters in caller-supplied instructions.
pub const MAX_INSTRUCTIONS_CHARS: usize = 2_000;

/// Trim `content` and require it to be non-empty and at most `max` characters.
pub fn require_content(method: &'static str, content: &str, max: usize) -> Result<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(RapportError::validation(method, "content must be a non-empty string"));
    }
    check_len(method, "content", trimmed, max)?;
    Ok(trimmed.to_string())
}

/// Trim `content` and require it to be at most `max` characters. Empty is allowed.
pub fn require_bounded(method: &'static str, content: &str, max: usize) -> Result<String> {
    let trimmed = content.trim();
    check_len(method, "content", trimmed, max)?;
    Ok(trimmed.to_string())
}

/// Validate optional instructions: when present they must be non-empty and bounded.
pub fn optional_instructions(method: &'static str, instructions: Option<&str>) -> Result<Option<String>> {
    match instructions {
        None => Ok(None),
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(RapportError::validation(
                    method,
                    "instructions must be a non-empty string when provided",
                ));
            }
            check_len(method, "instructions", trimmed, MAX_INSTRUCTIONS_CHARS)?;
            Ok(Some(trimmed.to_string()))
        }
    }
}

/// Validate optional instructions, treating blank input as absent.
pub fn bounded_instructions(method: &'static str, instructions: Option<&str>) -> Result<Option<String>> {
    match instructions.map(str::trim) {
        None | Some("") => Ok(None),
        Some(trimmed) => {
            check_len(method, "instructions", trimmed, MAX_INSTRUCTIONS_CHARS)?;
            Ok(Some(trimmed.to_string()))
        }
    }
}

/// Keep at most `max` characters of `text`, respecting char boundaries.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

fn check_len(method: &'static str, field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(RapportError::validation(
            method,
            format!("{field} is {len} characters, the maximum is {max}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_is_trimmed() {
        assert_eq!(require_content("m", "  hi \n", 10).unwrap(), "hi");
    }

    #[test]
    fn whitespace_only_content_is_rejected() {
        let err = require_content("add_context", "   ", 10).unwrap_err();
        assert!(err.to_string().starts_with("add_context:"));
    }

    #[test]
    fn overlong_content_is_rejected() {
        assert!(require_content("m", "abcdef", 5).is_err());
        assert!(require_bounded("m", "abcdef", 5).is_err());
    }

    #[test]
    fn bounded_content_may_be_empty() {
        assert_eq!(require_bounded("m", "", 5).unwrap(), "");
    }

    #[test]
    fn instructions_are_optional_but_not_blank() {
        assert_eq!(optional_instructions("m", None).unwrap(), None);
        assert_eq!(
            optional_instructions("m", Some(" be brief ")).unwrap().as_deref(),
            Some("be brief")
        );
        assert!(optional_instructions("m", Some("")).is_err());
    }

    #[test]
    fn bounded_instructions_treat_blank_as_absent() {
        assert_eq!(bounded_instructions("m", Some("   ")).unwrap(), None);
        let long = "i".repeat(MAX_INSTRUCTIONS_CHARS + 1);
        assert!(bounded_instructions("m", Some(&long)).is_err());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 5), "hi");
    }
}

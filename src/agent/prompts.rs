//! Instruction prompts synthesized for greetings.

const DEFAULT_GREETING: &str =
    "Write a short, friendly opening line to start a conversation with the user.";
const INTERESTS_HINT: &str =
    " Where it fits naturally, reference the user's interests or recent activity from the context.";
const HISTORY_HINT: &str =
    " Take the previous conversation into account so the greeting follows on from it.";

/// Build the prompt sent on behalf of a greeting request.
pub(crate) fn greeting(instructions: Option<&str>, use_context: bool, has_history: bool) -> String {
    let mut prompt = match instructions {
        Some(instructions) => format!(
            "Write a short opening message to the user following these instructions: {instructions}"
        ),
        None if use_context => format!("{DEFAULT_GREETING}{INTERESTS_HINT}"),
        None => DEFAULT_GREETING.to_string(),
    };
    if has_history {
        prompt.push_str(HISTORY_HINT);
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_greeting_without_extras() {
        assert_eq!(greeting(None, false, false), DEFAULT_GREETING);
    }

    #[test]
    fn context_adds_interest_hint_only_for_default_prompt() {
        assert!(greeting(None, true, false).contains("interests"));
        assert!(!greeting(Some("mention the sale"), true, false).contains("interests"));
    }

    #[test]
    fn explicit_instructions_are_wrapped() {
        let prompt = greeting(Some("mention the sale"), false, false);
        assert!(prompt.ends_with("these instructions: mention the sale"));
    }

    #[test]
    fn history_hint_is_appended() {
        assert!(greeting(Some("x"), false, true).ends_with(HISTORY_HINT));
    }
}

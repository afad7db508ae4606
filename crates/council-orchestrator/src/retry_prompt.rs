//! Synthesis retry prompting (§4.6 phase 3, §9 "Retry prompting is
//! state-carrying"): the retry prompt embeds the prior attempt's raw text
//! and a concise error list, never just a bare re-ask.

/// Build the user-message content for a synthesis retry: the prior
/// (invalid) attempt followed by the concise error list the caller
/// collected from schema validation or JSON parsing.
#[must_use]
pub fn build(prior_attempt: &str, errors: &[String]) -> String {
    let mut prompt = String::from(
        "Your previous synthesis attempt did not validate against the required schema.\n\n",
    );
    prompt.push_str("Previous attempt:\n");
    prompt.push_str(prior_attempt);
    prompt.push_str("\n\nValidation errors:\n");
    for error in errors {
        prompt.push_str("- ");
        prompt.push_str(error);
        prompt.push('\n');
    }
    prompt.push_str(
        "\nProduce a corrected synthesis that resolves every error above. \
         Respond with the JSON object only.",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeds_prior_attempt_and_every_error() {
        let prompt = build(
            r#"{"name": "x"}"#,
            &["'age' is a required property".to_string(), "'name' is too short".to_string()],
        );
        assert!(prompt.contains(r#"{"name": "x"}"#));
        assert!(prompt.contains("'age' is a required property"));
        assert!(prompt.contains("'name' is too short"));
    }

    #[test]
    fn no_errors_still_produces_well_formed_prompt() {
        let prompt = build("prior text", &[]);
        assert!(prompt.contains("prior text"));
        assert!(prompt.contains("Validation errors:"));
    }
}

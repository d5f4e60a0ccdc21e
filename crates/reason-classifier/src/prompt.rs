//! System instruction sent with every classification request.

use reason_types::TopicTaxonomy;

/// Build the fixed system instruction for `taxonomy`.
///
/// The instruction enumerates every label and demands a bare JSON object
/// with `topic` and `confidence` keys.
pub fn build_system_prompt(taxonomy: &TopicTaxonomy) -> String {
    let topic_list = taxonomy
        .topics()
        .iter()
        .map(|t| format!("- {}", t))
        .collect::<Vec<_>>()
        .join("\n");
    let fallback = taxonomy.fallback();

    format!(
        r#"You are a topic classifier. Given a short text explaining why someone is attending a data/AI event, classify it into exactly ONE of these topics:

{topic_list}

Respond with ONLY a JSON object in this exact format:
{{"topic": "<topic name>", "confidence": <0.0 to 1.0>}}

Rules:
- Pick the single best-matching topic
- Use the exact topic name from the list above
- confidence should reflect how clearly the text matches (0.7+ for clear matches, 0.4-0.7 for ambiguous)
- Use "{fallback}" only if none of the topics fit at all"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_every_topic() {
        let taxonomy = TopicTaxonomy::default();
        let prompt = build_system_prompt(&taxonomy);
        for topic in taxonomy.topics() {
            assert!(prompt.contains(&format!("- {}", topic)), "missing {}", topic);
        }
        assert!(prompt.contains(r#"{"topic": "<topic name>", "confidence": <0.0 to 1.0>}"#));
        assert!(prompt.contains(r#"Use "Other" only if"#));
    }

    #[test]
    fn test_prompt_uses_custom_fallback() {
        let taxonomy = TopicTaxonomy::new(["Rust", "Misc"], "Misc").unwrap();
        let prompt = build_system_prompt(&taxonomy);
        assert!(prompt.contains("- Rust\n- Misc"));
        assert!(prompt.contains(r#"Use "Misc" only if"#));
    }
}

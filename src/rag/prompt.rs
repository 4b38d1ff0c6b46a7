use crate::vectorstore::ScoredPoint;

/// Question-answering template; `{context}` and `{question}` are substituted
pub const QA_PROMPT_TEMPLATE: &str = "Use the following pieces of information to answer the user's question.
If you don't know the answer, just say that you don't know, don't try to make up an answer.

Context: {context}
Question: {question}

Only return the helpful answer. Answer must be detailed and well explained.
Helpful answer:";

/// Join retrieved chunk texts with blank lines, skipping points without text
pub fn join_context(points: &[ScoredPoint]) -> String {
    points
        .iter()
        .filter_map(ScoredPoint::content)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Fill the template in one pass; substituted text is never rescanned
pub fn build_prompt(context: &str, question: &str) -> String {
    let mut prompt = String::with_capacity(QA_PROMPT_TEMPLATE.len() + context.len() + question.len());
    let mut rest = QA_PROMPT_TEMPLATE;

    while let Some(start) = rest.find('{') {
        prompt.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{context}") {
            prompt.push_str(context);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{question}") {
            prompt.push_str(question);
            rest = after;
        } else {
            prompt.push('{');
            rest = &tail[1..];
        }
    }
    prompt.push_str(rest);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn point(text: Option<&str>) -> ScoredPoint {
        ScoredPoint {
            id: "x".to_string(),
            score: 1.0,
            payload: match text {
                Some(t) => json!({ "page_content": t }),
                None => json!({}),
            },
        }
    }

    #[test]
    fn test_join_context() {
        let points = vec![point(Some(" first ")), point(None), point(Some("second"))];
        assert_eq!(join_context(&points), "first\n\nsecond");
    }

    #[test]
    fn test_build_prompt_fills_slots() {
        let prompt = build_prompt("Rust was released in 2015.", "When was Rust released?");
        assert!(prompt.contains("Context: Rust was released in 2015.\n"));
        assert!(prompt.contains("Question: When was Rust released?\n"));
        assert!(prompt.ends_with("Helpful answer:"));
        assert!(!prompt.contains("{context}"));
    }

    #[test]
    fn test_build_prompt_keeps_placeholders_inside_values() {
        let prompt = build_prompt("See {question} in the form.", "What is {context}?");
        assert!(prompt.contains("Context: See {question} in the form.\n"));
        assert!(prompt.contains("Question: What is {context}?\n"));
    }
}

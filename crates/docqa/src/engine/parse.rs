//! Lenient parsing of generation output
//!
//! The generation call returns loosely structured text. Outcomes are a
//! tagged result, `Parsed` or `Unparseable`, and callers handle both
//! explicitly instead of relying on fallback chains.

use regex::Regex;
use std::sync::OnceLock;

use crate::types::QaPair;

/// Outcome of parsing generation output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome<T> {
    /// The output parsed into the expected shape
    Parsed(T),
    /// The output did not parse; the raw text is preserved
    Unparseable(String),
}

impl<T> ParseOutcome<T> {
    /// True when the output parsed
    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }
}

/// Parse a free-form answer: trimmed non-empty text, with a leading
/// "Answer:" label stripped when the model echoes the prompt template.
pub fn parse_answer(raw: &str) -> ParseOutcome<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ParseOutcome::Unparseable(raw.to_string());
    }

    let answer = trimmed
        .strip_prefix("Answer:")
        .map(str::trim)
        .unwrap_or(trimmed);

    if answer.is_empty() {
        ParseOutcome::Unparseable(raw.to_string())
    } else {
        ParseOutcome::Parsed(answer.to_string())
    }
}

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^```[a-zA-Z]*\s*$").expect("valid regex"))
}

fn array_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)(\[.*\])").expect("valid regex"))
}

/// Parse a JSON-like array of question/answer pairs.
///
/// Models asked for a JSON array frequently wrap it in markdown fences,
/// prepend commentary, or emit single-quoted keys. Parsing is attempted in
/// order: raw JSON, fence-stripped JSON, first bracketed span, bracketed
/// span with single quotes replaced. Anything else is `Unparseable`.
pub fn parse_qa_pairs(raw: &str) -> ParseOutcome<Vec<QaPair>> {
    if let Ok(pairs) = serde_json::from_str::<Vec<QaPair>>(raw) {
        return ParseOutcome::Parsed(pairs);
    }

    let stripped = fence_regex().replace_all(raw, "").trim().to_string();
    if let Ok(pairs) = serde_json::from_str::<Vec<QaPair>>(&stripped) {
        return ParseOutcome::Parsed(pairs);
    }

    if let Some(cap) = array_regex().captures(&stripped) {
        let candidate = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
        if let Ok(pairs) = serde_json::from_str::<Vec<QaPair>>(candidate) {
            return ParseOutcome::Parsed(pairs);
        }
        if let Ok(pairs) = serde_json::from_str::<Vec<QaPair>>(&candidate.replace('\'', "\"")) {
            return ParseOutcome::Parsed(pairs);
        }
    }

    ParseOutcome::Unparseable(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_answer_parses() {
        assert_eq!(
            parse_answer("The capital is Paris."),
            ParseOutcome::Parsed("The capital is Paris.".to_string())
        );
    }

    #[test]
    fn answer_label_is_stripped() {
        assert_eq!(
            parse_answer("Answer: forty-two"),
            ParseOutcome::Parsed("forty-two".to_string())
        );
    }

    #[test]
    fn blank_answer_is_unparseable() {
        assert!(!parse_answer("   \n ").is_parsed());
        assert!(!parse_answer("Answer:").is_parsed());
    }

    #[test]
    fn clean_json_array_parses() {
        let raw = r#"[{"question": "Q1?", "answer": "A1"}, {"question": "Q2?", "answer": "A2"}]"#;
        match parse_qa_pairs(raw) {
            ParseOutcome::Parsed(pairs) => {
                assert_eq!(pairs.len(), 2);
                assert_eq!(pairs[0].question, "Q1?");
                assert_eq!(pairs[1].answer, "A2");
            }
            ParseOutcome::Unparseable(_) => panic!("expected parse"),
        }
    }

    #[test]
    fn fenced_json_array_parses() {
        let raw = "```json\n[{\"question\": \"Q?\", \"answer\": \"A\"}]\n```";
        assert!(parse_qa_pairs(raw).is_parsed());
    }

    #[test]
    fn commentary_around_array_is_tolerated() {
        let raw = "Here are the pairs you asked for:\n[{\"question\": \"Q?\", \"answer\": \"A\"}]\nHope this helps!";
        match parse_qa_pairs(raw) {
            ParseOutcome::Parsed(pairs) => assert_eq!(pairs.len(), 1),
            ParseOutcome::Unparseable(_) => panic!("expected parse"),
        }
    }

    #[test]
    fn single_quoted_array_is_repaired() {
        let raw = "[{'question': 'Q?', 'answer': 'A'}]";
        assert!(parse_qa_pairs(raw).is_parsed());
    }

    #[test]
    fn garbage_is_unparseable_with_raw_preserved() {
        let raw = "I could not produce the requested format.";
        match parse_qa_pairs(raw) {
            ParseOutcome::Unparseable(text) => assert_eq!(text, raw),
            ParseOutcome::Parsed(_) => panic!("expected unparseable"),
        }
    }
}

use serde_json::{json, Value};

use crate::models::Source;

pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "results": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "text": { "type": "string" },
                        "sentiment": { "type": "string", "enum": ["Positive", "Negative", "Neutral"] },
                        "confidence_score": { "type": "number" },
                        "code_switched": { "type": "boolean" },
                        "key_emotive_phrases": { "type": "array", "items": { "type": "string" } },
                        "explanation": { "type": "string" },
                        "business_insight": { "type": "string" },
                        "author_age": { "type": "string", "enum": ["18-24", "25-34", "35-44", "45-54", "55+"] },
                        "source": { "type": "string" }
                    },
                    "required": [
                        "sentiment", "confidence_score", "code_switched",
                        "key_emotive_phrases", "explanation", "business_insight",
                        "author_age", "source"
                    ]
                }
            }
        },
        "required": ["results"]
    })
}

fn with_contract(task: &str) -> String {
    let schema = serde_json::to_string_pretty(&response_schema()).unwrap_or_default();
    format!(
        r#"{task}

Return ONLY a JSON object matching this schema, one entry in "results" per text, in input order:
<{schema}>

CONSTRAINTS:
- confidence_score is a number between 0 and 1.
- No prose outside the JSON object."#
    )
}

pub fn user_analyze(texts: &[String], source: &Source) -> String {
    let numbered = texts
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{}. \"{}\"", i + 1, t))
        .collect::<Vec<_>>()
        .join("\n");
    with_contract(&format!(
        "Perform a sentiment analysis for these texts originating from {}:\n{}",
        source, numbered
    ))
}

pub fn user_social_pulse(keyword: &str, platforms: &[Source]) -> String {
    let list = platforms.iter().map(Source::as_str).collect::<Vec<_>>().join(", ");
    with_contract(&format!(
        "Act as a social media aggregator. Generate 5 realistic, diverse social media posts/reviews about \"{kw}\" \
         as if they were just posted on {list}. Include each post verbatim in the \"text\" field. \
         Then analyze them using the Sentiment Compass rules. Ensure each result has a 'source' field matching one of: {list}.",
        kw = keyword,
        list = list
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_prompt_numbers_and_quotes_texts() {
        let p = user_analyze(&["first one".into(), "second one".into()], &Source::Manual);
        assert!(p.contains("originating from Manual"));
        assert!(p.contains("1. \"first one\""));
        assert!(p.contains("2. \"second one\""));
        assert!(p.contains("\"results\""));
    }

    #[test]
    fn shipped_template_carries_the_persona() {
        let tpl = include_str!("../templates/sentiment_compass.yaml");
        assert!(tpl.starts_with("system_prompt:"));
        assert!(tpl.contains("Lilac Compass"));
        assert!(tpl.contains("code-switching"));
        assert!(tpl.contains("valid JSON"));
    }

    #[test]
    fn pulse_prompt_lists_platforms() {
        let p = user_social_pulse("rooibos", &[Source::X, Source::TikTok]);
        assert!(p.contains("\"rooibos\""));
        assert!(p.contains("X, TikTok"));
    }
}

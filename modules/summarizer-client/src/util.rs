use anyhow::{anyhow, Result};

/// Strip markdown code fences from a model response.
pub(crate) fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Pull a JSON object out of a model reply, trying the encodings models
/// actually produce: bare JSON, fenced JSON, or an object embedded in prose.
pub fn extract_json_object(reply: &str) -> Result<serde_json::Value> {
    let stripped = strip_code_blocks(reply);

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(stripped) {
        if value.is_object() {
            return Ok(value);
        }
    }

    // Last resort: widest brace-delimited slice.
    if let (Some(start), Some(end)) = (stripped.find('{'), stripped.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&stripped[start..=end]) {
                if value.is_object() {
                    return Ok(value);
                }
            }
        }
    }

    Err(anyhow!("no JSON object in model reply"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_bare_json() {
        let value = extract_json_object(r#"{"summary": "hi"}"#).unwrap();
        assert_eq!(value, json!({"summary": "hi"}));
    }

    #[test]
    fn parses_fenced_json() {
        let value = extract_json_object("```json\n{\"summary\": \"hi\"}\n```").unwrap();
        assert_eq!(value["summary"], "hi");
    }

    #[test]
    fn parses_embedded_object() {
        let value =
            extract_json_object("Here is the result:\n{\"summary\": \"hi\"}\nHope that helps!")
                .unwrap();
        assert_eq!(value["summary"], "hi");
    }

    #[test]
    fn rejects_non_object() {
        assert!(extract_json_object("[1, 2, 3]").is_err());
        assert!(extract_json_object("no json here").is_err());
        assert!(extract_json_object("").is_err());
    }
}

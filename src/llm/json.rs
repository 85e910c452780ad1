//! JSON extraction from model replies.
//!
//! Models often wrap JSON in markdown fences or surround it with prose.

/// Extract the first JSON object from a model reply.
///
/// Tries a ` ```json ` fence, then a bare fence, then the first `{` that
/// begins a valid object. A fence is only taken when its whole content
/// parses, so a fence closed early by a code block inside a JSON string falls
/// through. Returns `None` when the reply holds no JSON object at all.
pub fn extract_json(response: &str) -> Option<String> {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```json")
        && let Some(end) = trimmed[start + 7..].find("```")
    {
        let inner = trimmed[start + 7..start + 7 + end].trim();
        if is_json_object(inner) {
            return Some(inner.to_string());
        }
    }

    if let Some(start) = trimmed.find("```")
        && let Some(end) = trimmed[start + 3..].find("```")
    {
        let inner = trimmed[start + 3..start + 3 + end].trim();
        if is_json_object(inner) {
            return Some(inner.to_string());
        }
    }

    find_valid_json_object(trimmed)
}

fn is_json_object(text: &str) -> bool {
    text.starts_with('{') && serde_json::from_str::<serde_json::Value>(text).is_ok()
}

/// Try every `{` in turn: a streaming `serde_json` parse first (tolerates
/// trailing text), then balanced-brace extraction validated by `serde_json`.
fn find_valid_json_object(text: &str) -> Option<String> {
    for (start_idx, _) in text.match_indices('{') {
        let candidate = &text[start_idx..];

        let mut stream =
            serde_json::Deserializer::from_str(candidate).into_iter::<serde_json::Value>();
        if let Some(Ok(value)) = stream.next()
            && value.is_object()
        {
            return Some(candidate[..stream.byte_offset()].to_string());
        }

        if let Some(json_str) = extract_balanced_braces(candidate)
            && serde_json::from_str::<serde_json::Value>(&json_str).is_ok()
        {
            return Some(json_str);
        }
    }

    None
}

/// Substring with balanced braces starting at the first `{`, ignoring braces
/// inside string literals.
fn extract_balanced_braces(text: &str) -> Option<String> {
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (idx, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[..=idx].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

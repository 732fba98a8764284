//! JSON payload extraction from free-form reasoning output.
//!
//! Upstream models wrap their JSON in markdown fences, preamble, or
//! trailing commentary. Extraction tries a fenced block first, then
//! falls back to scanning for the first balanced object.

/// Extract the JSON payload from a raw response.
pub fn extract_payload(raw: &str) -> Option<&str> {
    fenced_block(raw).or_else(|| brace_block(raw))
}

/// Body of the first ```-fenced block, language tag ignored.
fn fenced_block(raw: &str) -> Option<&str> {
    let start = raw.find("```")?;
    let after_tag = &raw[start + 3..];
    let body_start = after_tag.find('\n')?;
    let body = &after_tag[body_start + 1..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// First balanced `{ ... }` object, honoring string literals.
fn brace_block(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_json_block() {
        let raw = "Here is my analysis:\n```json\n{\"action\": \"BUY\"}\n```\nLet me know.";
        assert_eq!(extract_payload(raw), Some("{\"action\": \"BUY\"}"));
    }

    #[test]
    fn test_fence_without_language_tag() {
        let raw = "```\n{\"action\": \"HOLD\"}\n```";
        assert_eq!(extract_payload(raw), Some("{\"action\": \"HOLD\"}"));
    }

    #[test]
    fn test_bare_object_with_surrounding_prose() {
        let raw = "Sure. {\"confidence\": 0.8, \"nested\": {\"a\": 1}} Hope that helps!";
        assert_eq!(
            extract_payload(raw),
            Some("{\"confidence\": 0.8, \"nested\": {\"a\": 1}}")
        );
    }

    #[test]
    fn test_braces_inside_strings_do_not_close_the_object() {
        let raw = "{\"reasoning\": \"boundary {cases} ahead\", \"ok\": true}";
        assert_eq!(extract_payload(raw), Some(raw));
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let raw = "{\"text\": \"she said \\\"sell\\\"\"}";
        assert_eq!(extract_payload(raw), Some(raw));
    }

    #[test]
    fn test_unbalanced_object_is_rejected() {
        assert_eq!(extract_payload("{\"action\": \"BUY\""), None);
    }

    #[test]
    fn test_no_payload_at_all() {
        assert_eq!(extract_payload("I cannot answer that."), None);
    }

    #[test]
    fn test_inline_fence_falls_back_to_brace_scan() {
        let raw = "```json {\"action\": \"SELL\"} ```";
        assert_eq!(extract_payload(raw), Some("{\"action\": \"SELL\"}"));
    }
}

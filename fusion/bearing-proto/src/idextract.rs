//! Best-effort id extraction from a malformed message, used to emit a
//! targeted NACK even when the payload doesn't parse as a valid `Envelope`.

/// Try to recover the `id` field of a message that failed full schema
/// validation.
///
/// 1. Parse as generic JSON; if it has a numeric `id` field, use it.
/// 2. Else scan for the literal substring `"id":`, skip whitespace, and
///    parse the run of decimal digits that follows.
/// 3. Else return `-1`.
pub fn try_find_id(raw: &str) -> i64 {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) {
        if let Some(id) = value.get("id").and_then(|v| v.as_i64()) {
            return id;
        }
    }

    if let Some(pos) = raw.find("\"id\":") {
        let rest = &raw[pos + "\"id\":".len()..];
        let rest = rest.trim_start();
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        if !digits.is_empty() {
            if let Ok(id) = digits.parse::<i64>() {
                return id;
            }
        }
    }

    -1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_json_with_numeric_id() {
        let raw = r#"{"id": 99, "type": "ack"}"#;
        assert_eq!(try_find_id(raw), 99);
    }

    #[test]
    fn truncated_json_containing_id_field() {
        let raw = r#"{"id":42,"typ"#;
        assert_eq!(try_find_id(raw), 42);
    }

    #[test]
    fn unrelated_text_yields_negative_one() {
        assert_eq!(try_find_id("not json at all"), -1);
    }

    #[test]
    fn id_field_with_intervening_whitespace() {
        let raw = r#"{"id":   7, "x": 1"#;
        assert_eq!(try_find_id(raw), 7);
    }
}

//! Markup escaping for user-supplied text.

use serde_json::Value;

/// Escapes HTML special characters, quotes included.
#[must_use]
pub fn escape_markup(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Escapes the string field `field` of an object payload in place.
///
/// Non-object payloads and non-string fields are left untouched.
pub fn escape_field(payload: &mut Value, field: &str) {
    if let Some(Value::String(text)) = payload.get_mut(field) {
        *text = escape_markup(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escape_markup() {
        assert_eq!(
            escape_markup(r#"<script>alert("x")</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape_markup("Tom & Jerry's"), "Tom &amp; Jerry&#x27;s");
        assert_eq!(escape_markup("plain"), "plain");
    }

    #[test]
    fn test_ampersand_escaped_once() {
        assert_eq!(escape_markup("&lt;"), "&amp;lt;");
    }

    #[test]
    fn test_escape_field() {
        let mut payload = json!({"content": "<b>hi</b>", "from_user_id": 3});
        escape_field(&mut payload, "content");
        assert_eq!(payload["content"], "&lt;b&gt;hi&lt;/b&gt;");

        let mut numeric = json!({"content": 5});
        escape_field(&mut numeric, "content");
        assert_eq!(numeric["content"], 5);
    }
}

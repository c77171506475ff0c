// src/utils/html.rs

use std::collections::HashSet;

/// Entities ammonia's serializer emits for text nodes. `&amp;` goes last so
/// that an escaped entity such as `&amp;lt;` decodes to `&lt;` only once.
const TEXT_ENTITIES: [(&str, &str); 4] = [
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&nbsp;", "\u{a0}"),
    ("&amp;", "&"),
];

/// Reduces participant or admin supplied text to plain text.
///
/// Every tag is dropped with ammonia, and `<script>`/`<style>` lose their
/// contents too. The result is stored as plain text, so entities are decoded
/// again and clients must render it as text, never as HTML.
pub fn clean_text(input: &str) -> String {
    let mut builder = ammonia::Builder::empty();
    builder.clean_content_tags(HashSet::from(["script", "style"]));

    let cleaned = builder.clean(input.trim()).to_string();

    TEXT_ENTITIES
        .iter()
        .fold(cleaned, |text, (entity, plain)| text.replace(entity, plain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_markup_and_scripts() {
        let cleaned = clean_text(r#" <b onclick="steal()">Great quiz</b><script>alert(1)</script> "#);
        assert_eq!(cleaned, "Great quiz");
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(clean_text("Click the link to claim 500 THB"), "Click the link to claim 500 THB");
    }

    #[test]
    fn special_characters_are_not_escaped() {
        assert_eq!(clean_text("Tom & Jerry said 1 < 2"), "Tom & Jerry said 1 < 2");
        assert_eq!(
            clean_text("Pay now at https://bank.example/verify?a=1&b=2 > today"),
            "Pay now at https://bank.example/verify?a=1&b=2 > today"
        );
        assert_eq!(clean_text("literal &amp;lt; stays"), "literal &lt; stays");
    }
}

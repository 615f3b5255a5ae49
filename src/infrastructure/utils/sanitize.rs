use std::collections::HashSet;

use ammonia::Builder;

/// Trims a submitted field and strips every HTML tag from it, returning
/// plain text. Text content survives; `script` and `style` bodies are
/// dropped along with the tags.
pub fn sanitize_field(value: &str) -> String {
    let stripped = Builder::default()
        .tags(HashSet::new())
        .clean(value.trim())
        .to_string();

    unescape_text(&stripped)
}

/// Undoes the escaping the HTML serializer applies to text nodes.
/// `&amp;` goes last so `&amp;lt;` decodes to `&lt;`, not `<`.
fn unescape_text(escaped: &str) -> String {
    escaped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", "\u{a0}")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}


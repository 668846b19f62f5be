// src/utils/html.rs

use std::collections::HashSet;

/// Reduces user-authored free text (titles, question text, option labels,
/// student names) to plain text before it is stored.
///
/// Every tag is removed; `<script>` and `<style>` lose their content too.
/// The result is plain text: a literal `<` typed by the author stays `<`,
/// so clients must escape it when rendering into HTML.
pub fn clean_text(input: &str) -> String {
    let sanitized = ammonia::Builder::default()
        .tags(HashSet::new())
        .clean(input)
        .to_string();
    unescape_text(&sanitized).trim().to_string()
}

/// Applies [`clean_text`] to every entry, keeping order.
pub fn clean_all(inputs: &[String]) -> Vec<String> {
    inputs.iter().map(|s| clean_text(s)).collect()
}

/// Reverses the entity escaping ammonia's serializer applies to text nodes.
/// `&amp;` goes last so that an escaped `&lt;` does not decode twice.
fn unescape_text(escaped: &str) -> String {
    escaped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

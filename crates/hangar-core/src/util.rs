/// Truncate a string to at most `max` characters, respecting char boundaries.
///
/// Example: `truncate_chars("Ålesund base", 3)` → `"Åle"`
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Collapse every run of whitespace (including non-breaking spaces) into a single space.
pub fn collapse_whitespace(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '\u{00A0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Prepare free text for pattern matching: lowercase, non-breaking spaces
/// become plain spaces and carriage returns become line feeds.
pub fn matchable_text(s: &str) -> String {
    s.replace('\u{00A0}', " ")
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .to_lowercase()
}

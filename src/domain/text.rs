/// Maximum title length in characters before truncation
pub const TITLE_MAX_CHARS: usize = 60;

/// Collapse every run of whitespace into one space and trim the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Hard-truncate to `max_chars` characters, trimming trailing whitespace and appending "..."
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let head: String = text.chars().take(max_chars).collect();
    format!("{}...", head.trim_end())
}

/// Title for a caption, or `fallback` when the caption is empty
pub fn title_from(caption: &str, fallback: &str) -> String {
    if caption.is_empty() {
        fallback.to_string()
    } else {
        truncate_text(caption, TITLE_MAX_CHARS)
    }
}

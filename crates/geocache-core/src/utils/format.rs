/// Normalize one component of a place description.
/// Trims, collapses internal whitespace runs to a single space and lowercases.
/// Returns None when nothing is left.
pub fn normalize_place(value: &str) -> Option<String> {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.to_lowercase())
    }
}

/// Truncate a response body to avoid logging excessive data
pub fn truncate_body(body: &str, max_len: usize) -> String {
    if body.len() <= max_len {
        return body.to_string();
    }
    // Back off to a char boundary so multi-byte text can't panic the slice
    let mut end = max_len;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}

// Output formatting — terminal display for the one-shot CLI commands.

pub mod terminal;

/// Shorten `text` to its first `max_chars` characters for a one-line
/// preview, marking the cut with "...". Cuts on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_input_unchanged() {
        assert_eq!(truncate_chars("cat.jpg", 60), "cat.jpg");
        assert_eq!(truncate_chars("exactly", 7), "exactly");
    }

    #[test]
    fn test_long_input_cut_on_char_boundary() {
        assert_eq!(truncate_chars("éééé", 2), "éé...");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
    }
}

//! Result previews cut around the first query match.

pub const ELLIPSIS: &str = "...";

/// Extracts at most `length` characters of `text` around the earliest
/// case-insensitive occurrence of any of `terms`.
///
/// Without a match the head of the text is returned. An ellipsis marks each
/// side where text was cut, so the result never exceeds
/// `length + 2 * ELLIPSIS.len()` characters.
pub fn extract_snippet(text: &str, terms: &[String], length: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();

    let Some(match_at) = earliest_match(text, terms) else {
        if total > length {
            let mut head: String = chars[..length].iter().collect();
            head.push_str(ELLIPSIS);
            return head;
        }
        return text.to_string();
    };

    let start = match_at.min(total).saturating_sub(length / 2);
    let end = (start + length).min(total);

    let mut snippet = String::new();
    if start > 0 {
        snippet.push_str(ELLIPSIS);
    }
    snippet.extend(&chars[start..end]);
    if end < total {
        snippet.push_str(ELLIPSIS);
    }
    snippet
}

/// Character offset of the earliest occurrence of any term.
fn earliest_match(text: &str, terms: &[String]) -> Option<usize> {
    let lowered = text.to_lowercase();
    terms
        .iter()
        .filter(|term| !term.is_empty())
        .filter_map(|term| lowered.find(term.as_str()))
        .min()
        .map(|byte_offset| lowered[..byte_offset].chars().count())
}

//! Turn a model-produced "SENDER - TOPIC" line into a safe base name.

/// Characters that are rejected by at least one of Windows, macOS, or Drive.
const ILLEGAL: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Sanitise a topic line into a file name stem of at most `max_len` chars.
///
/// Illegal and control characters are removed, spaces become underscores,
/// and leading/trailing spaces, underscores, and hyphens are stripped. The
/// result is cut to `max_len` characters and re-stripped so truncation never
/// leaves a dangling separator. An input that sanitises to nothing becomes
/// `"Untitled"` (itself cut to `max_len`), so the caller always has a
/// usable stem within the length bound.
pub fn sanitize_topic(topic: &str, max_len: usize) -> String {
    let cleaned: String = topic
        .chars()
        .filter(|c| !ILLEGAL.contains(c) && !c.is_control())
        .map(|c| if c == ' ' { '_' } else { c })
        .collect();

    let trimmed: String = cleaned
        .trim_matches(|c| c == ' ' || c == '_' || c == '-')
        .chars()
        .take(max_len)
        .collect();

    let stem = trimmed.trim_matches(|c| c == ' ' || c == '_' || c == '-');
    if stem.is_empty() {
        "Untitled".chars().take(max_len).collect()
    } else {
        stem.to_string()
    }
}

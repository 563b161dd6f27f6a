//! Truncation detection and continuation-marker handling

use crate::protocol::CompletionResult;

/// Token the model is told to end a reply with when it ran out of room
pub const CONTINUATION_MARKER: &str = "[[CONTINUE]]";

/// Strip one trailing marker (ASCII case-insensitive) from `text`
fn strip_marker_suffix(text: &str) -> Option<&str> {
    let split = text.len().checked_sub(CONTINUATION_MARKER.len())?;
    if !text.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = text.split_at(split);
    tail.eq_ignore_ascii_case(CONTINUATION_MARKER).then_some(head)
}

/// Whether `text`, ignoring trailing whitespace, ends with the marker
pub fn ends_with_marker(text: &str) -> bool {
    strip_marker_suffix(text.trim_end()).is_some()
}

/// Whether a reply was truncated and should be continued.
///
/// A `length` finish reason wins even without the marker: a model cut off
/// mid-sentence never gets to emit it.
pub fn needs_continuation(result: &CompletionResult) -> bool {
    result.is_length_truncated() || ends_with_marker(&result.text)
}

/// Remove every trailing marker and the whitespace around it
pub fn strip_marker(text: &str) -> String {
    let mut current = text.trim_end();
    while let Some(rest) = strip_marker_suffix(current) {
        current = rest.trim_end();
    }
    current.to_string()
}

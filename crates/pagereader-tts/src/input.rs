/// Per-call input ceiling, bounding synthesis latency and cost.
pub const MAX_INPUT_CHARS: usize = 4000;

/// Build the text sent to synthesis for one section: truncate to the input
/// ceiling with a marker, and prefix the section title for context.
pub fn build_input(title: Option<&str>, text: &str) -> String {
    let truncated = truncate(text, MAX_INPUT_CHARS);
    match title {
        Some(t) if !t.trim().is_empty() => format!("{}\n\n{}", t.trim(), truncated),
        _ => truncated,
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

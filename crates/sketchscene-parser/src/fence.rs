//! Removal of Markdown code fences around model output.

/// Strip a surrounding Markdown code fence, if any, and trim the result.
///
/// The opening fence line may carry a language tag (```` ```json ````).
/// A missing closing fence is tolerated. Text without an opening fence is
/// returned trimmed.
///
/// # Example
///
/// ```
/// use sketchscene_parser::strip_code_fence;
///
/// assert_eq!(strip_code_fence("```csv\ntype,x\ntext,1\n```"), "type,x\ntext,1");
/// assert_eq!(strip_code_fence("  {\"a\": 1}  "), "{\"a\": 1}");
/// ```
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the rest of the opening line (the language tag).
    let body = match after_open.find('\n') {
        Some(newline) => &after_open[newline + 1..],
        None => after_open.trim_start_matches(|ch: char| ch.is_ascii_alphanumeric()),
    };

    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

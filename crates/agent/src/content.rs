/// Cap document text at `max_chars` characters before it is sent anywhere.
///
/// Within the limit the text passes through unchanged; over the limit the
/// first `max_chars` characters are kept and a truncation notice appended.
/// Counts characters, not bytes, so multi-byte text never splits mid-char.
pub fn prepare_content(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }

    let truncated: String = content.chars().take(max_chars).collect();
    format!("{truncated}\n\n[Content truncated at {max_chars} characters]")
}

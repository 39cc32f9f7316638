//! Display name helpers

/// Truncate a display name to `max_chars` characters, marking the cut with
/// `"..."`. Names of exactly `max_chars` characters are marked too.
///
/// # Example
///
/// ```
/// use tideline_app::views::naming::truncate_display_name;
///
/// assert_eq!(truncate_display_name("general", 25), "general");
/// assert_eq!(truncate_display_name("announcements", 5), "annou...");
/// assert_eq!(truncate_display_name("devops", 6), "devops...");
/// ```
#[must_use]
pub fn truncate_display_name(name: &str, max_chars: usize) -> String {
    if name.chars().count() < max_chars {
        return name.to_string();
    }
    let cut = name.char_indices().nth(max_chars).map_or(name.len(), |(i, _)| i);
    format!("{}...", &name[..cut])
}

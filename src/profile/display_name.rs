//! Display-name derivation

/// Derive a human-readable label from an optional full name and an email
///
/// The trimmed full name wins when non-empty. Otherwise the email's local
/// part (the substring before the first `@`) is used, provided the `@` is
/// not the first character; failing that the email is returned unchanged.
/// For a non-empty email the result is never empty.
#[must_use]
pub fn format_display_name(full_name: Option<&str>, email: &str) -> String {
    if let Some(name) = full_name {
        let trimmed = name.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    match email.find('@') {
        Some(at) if at > 0 => email[..at].to_string(),
        _ => email.to_string(),
    }
}

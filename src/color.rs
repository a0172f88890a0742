//! Color tokens for categories.

/// Color given to categories created without one.
pub const DEFAULT_COLOR: &str = "#6366f1";

/// Validate if a string is a valid hex color (e.g., #RRGGBB).
pub fn is_valid_hex(s: &str) -> bool {
    s.starts_with('#') && s.len() == 7 && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Returns the color lowercased when it is a valid hex token.
pub fn normalize(s: &str) -> Option<String> {
    let trimmed = s.trim();
    is_valid_hex(trimmed).then(|| trimmed.to_ascii_lowercase())
}

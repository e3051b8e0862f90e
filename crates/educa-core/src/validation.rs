//! # Input Validation
//!
//! Field-level checks applied before anything reaches a write transaction.

use crate::primitives::{
    MAX_MESSAGE_LENGTH, MAX_SLUG_LENGTH, MAX_TEXT_LENGTH, MAX_USERNAME_LENGTH, MIN_PASSWORD_LENGTH,
};
use crate::types::EducaError;

/// Trim a title and check it is non-empty and within `max` characters.
pub fn title(field: &str, value: &str, max: usize) -> Result<String, EducaError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EducaError::Validation(format!("{field} must not be empty")));
    }
    let len = trimmed.chars().count();
    if len > max {
        return Err(EducaError::Validation(format!(
            "{field} length {len} exceeds maximum {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Free text may be empty but is bounded.
pub fn text(field: &str, value: &str) -> Result<String, EducaError> {
    if value.len() > MAX_TEXT_LENGTH {
        return Err(EducaError::Validation(format!(
            "{field} length {} exceeds maximum {MAX_TEXT_LENGTH} bytes",
            value.len()
        )));
    }
    Ok(value.to_string())
}

/// A slug: ASCII letters, digits, hyphens and underscores.
pub fn slug(value: &str) -> Result<String, EducaError> {
    if value.is_empty() {
        return Err(EducaError::Validation("slug must not be empty".to_string()));
    }
    if value.len() > MAX_SLUG_LENGTH {
        return Err(EducaError::Validation(format!(
            "slug length {} exceeds maximum {MAX_SLUG_LENGTH}",
            value.len()
        )));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(EducaError::Validation(format!(
            "slug '{value}' may only contain letters, numbers, underscores or hyphens"
        )));
    }
    Ok(value.to_string())
}

/// Derive a slug from a title: lower-case, runs of other characters become one `-`.
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else if c == '_' || c == '-' || c.is_whitespace() || c.is_ascii_punctuation() {
            pending_dash = true;
        }
    }
    out.truncate(MAX_SLUG_LENGTH);
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Use the given slug, or derive one from the title.
pub fn slug_or_derive(requested: Option<&str>, title: &str) -> Result<String, EducaError> {
    match requested.map(str::trim).filter(|s| !s.is_empty()) {
        Some(given) => slug(given),
        None => {
            let derived = slugify(title);
            slug(&derived).map_err(|_| {
                EducaError::Validation(format!("cannot derive a slug from '{title}'"))
            })
        }
    }
}

/// Usernames: letters, digits and `@ . + - _`.
pub fn username(value: &str) -> Result<String, EducaError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EducaError::Validation("username must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_USERNAME_LENGTH {
        return Err(EducaError::Validation(format!(
            "username exceeds maximum {MAX_USERNAME_LENGTH} characters"
        )));
    }
    if !trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(EducaError::Validation(
            "username may only contain letters, digits and @/./+/-/_".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

pub fn password(value: &str) -> Result<(), EducaError> {
    if value.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(EducaError::Validation(format!(
            "password must contain at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if value.chars().all(|c| c.is_ascii_digit()) {
        return Err(EducaError::Validation(
            "password must not be entirely numeric".to_string(),
        ));
    }
    Ok(())
}

/// An absolute http(s) URL with a host.
pub fn url(value: &str) -> Result<String, EducaError> {
    let trimmed = value.trim();
    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .ok_or_else(|| EducaError::Validation(format!("'{trimmed}' is not an http(s) URL")))?;
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() || host.chars().any(char::is_whitespace) {
        return Err(EducaError::Validation(format!("'{trimmed}' has no valid host")));
    }
    Ok(trimmed.to_string())
}

/// A stored file reference for image and file items.
pub fn file_reference(value: &str) -> Result<String, EducaError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EducaError::Validation("file must not be empty".to_string()));
    }
    if trimmed.split('/').any(|segment| segment == "..") {
        return Err(EducaError::Validation(format!(
            "file reference '{trimmed}' must not contain '..'"
        )));
    }
    Ok(trimmed.to_string())
}

/// A chat message body.
pub fn message(value: &str) -> Result<String, EducaError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EducaError::Validation("message must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(EducaError::Validation(format!(
            "message exceeds maximum {MAX_MESSAGE_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

// =============================================================================
// TESTS
// =============================================================================

use crate::error::{CoreError, Result};

/// Normalize an email address for storage and lookup.
///
/// The domain part is case-insensitive and gets lowercased; the local part is
/// kept exactly as given.
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim();
    if email.is_empty() {
        return Err(CoreError::invalid_field(
            "email",
            "Users must have an email address.",
        ));
    }

    match email.rsplit_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
            Ok(format!("{local}@{}", domain.to_lowercase()))
        }
        _ => Err(CoreError::invalid_field("email", "Enter a valid email address.")),
    }
}

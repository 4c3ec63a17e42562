//! Small attribute checks shared by the services. Each one records its
//! failure into a [`ValidationErrors`] instead of returning early so a form
//! can show every problem at once.

use crate::error::ValidationErrors;

pub const BLANK: &str = "can't be blank";
pub const INVALID: &str = "is invalid";
pub const TAKEN: &str = "has already been taken";
pub const MIN_PASSWORD_LENGTH: usize = 6;

pub fn presence(errors: &mut ValidationErrors, field: &'static str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, BLANK);
        return false;
    }
    true
}

pub fn min_length(errors: &mut ValidationErrors, field: &'static str, value: &str, min: usize) {
    if value.chars().count() < min {
        errors.add(
            field,
            format!("is too short (minimum is {min} characters)"),
        );
    }
}

/// Loose `local@domain.tld` shape check, no whitespace allowed.
pub fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Trims and lowercases an address the way it is stored.
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

pub fn email(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if presence(errors, field, value) && !looks_like_email(value) {
        errors.add(field, INVALID);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_rejects_whitespace() {
        let mut errors = ValidationErrors::new();
        assert!(!presence(&mut errors, "content", "   \n"));
        assert_eq!(errors.messages_for("content"), vec![BLANK]);
    }

    #[test]
    fn test_email_shapes() {
        assert!(looks_like_email("alice@example.com"));
        assert!(!looks_like_email("alice@example"));
        assert!(!looks_like_email("alice example@x.com"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("a@b@example.com"));
    }

    #[test]
    fn test_min_length_message() {
        let mut errors = ValidationErrors::new();
        min_length(&mut errors, "password", "abc", MIN_PASSWORD_LENGTH);
        assert_eq!(
            errors.messages_for("password"),
            vec!["is too short (minimum is 6 characters)"]
        );
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Bob@Example.COM "), "bob@example.com");
    }
}

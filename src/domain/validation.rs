//! Full-field validation. Pure functions, no storage access.
//!
//! Runs before every insert/update. Uniqueness of usernames needs the store and is
//! checked by the repository inside its transaction.

use super::entities::Profile;
use super::errors::ValidationError;
use regex::Regex;
use std::sync::LazyLock;

pub const USERNAME_MAX: usize = 150;
pub const FIRST_NAME_MAX: usize = 150;
pub const LAST_NAME_MAX: usize = 150;
pub const EMAIL_MAX: usize = 254;
pub const BIO_MAX: usize = 500;
pub const PROFESSION_MAX: usize = 100;
pub const PHONE_MAX: usize = 17;
pub const CITY_MAX: usize = 30;

pub const PHONE_FORMAT_MESSAGE: &str =
    "Phone number must be entered in the format:'+999999999'. Up to 15 digits allowed.";
pub const BLANK_MESSAGE: &str = "This field cannot be blank.";
pub const USERNAME_TAKEN_MESSAGE: &str = "A user with that username already exists.";

// A single trailing newline passes, as it does under Python's `$`.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?0?\d{9,15}\n?$").expect("phone regex"));

/// True if `phone` has the accepted shape: optional `+`, optional leading `0`, 9 to 15 digits.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Validate every field of a profile and its account. Collects all failures.
///
/// The username is only checked for blankness and length; its character set is left open.
pub fn validate_profile(profile: &Profile) -> Result<(), ValidationError> {
    let mut errors = ValidationError::new();
    let user = &profile.user;

    if user.username.is_empty() {
        errors.add("username", BLANK_MESSAGE);
    } else {
        check_max_len(&mut errors, "username", &user.username, USERNAME_MAX);
    }
    check_max_len(&mut errors, "first_name", &user.first_name, FIRST_NAME_MAX);
    check_max_len(&mut errors, "last_name", &user.last_name, LAST_NAME_MAX);
    check_max_len(&mut errors, "email", &user.email, EMAIL_MAX);

    check_optional(&mut errors, "bio", profile.bio.as_deref(), BIO_MAX);
    check_optional(&mut errors, "profession", profile.profession.as_deref(), PROFESSION_MAX);
    check_optional(&mut errors, "city", profile.city.as_deref(), CITY_MAX);

    // Blank phone numbers are allowed and skip the format check.
    if let Some(phone) = profile.phone_number.as_deref().filter(|p| !p.is_empty()) {
        check_max_len(&mut errors, "phone_number", phone, PHONE_MAX);
        if !is_valid_phone(phone) {
            errors.add("phone_number", PHONE_FORMAT_MESSAGE);
        }
    }

    errors.into_result()
}

fn check_optional(errors: &mut ValidationError, field: &str, value: Option<&str>, max: usize) {
    if let Some(value) = value {
        check_max_len(errors, field, value, max);
    }
}

/// Lengths are counted in characters, not bytes.
fn check_max_len(errors: &mut ValidationError, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                max, len
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountType, NewProfile};

    fn draft() -> Profile {
        NewProfile::new("alice", "pw123", AccountType::Student, "Alice", "Smith")
            .phone_number("+123456789")
            .city("Paris")
            .into_draft("hash".to_string())
    }

    #[test]
    fn test_valid_profile_passes() {
        assert!(validate_profile(&draft()).is_ok());
    }

    #[test]
    fn test_phone_formats() {
        for ok in ["+123456789", "0123456789", "+0123456789012345", "123456789012345"] {
            assert!(is_valid_phone(ok), "{ok} should be accepted");
        }
        for bad in [
            "abc",
            "12345678",
            "+1234567890123456",
            "++123456789",
            "123 456 789",
            "+12345678a",
            "123456789\n\n",
            "\n123456789",
        ] {
            assert!(!is_valid_phone(bad), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_phone_tolerates_one_trailing_newline() {
        assert!(is_valid_phone("123456789\n"));
        let mut p = draft();
        p.phone_number = Some("+123456789\n".to_string());
        assert!(validate_profile(&p).is_ok());
    }

    #[test]
    fn test_invalid_phone_is_field_error() {
        let mut p = draft();
        p.phone_number = Some("abc".to_string());
        let err = validate_profile(&p).unwrap_err();
        assert_eq!(err.messages("phone_number"), [PHONE_FORMAT_MESSAGE]);
        assert_eq!(err.fields().count(), 1);
    }

    #[test]
    fn test_blank_phone_is_allowed() {
        let mut p = draft();
        p.phone_number = Some(String::new());
        assert!(validate_profile(&p).is_ok());
        p.phone_number = None;
        assert!(validate_profile(&p).is_ok());
    }

    #[test]
    fn test_max_lengths_count_chars() {
        let mut p = draft();
        p.city = Some("é".repeat(CITY_MAX));
        assert!(validate_profile(&p).is_ok());

        p.city = Some("x".repeat(CITY_MAX + 1));
        p.bio = Some("b".repeat(BIO_MAX + 1));
        p.profession = Some("p".repeat(PROFESSION_MAX));
        let err = validate_profile(&p).unwrap_err();
        assert_eq!(
            err.messages("city"),
            ["Ensure this value has at most 30 characters (it has 31)."]
        );
        assert_eq!(
            err.messages("bio"),
            ["Ensure this value has at most 500 characters (it has 501)."]
        );
        assert!(!err.has_field("profession"));
    }

    #[test]
    fn test_username_rules() {
        let mut p = draft();
        p.user.username = String::new();
        assert_eq!(
            validate_profile(&p).unwrap_err().messages("username"),
            [BLANK_MESSAGE]
        );

        p.user.username = "u".repeat(USERNAME_MAX + 1);
        assert_eq!(
            validate_profile(&p).unwrap_err().messages("username"),
            ["Ensure this value has at most 150 characters (it has 151)."]
        );

        for free_form in ["john doe", "bad name!", "ok.user+tag@site-1_x"] {
            p.user.username = free_form.to_string();
            assert!(validate_profile(&p).is_ok(), "{free_form} should be accepted");
        }
    }

    #[test]
    fn test_collects_every_failing_field() {
        let mut p = draft();
        p.phone_number = Some("123".to_string());
        p.user.first_name = "f".repeat(FIRST_NAME_MAX + 1);
        p.user.email = format!("{}@x.io", "e".repeat(EMAIL_MAX));
        let err = validate_profile(&p).unwrap_err();
        let fields: Vec<&str> = err.fields().map(|(f, _)| f).collect();
        assert_eq!(fields, ["email", "first_name", "phone_number"]);
    }
}

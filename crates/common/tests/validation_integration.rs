//! Integration tests for validation module
//!
//! Mirrors the sign-in form checks the session layer runs before any
//! network call.

use clearhold_common::validation::{EmailValidator, StringValidator, Validator};

/// Email/password form with both fields valid
#[test]
fn test_sign_in_form_accepts_valid_input() {
    let result = Validator::new()
        .check("email", "ada@example.com", &EmailValidator::new())
        .check("password", "correct horse", &StringValidator::new().not_empty())
        .finish();

    assert!(result.is_ok());
}

/// Every failing field is reported, not just the first
#[test]
fn test_sign_in_form_reports_each_field() {
    let err = Validator::new()
        .check("email", "ada@", &EmailValidator::new())
        .check("password", "", &StringValidator::new().not_empty())
        .finish()
        .unwrap_err();

    let fields: Vec<&str> = err.errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["email", "password"]);
    assert!(err.to_string().starts_with("2 fields invalid"));
}

/// Surrounding whitespace is tolerated in emails
#[test]
fn test_email_with_whitespace() {
    let result = Validator::new().check("email", "  ada@example.com ", &EmailValidator).finish();
    assert!(result.is_ok());
}

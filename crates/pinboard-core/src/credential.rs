//! Password policy and Argon2id password hashing.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{CoreError, Result};
use crate::validation::FieldErrors;

/// Minimum password length in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Message reported for any password that fails the policy.
pub const PASSWORD_POLICY_MESSAGE: &str =
    "Password must be at least 8 characters long, contain at least one digit";

/// Check the password policy: at least 8 characters, at least one letter
/// and at least one digit.
pub fn password_meets_policy(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(char::is_alphabetic)
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Record the policy message under `password` when the policy is not met.
pub fn check_password(errors: &mut FieldErrors, password: &str) {
    if !password_meets_policy(password) {
        errors.add("password", PASSWORD_POLICY_MESSAGE);
    }
}

/// Hash a password using Argon2id. Returns a PHC-format string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CoreError::PasswordHash(e.to_string()))
}

/// Verify a password against a PHC-format hash string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| CoreError::MalformedHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_policy_examples() {
        assert!(password_meets_policy("Password1"));
        assert!(!password_meets_policy("pww"));
        assert!(!password_meets_policy("password"));
        assert!(!password_meets_policy("12345678"));
        assert!(!password_meets_policy("Pass1"));
    }

    #[test]
    fn test_check_password_message() {
        let mut errors = FieldErrors::new();
        check_password(&mut errors, "pww");
        assert_eq!(
            errors.get("password"),
            Some(&[PASSWORD_POLICY_MESSAGE.to_string()][..])
        );
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Password1").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Password1", &hash).unwrap());
        assert!(!verify_password("Password2", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(matches!(
            verify_password("Password1", "not-a-hash"),
            Err(CoreError::MalformedHash(_))
        ));
    }

    proptest! {
        #[test]
        fn short_passwords_always_fail(pw in "[a-z0-9]{0,7}") {
            prop_assert!(!password_meets_policy(&pw));
        }

        #[test]
        fn letter_digit_padding_always_passes(letters in "[a-zA-Z]{4,10}", digits in "[0-9]{4,10}") {
            let pw = format!("{}{}", letters, digits);
            prop_assert!(password_meets_policy(&pw));
        }
    }
}

//! Proptest generators for property-based testing.

use std::collections::BTreeSet;

use proptest::prelude::*;

/// Generate a username that passes validation.
pub fn username() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{2,19}".prop_map(String::from)
}

/// Generate a password that meets the policy.
pub fn valid_password() -> impl Strategy<Value = String> {
    ("[a-zA-Z]{7,12}", "[0-9]{1,4}", "[a-zA-Z0-9]{0,8}")
        .prop_map(|(letters, digits, rest)| format!("{}{}{}", letters, digits, rest))
}

/// Generate a password that fails the policy: too short, no digit or no
/// letter.
pub fn weak_password() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9]{0,7}",
        "[a-zA-Z]{8,16}",
        "[0-9]{8,16}",
    ]
    .prop_map(String::from)
}

/// Generate a non-blank title within the default length limit.
pub fn title() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 ]{0,40}".prop_map(String::from)
}

/// Generate a set of raw primary keys.
pub fn id_set(max_len: usize) -> impl Strategy<Value = BTreeSet<i64>> {
    prop::collection::btree_set(1i64..10_000, 0..=max_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinboard_core::{
        password_meets_policy, FieldErrors, FieldLimits, NewBoard, MIN_PASSWORD_LEN,
    };

    proptest! {
        #[test]
        fn test_valid_passwords_meet_policy(password in valid_password()) {
            prop_assert!(password_meets_policy(&password));
        }

        #[test]
        fn test_valid_passwords_reach_minimum_length(password in valid_password()) {
            prop_assert!(password.len() >= MIN_PASSWORD_LEN);
        }

        #[test]
        fn test_weak_passwords_fail_policy(password in weak_password()) {
            prop_assert!(!password_meets_policy(&password));
        }

        #[test]
        fn test_usernames_validate(name in username()) {
            let mut errors = FieldErrors::new();
            FieldLimits::default().check_username(&mut errors, &name);
            prop_assert!(errors.is_empty());
        }

        #[test]
        fn test_titles_validate(title in title()) {
            let board = NewBoard { title, description: String::new() };
            prop_assert!(FieldLimits::default().validate_new_board(&board).is_ok());
        }
    }
}

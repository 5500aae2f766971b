//! Field-level validation for entity payloads.
//!
//! Validation never stops at the first problem: every offending field is
//! collected into [`FieldErrors`], keyed by field name, so callers can report
//! them all at once.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{BoardUpdate, NewBoard, NewSection, NewSticker, SectionUpdate, StickerUpdate};

/// Field-keyed validation messages, e.g. `{"password": ["..."]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Create an empty set of errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set holding a single message.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Whether no errors were recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for a field.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Iterate over `(field, messages)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Turn into `Err(self)` when anything was recorded.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{}: {}", field, messages.join(", "))?;
        }
        Ok(())
    }
}

/// Length limits applied to text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLimits {
    pub max_title_len: usize,
    pub max_description_len: usize,
    pub max_sticker_text_len: usize,
    pub max_username_len: usize,
}

impl Default for FieldLimits {
    fn default() -> Self {
        Self {
            max_title_len: 100,
            max_description_len: 1000,
            max_sticker_text_len: 2000,
            max_username_len: 150,
        }
    }
}

impl FieldLimits {
    fn check_title(&self, errors: &mut FieldErrors, title: &str) {
        if title.trim().is_empty() {
            errors.add("title", "This field may not be blank.");
        } else if title.chars().count() > self.max_title_len {
            errors.add(
                "title",
                format!("Ensure this field has no more than {} characters.", self.max_title_len),
            );
        }
    }

    fn check_bounded(&self, errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            errors.add(
                field,
                format!("Ensure this field has no more than {} characters.", max),
            );
        }
    }

    /// Validate a username for registration or admin creation.
    pub fn check_username(&self, errors: &mut FieldErrors, username: &str) {
        if username.trim().is_empty() {
            errors.add("username", "This field may not be blank.");
        } else if username.chars().count() > self.max_username_len {
            errors.add(
                "username",
                format!(
                    "Ensure this field has no more than {} characters.",
                    self.max_username_len
                ),
            );
        } else if username.chars().any(char::is_whitespace) {
            errors.add("username", "Username may not contain whitespace.");
        }
    }

    pub fn validate_new_board(&self, board: &NewBoard) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        self.check_title(&mut errors, &board.title);
        self.check_bounded(&mut errors, "description", &board.description, self.max_description_len);
        errors.into_result()
    }

    pub fn validate_board_update(&self, update: &BoardUpdate) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Some(title) = &update.title {
            self.check_title(&mut errors, title);
        }
        if let Some(description) = &update.description {
            self.check_bounded(&mut errors, "description", description, self.max_description_len);
        }
        errors.into_result()
    }

    pub fn validate_new_section(&self, section: &NewSection) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        self.check_title(&mut errors, &section.title);
        self.check_bounded(&mut errors, "description", &section.description, self.max_description_len);
        errors.into_result()
    }

    pub fn validate_section_update(&self, update: &SectionUpdate) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Some(title) = &update.title {
            self.check_title(&mut errors, title);
        }
        if let Some(description) = &update.description {
            self.check_bounded(&mut errors, "description", description, self.max_description_len);
        }
        errors.into_result()
    }

    pub fn validate_new_sticker(&self, sticker: &NewSticker) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        self.check_title(&mut errors, &sticker.title);
        self.check_bounded(&mut errors, "text", &sticker.text, self.max_sticker_text_len);
        errors.into_result()
    }

    pub fn validate_sticker_update(&self, update: &StickerUpdate) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Some(title) = &update.title {
            self.check_title(&mut errors, title);
        }
        if let Some(text) = &update.text {
            self.check_bounded(&mut errors, "text", text, self.max_sticker_text_len);
        }
        errors.into_result()
    }
}

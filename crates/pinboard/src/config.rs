//! Service configuration.

use pinboard_core::{FieldLimits, INVITE_TOKEN_LEN};
use serde::{Deserialize, Serialize};

/// Configuration for the Pinboard service.
///
/// Every field has a default, so a partial JSON document such as
/// `{"max_title_len": 80}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinboardConfig {
    /// Text field length limits.
    #[serde(flatten)]
    pub limits: FieldLimits,
    /// Length of generated invite tokens, in characters.
    pub invite_token_len: usize,
    /// How many fresh tokens to try when a generated one collides.
    pub invite_rotation_attempts: u32,
}

impl Default for PinboardConfig {
    fn default() -> Self {
        Self {
            limits: FieldLimits::default(),
            invite_token_len: INVITE_TOKEN_LEN,
            invite_rotation_attempts: 3,
        }
    }
}

impl PinboardConfig {
    /// Parse a configuration from JSON, filling in defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

//! Opaque tokens: board invite tokens and user bearer tokens.
//!
//! Both are drawn from the thread-local CSPRNG. Invite tokens are stored as
//! is (they are looked up by value); bearer tokens are only ever stored as a
//! Blake3 digest so a leaked database does not leak live sessions.

use std::fmt;

use rand::distributions::Alphanumeric;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// Default invite token length in characters (~190 bits of entropy).
pub const INVITE_TOKEN_LEN: usize = 32;

/// Bearer token length in random bytes (hex-encoded on the wire).
pub const BEARER_TOKEN_BYTES: usize = 20;

/// A board invite token: an unguessable capability for joining a board.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InviteToken(String);

impl InviteToken {
    /// Generate a fresh random token of `len` alphanumeric characters.
    pub fn generate(len: usize) -> Self {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect();
        Self(token)
    }

    /// Wrap an existing token value (e.g. one taken from a request path).
    pub fn from_string(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the token value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for InviteToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Capabilities stay out of logs.
        write!(f, "InviteToken(..{})", self.0.len())
    }
}

impl fmt::Display for InviteToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bearer token handed to a client after login.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Generate a fresh random bearer token.
    pub fn generate() -> Self {
        let mut bytes = [0u8; BEARER_TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Wrap a token presented by a client.
    pub fn from_string(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the token value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compute the digest under which this token is stored.
    pub fn digest(&self) -> TokenDigest {
        TokenDigest(*blake3::hash(self.0.as_bytes()).as_bytes())
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(..)")
    }
}

/// Blake3 digest of a bearer token.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenDigest(pub [u8; 32]);

impl TokenDigest {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for TokenDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenDigest({})", &hex::encode(self.0)[..16])
    }
}

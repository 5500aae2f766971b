//! Registration, login and bearer-token authentication.
//!
//! A login issues a random bearer token and stores only its Blake3 digest,
//! replacing whatever session the user had before. Requests present the token
//! as `Authorization: Token <key>` (or `Bearer <key>`).

use pinboard_core::{
    check_password, hash_password, verify_password, BearerToken, FieldErrors, NewUser, User,
};
use pinboard_perms::Actor;
use pinboard_store::Store;

use crate::error::{PinboardError, Result, INVALID_TOKEN};
use crate::service::{require_user, Pinboard};

/// Strip the scheme from an `Authorization` header value.
///
/// Returns `None` for a scheme other than `Token`/`Bearer` or an empty key.
pub fn parse_authorization(header: &str) -> Option<&str> {
    let (scheme, key) = header.trim().split_once(' ')?;
    let key = key.trim();
    let known = scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer");
    (known && !key.is_empty()).then_some(key)
}

impl<S: Store> Pinboard<S> {
    /// Self-registration. Creates a regular (non-admin) user.
    pub async fn register(&self, username: &str, password: &str) -> Result<User> {
        let user = self.insert_user(username, password, false).await?;
        tracing::info!(user = user.id.get(), "user registered");
        Ok(user)
    }

    /// Exchange credentials for a new bearer token.
    ///
    /// Unknown usernames and wrong passwords fail identically.
    pub async fn login(&self, username: &str, password: &str) -> Result<BearerToken> {
        let Some(user) = self.store.find_user_by_username(username).await? else {
            tracing::debug!("login for unknown username");
            return Err(PinboardError::InvalidCredentials);
        };
        if !verify_password(password, &user.password_hash)? {
            tracing::debug!(user = user.id.get(), "login with wrong password");
            return Err(PinboardError::InvalidCredentials);
        }

        let token = BearerToken::generate();
        self.store.put_session(user.id, &token.digest()).await?;
        tracing::debug!(user = user.id.get(), "session issued");
        Ok(token)
    }

    /// Revoke the actor's bearer token.
    pub async fn logout(&self, actor: &Actor) -> Result<()> {
        let me = require_user(actor)?;
        self.store.delete_session(me).await?;
        tracing::debug!(user = me.get(), "session revoked");
        Ok(())
    }

    /// Resolve the actor behind an `Authorization` header.
    ///
    /// No header means anonymous. A header that does not resolve to a live
    /// session is an error, never a silent downgrade to anonymous.
    pub async fn authenticate(&self, header: Option<&str>) -> Result<Actor> {
        let Some(header) = header else {
            return Ok(Actor::Anonymous);
        };
        let key = parse_authorization(header).ok_or(PinboardError::Unauthenticated(INVALID_TOKEN))?;
        let digest = BearerToken::from_string(key).digest();

        let Some(id) = self.store.find_session(&digest).await? else {
            return Err(PinboardError::Unauthenticated(INVALID_TOKEN));
        };
        let user = self
            .store
            .get_user(id)
            .await?
            .ok_or(PinboardError::Unauthenticated(INVALID_TOKEN))?;
        Ok(Actor::from(&user))
    }

    /// Validate, hash and store a new user.
    pub(crate) async fn insert_user(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<User> {
        let mut errors = FieldErrors::new();
        self.config.limits.check_username(&mut errors, username);
        check_password(&mut errors, password);
        errors.into_result().map_err(PinboardError::Validation)?;

        let user = NewUser {
            username: username.to_string(),
            password_hash: hash_password(password)?,
            is_admin,
        };
        Ok(self.store.insert_user(&user).await?)
    }
}

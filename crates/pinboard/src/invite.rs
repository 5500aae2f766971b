//! Invite-token redemption.
//!
//! Every board holds exactly one live invite token. Redeeming it as a new
//! collaborator adds the redeemer to the board's members and replaces the
//! token in the same atomic store operation, so a token admits one new member
//! at most. Redeeming as someone already on the roster changes nothing.

use pinboard_core::{BoardId, InviteToken, ResourceRef};
use pinboard_perms::Actor;
use pinboard_store::{RedeemResult, Store, StoreError};

use crate::error::{PinboardError, Result, LOGIN_REQUIRED};
use crate::service::Pinboard;

impl<S: Store> Pinboard<S> {
    /// Redeem an invite token, returning the board joined.
    ///
    /// Checks run in this order:
    /// 1. no board holds the token: `InviteNotFound`
    /// 2. anonymous actor: `Unauthenticated`
    /// 3. actor already owner or member: no change
    /// 4. otherwise join and rotate; losing a concurrent rotation reports
    ///    the token as not found
    pub async fn redeem_invite(&self, actor: &Actor, token: &InviteToken) -> Result<BoardId> {
        let Some(board) = self.store.find_board_by_invite(token).await? else {
            tracing::debug!("invite token does not exist");
            return Err(PinboardError::InviteNotFound);
        };
        let Some(user) = actor.id() else {
            tracing::debug!(board = board.id.get(), "anonymous invite redemption refused");
            return Err(PinboardError::Unauthenticated(LOGIN_REQUIRED));
        };

        let mut collision = None;
        for _ in 0..self.config.invite_rotation_attempts.max(1) {
            let next = self.fresh_invite_token();
            match self.store.redeem_invite(board.id, token, user, &next).await {
                Ok(RedeemResult::Joined) => {
                    tracing::info!(
                        board = board.id.get(),
                        user = user.get(),
                        "joined board by invite, token rotated"
                    );
                    return Ok(board.id);
                }
                Ok(RedeemResult::AlreadyMember) => {
                    tracing::debug!(
                        board = board.id.get(),
                        user = user.get(),
                        "invite redeemed by existing member"
                    );
                    return Ok(board.id);
                }
                Ok(RedeemResult::Stale) => {
                    tracing::warn!(
                        board = board.id.get(),
                        user = user.get(),
                        "invite token rotated by a concurrent redemption"
                    );
                    return Err(PinboardError::InviteNotFound);
                }
                Err(StoreError::NotFound(ResourceRef::Board(_))) => {
                    return Err(PinboardError::InviteNotFound);
                }
                Err(StoreError::InviteTokenTaken(taken)) => collision = Some(taken),
                Err(e) => return Err(e.into()),
            }
        }
        Err(self.token_exhausted(collision))
    }
}

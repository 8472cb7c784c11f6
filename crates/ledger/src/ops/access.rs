use sea_orm::{ConnectionTrait, prelude::*};

use crate::{Caller, LedgerError, ResultLedger, users};

use super::Ledger;

impl Ledger {
    /// Admin-only gate for amend/remove/reconcile.
    pub(super) fn require_admin(&self, caller: &Caller) -> ResultLedger<()> {
        if !caller.role.is_admin() {
            return Err(LedgerError::Forbidden(
                "administrator role required".to_string(),
            ));
        }
        Ok(())
    }

    /// Callers may touch their own ledger; admins may touch anyone's.
    pub(super) fn require_self_or_admin(&self, caller: &Caller, owner_id: i64) -> ResultLedger<()> {
        if caller.user_id != owner_id && !caller.role.is_admin() {
            return Err(LedgerError::Forbidden(
                "cannot access another user's ledger".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolves an owner to an active account.
    pub(super) async fn require_owner<C>(
        &self,
        db: &C,
        owner_id: i64,
    ) -> ResultLedger<users::Model>
    where
        C: ConnectionTrait,
    {
        let user = users::Entity::find_by_id(owner_id)
            .one(db)
            .await?
            .ok_or_else(|| LedgerError::NotFound("user not exists".to_string()))?;
        if !user.is_active {
            return Err(LedgerError::NotFound("user not exists".to_string()));
        }
        Ok(user)
    }
}

use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::addon_credits::{AddOnCreditEntity, InsertAddOnCreditEntity};
use crate::domain::value_objects::credit_kinds::CreditKind;

#[automock]
#[async_trait]
pub trait AddOnCreditRepository {
    /// Every credit row the user owns, including fully consumed ones; those
    /// still contribute to historical totals in the entitlement view.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<AddOnCreditEntity>>;

    /// Rows of one kind with `quantity_remaining > 0`, oldest purchase first.
    async fn list_available(
        &self,
        user_id: Uuid,
        kind: CreditKind,
    ) -> Result<Vec<AddOnCreditEntity>>;

    async fn create_credit(&self, insert: InsertAddOnCreditEntity) -> Result<Uuid>;

    /// Conditional decrement by one: applies only if `quantity_remaining`
    /// still equals `observed_remaining`. Returns false on a lost race.
    async fn decrement_remaining_if_unchanged(
        &self,
        credit_id: Uuid,
        observed_remaining: i32,
    ) -> Result<bool>;
}

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscriptions::{InsertSubscriptionEntity, SubscriptionEntity};
use crate::domain::value_objects::{credit_kinds::CreditKind, sort_order::SortOrder};

#[automock]
#[async_trait]
pub trait SubscriptionRepository {
    /// Subscriptions with status `active` and `end_date > now`, ordered by
    /// creation time. The ledger reads newest-first for metadata; the
    /// consumption engine reads oldest-first so the earliest purchase is
    /// spent first.
    async fn list_active_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        order: SortOrder,
    ) -> Result<Vec<SubscriptionEntity>>;

    async fn create_subscription(&self, insert: InsertSubscriptionEntity) -> Result<Uuid>;

    /// Conditional increment of the `used` counter for one kind: applies only
    /// if the counter still equals `observed_used`. Returns false when a
    /// concurrent consumer won the race.
    async fn increment_used_if_unchanged(
        &self,
        subscription_id: Uuid,
        kind: CreditKind,
        observed_used: i32,
    ) -> Result<bool>;

    /// Whether the user has ever held a subscription for the given plan,
    /// active or not. Gate for one-shot activations like the free trial.
    async fn exists_for_plan(&self, user_id: Uuid, plan_id: &str) -> Result<bool>;
}

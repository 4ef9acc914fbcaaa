use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::subscriptions::{InsertSubscriptionEntity, SubscriptionEntity},
        repositories::subscriptions::SubscriptionRepository,
        value_objects::{
            credit_kinds::CreditKind, sort_order::SortOrder,
            subscription_statuses::SubscriptionStatus,
        },
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::subscriptions},
};

pub struct SubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionPostgres {
    async fn list_active_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        order: SortOrder,
    ) -> Result<Vec<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let query = subscriptions::table
            .filter(subscriptions::user_id.eq(user_id))
            .filter(subscriptions::status.eq(SubscriptionStatus::Active.to_string()))
            .filter(subscriptions::end_date.gt(now))
            .into_boxed();

        let query = match order {
            SortOrder::Asc => query.order(subscriptions::created_at.asc()),
            SortOrder::Desc => query.order(subscriptions::created_at.desc()),
        };

        let results = query
            .select(SubscriptionEntity::as_select())
            .load::<SubscriptionEntity>(&mut conn)?;

        Ok(results)
    }

    async fn create_subscription(&self, insert: InsertSubscriptionEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(subscriptions::table)
            .values(&insert)
            .returning(subscriptions::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(result)
    }

    async fn increment_used_if_unchanged(
        &self,
        subscription_id: Uuid,
        kind: CreditKind,
        observed_used: i32,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // The filter on the observed counter value makes the increment a
        // compare-and-set: a concurrent consumer that already bumped the
        // counter leaves this update matching zero rows.
        let affected = match kind {
            CreditKind::Optimization => update(subscriptions::table)
                .filter(subscriptions::id.eq(subscription_id))
                .filter(subscriptions::optimizations_used.eq(observed_used))
                .set((
                    subscriptions::optimizations_used.eq(observed_used + 1),
                    subscriptions::updated_at.eq(Utc::now()),
                ))
                .execute(&mut conn)?,
            CreditKind::ScoreCheck => update(subscriptions::table)
                .filter(subscriptions::id.eq(subscription_id))
                .filter(subscriptions::score_checks_used.eq(observed_used))
                .set((
                    subscriptions::score_checks_used.eq(observed_used + 1),
                    subscriptions::updated_at.eq(Utc::now()),
                ))
                .execute(&mut conn)?,
            CreditKind::LinkedinMessages => update(subscriptions::table)
                .filter(subscriptions::id.eq(subscription_id))
                .filter(subscriptions::linkedin_messages_used.eq(observed_used))
                .set((
                    subscriptions::linkedin_messages_used.eq(observed_used + 1),
                    subscriptions::updated_at.eq(Utc::now()),
                ))
                .execute(&mut conn)?,
            CreditKind::GuidedBuild => update(subscriptions::table)
                .filter(subscriptions::id.eq(subscription_id))
                .filter(subscriptions::guided_builds_used.eq(observed_used))
                .set((
                    subscriptions::guided_builds_used.eq(observed_used + 1),
                    subscriptions::updated_at.eq(Utc::now()),
                ))
                .execute(&mut conn)?,
        };

        Ok(affected == 1)
    }

    async fn exists_for_plan(&self, user_id: Uuid, plan_id: &str) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let existing = subscriptions::table
            .filter(subscriptions::user_id.eq(user_id))
            .filter(subscriptions::plan_id.eq(plan_id))
            .select(subscriptions::id)
            .first::<Uuid>(&mut conn)
            .optional()?;

        Ok(existing.is_some())
    }
}

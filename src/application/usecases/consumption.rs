use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::usecases::entitlements::EntitlementUseCase;
use crate::domain::{
    repositories::{
        addon_credits::AddOnCreditRepository, subscriptions::SubscriptionRepository,
    },
    value_objects::{credit_kinds::CreditKind, sort_order::SortOrder},
};

/// Bounded re-fetch attempts before a persistent lost race surfaces as a
/// transient conflict instead of "exhausted".
const MAX_CONSUME_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum ConsumptionError {
    #[error("credits exhausted")]
    CreditsExhausted,
    #[error("credit update conflicted, try again")]
    Conflict,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ConsumptionError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            ConsumptionError::CreditsExhausted => StatusCode::PAYMENT_REQUIRED,
            ConsumptionError::Conflict => StatusCode::CONFLICT,
            ConsumptionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type ConsumptionResult<T> = std::result::Result<T, ConsumptionError>;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConsumeOutcome {
    /// Fresh combined remaining count for the kind, re-aggregated after the
    /// debit landed.
    pub remaining: i64,
}

/// Atomically debits one unit of a credit kind. Policy: add-on credits before
/// subscription allotments, oldest row first within each tier, one row-level
/// compare-and-swap per attempt. Promotional one-off purchases are spent
/// before eating into a broader plan.
pub struct ConsumptionUseCase<S, A>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    A: AddOnCreditRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    addon_credit_repo: Arc<A>,
    entitlement_usecase: Arc<EntitlementUseCase<S, A>>,
}

impl<S, A> ConsumptionUseCase<S, A>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    A: AddOnCreditRepository + Send + Sync + 'static,
{
    pub fn new(
        subscription_repo: Arc<S>,
        addon_credit_repo: Arc<A>,
        entitlement_usecase: Arc<EntitlementUseCase<S, A>>,
    ) -> Self {
        Self {
            subscription_repo,
            addon_credit_repo,
            entitlement_usecase,
        }
    }

    pub async fn consume(
        &self,
        user_id: Uuid,
        kind: CreditKind,
    ) -> ConsumptionResult<ConsumeOutcome> {
        for attempt in 1..=MAX_CONSUME_ATTEMPTS {
            let mut lost_race = false;

            let credits = self
                .addon_credit_repo
                .list_available(user_id, kind)
                .await
                .map_err(ConsumptionError::Internal)?;

            for credit in &credits {
                let applied = self
                    .addon_credit_repo
                    .decrement_remaining_if_unchanged(credit.id, credit.quantity_remaining)
                    .await
                    .map_err(ConsumptionError::Internal)?;

                if applied {
                    info!(
                        %user_id,
                        kind = %kind,
                        credit_id = %credit.id,
                        "consumption: debited add-on credit"
                    );
                    return self.outcome(user_id, kind).await;
                }

                debug!(
                    %user_id,
                    kind = %kind,
                    credit_id = %credit.id,
                    attempt,
                    "consumption: lost race on add-on credit row"
                );
                lost_race = true;
            }

            let subscriptions = self
                .subscription_repo
                .list_active_for_user(user_id, Utc::now(), SortOrder::Asc)
                .await
                .map_err(ConsumptionError::Internal)?;

            for subscription in &subscriptions {
                if !subscription.has_headroom(kind) {
                    continue;
                }
                let (used, _) = subscription.allotment(kind);
                let applied = self
                    .subscription_repo
                    .increment_used_if_unchanged(subscription.id, kind, used)
                    .await
                    .map_err(ConsumptionError::Internal)?;

                if applied {
                    info!(
                        %user_id,
                        kind = %kind,
                        subscription_id = %subscription.id,
                        "consumption: debited subscription allotment"
                    );
                    return self.outcome(user_id, kind).await;
                }

                debug!(
                    %user_id,
                    kind = %kind,
                    subscription_id = %subscription.id,
                    attempt,
                    "consumption: lost race on subscription row"
                );
                lost_race = true;
            }

            if !lost_race {
                warn!(%user_id, kind = %kind, "consumption: no headroom in any row");
                return Err(ConsumptionError::CreditsExhausted);
            }
            // Someone else moved the counters; re-fetch and try the next
            // candidate rows.
        }

        warn!(
            %user_id,
            kind = %kind,
            attempts = MAX_CONSUME_ATTEMPTS,
            "consumption: retries exhausted under contention"
        );
        Err(ConsumptionError::Conflict)
    }

    async fn outcome(
        &self,
        user_id: Uuid,
        kind: CreditKind,
    ) -> ConsumptionResult<ConsumeOutcome> {
        let remaining = self
            .entitlement_usecase
            .get_entitlement(user_id)
            .await
            .map_err(|err| ConsumptionError::Internal(anyhow::Error::new(err)))?
            .map(|entitlement| entitlement.balance(kind).remaining())
            .unwrap_or(0);

        Ok(ConsumeOutcome { remaining })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        entities::{
            addon_credits::{AddOnCreditEntity, InsertAddOnCreditEntity},
            subscriptions::{InsertSubscriptionEntity, SubscriptionEntity},
        },
        repositories::{
            addon_credits::MockAddOnCreditRepository,
            subscriptions::MockSubscriptionRepository,
        },
        value_objects::subscription_statuses::SubscriptionStatus,
    };
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration};
    use mockall::predicate::eq;
    use std::sync::Mutex;

    fn subscription(
        user_id: Uuid,
        created_at: DateTime<Utc>,
        used: i32,
        total: i32,
    ) -> SubscriptionEntity {
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id,
            plan_id: "lite_check".to_string(),
            status: SubscriptionStatus::Active.to_string(),
            start_date: created_at,
            end_date: created_at + Duration::days(7),
            optimizations_used: used,
            optimizations_total: total,
            score_checks_used: 0,
            score_checks_total: 0,
            linkedin_messages_used: 0,
            linkedin_messages_total: 0,
            guided_builds_used: 0,
            guided_builds_total: 0,
            payment_id: None,
            coupon_used: None,
            created_at,
            updated_at: created_at,
        }
    }

    fn credit(user_id: Uuid, created_at: DateTime<Utc>, remaining: i32) -> AddOnCreditEntity {
        AddOnCreditEntity {
            id: Uuid::new_v4(),
            user_id,
            credit_kind: CreditKind::Optimization.to_string(),
            quantity_purchased: remaining,
            quantity_remaining: remaining,
            payment_transaction_id: Uuid::new_v4(),
            created_at,
            updated_at: created_at,
        }
    }

    fn usecase(
        subscription_repo: MockSubscriptionRepository,
        addon_repo: MockAddOnCreditRepository,
    ) -> ConsumptionUseCase<MockSubscriptionRepository, MockAddOnCreditRepository> {
        let subscription_repo = Arc::new(subscription_repo);
        let addon_repo = Arc::new(addon_repo);
        let entitlements = Arc::new(EntitlementUseCase::new(
            Arc::clone(&subscription_repo),
            Arc::clone(&addon_repo),
        ));
        ConsumptionUseCase::new(subscription_repo, addon_repo, entitlements)
    }

    #[tokio::test]
    async fn addon_credit_is_debited_before_subscription() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let addon = credit(user_id, now, 1);
        let addon_id = addon.id;
        let sub = subscription(user_id, now, 0, 5);

        let mut addon_repo = MockAddOnCreditRepository::new();
        let listed = addon.clone();
        addon_repo
            .expect_list_available()
            .returning(move |_, _| {
                let listed = listed.clone();
                Ok(vec![listed])
            });
        addon_repo
            .expect_decrement_remaining_if_unchanged()
            .with(eq(addon_id), eq(1))
            .times(1)
            .returning(|_, _| Ok(true));
        // Re-aggregation after the debit.
        let drained = AddOnCreditEntity {
            quantity_remaining: 0,
            ..addon.clone()
        };
        addon_repo.expect_list_for_user().returning(move |_| {
            let drained = drained.clone();
            Ok(vec![drained])
        });

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_increment_used_if_unchanged()
            .times(0);
        subscription_repo
            .expect_list_active_for_user()
            .returning(move |_, _, _| {
                let sub = sub.clone();
                Ok(vec![sub])
            });

        let outcome = usecase(subscription_repo, addon_repo)
            .consume(user_id, CreditKind::Optimization)
            .await
            .unwrap();

        // 1 add-on (now spent) + 5 subscription credits remaining.
        assert_eq!(outcome.remaining, 5);
    }

    #[tokio::test]
    async fn oldest_addon_credit_is_debited_first() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let older = credit(user_id, now - Duration::days(3), 2);
        let newer = credit(user_id, now, 4);
        let older_id = older.id;

        let mut addon_repo = MockAddOnCreditRepository::new();
        let listed = vec![older.clone(), newer.clone()];
        addon_repo
            .expect_list_available()
            .returning(move |_, _| {
                let listed = listed.clone();
                Ok(listed)
            });
        addon_repo
            .expect_decrement_remaining_if_unchanged()
            .with(eq(older_id), eq(2))
            .times(1)
            .returning(|_, _| Ok(true));
        let after = vec![
            AddOnCreditEntity {
                quantity_remaining: 1,
                ..older
            },
            newer,
        ];
        addon_repo.expect_list_for_user().returning(move |_| {
            let after = after.clone();
            Ok(after)
        });

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_list_active_for_user()
            .returning(|_, _, _| Ok(Vec::new()));

        let outcome = usecase(subscription_repo, addon_repo)
            .consume(user_id, CreditKind::Optimization)
            .await
            .unwrap();

        assert_eq!(outcome.remaining, 5);
    }

    #[tokio::test]
    async fn falls_back_to_oldest_subscription_with_headroom() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let exhausted = subscription(user_id, now - Duration::days(10), 5, 5);
        let open = subscription(user_id, now - Duration::days(2), 1, 10);
        let open_id = open.id;

        let mut addon_repo = MockAddOnCreditRepository::new();
        addon_repo
            .expect_list_available()
            .returning(|_, _| Ok(Vec::new()));
        addon_repo
            .expect_list_for_user()
            .returning(|_| Ok(Vec::new()));

        let mut subscription_repo = MockSubscriptionRepository::new();
        let oldest_first = vec![exhausted.clone(), open.clone()];
        let after = vec![
            exhausted,
            SubscriptionEntity {
                optimizations_used: 2,
                ..open
            },
        ];
        subscription_repo
            .expect_list_active_for_user()
            .returning(move |_, _, order| {
                let rows = match order {
                    SortOrder::Asc => oldest_first.clone(),
                    SortOrder::Desc => after.iter().rev().cloned().collect(),
                };
                Ok(rows)
            });
        subscription_repo
            .expect_increment_used_if_unchanged()
            .with(eq(open_id), eq(CreditKind::Optimization), eq(1))
            .times(1)
            .returning(|_, _, _| Ok(true));

        let outcome = usecase(subscription_repo, addon_repo)
            .consume(user_id, CreditKind::Optimization)
            .await
            .unwrap();

        // (5-5) + (10-2) after the increment.
        assert_eq!(outcome.remaining, 8);
    }

    #[tokio::test]
    async fn exhausted_rows_fail_without_mutation() {
        let user_id = Uuid::new_v4();
        let full = subscription(user_id, Utc::now(), 2, 2);

        let mut addon_repo = MockAddOnCreditRepository::new();
        addon_repo
            .expect_list_available()
            .returning(|_, _| Ok(Vec::new()));
        addon_repo
            .expect_decrement_remaining_if_unchanged()
            .times(0);

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_list_active_for_user()
            .returning(move |_, _, _| {
                let full = full.clone();
                Ok(vec![full])
            });
        subscription_repo
            .expect_increment_used_if_unchanged()
            .times(0);

        let result = usecase(subscription_repo, addon_repo)
            .consume(user_id, CreditKind::Optimization)
            .await;

        assert!(matches!(result, Err(ConsumptionError::CreditsExhausted)));
    }

    #[tokio::test]
    async fn lost_race_retries_and_surfaces_conflict_after_bound() {
        let user_id = Uuid::new_v4();
        let contended = credit(user_id, Utc::now(), 3);

        let mut addon_repo = MockAddOnCreditRepository::new();
        let listed = contended.clone();
        addon_repo
            .expect_list_available()
            .times(3)
            .returning(move |_, _| {
                let listed = listed.clone();
                Ok(vec![listed])
            });
        // Every CAS loses.
        addon_repo
            .expect_decrement_remaining_if_unchanged()
            .times(3)
            .returning(|_, _| Ok(false));

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_list_active_for_user()
            .returning(|_, _, _| Ok(Vec::new()));

        let result = usecase(subscription_repo, addon_repo)
            .consume(user_id, CreditKind::Optimization)
            .await;

        assert!(matches!(result, Err(ConsumptionError::Conflict)));
    }

    // In-memory store with a genuinely atomic compare-and-swap, for the
    // concurrency properties that mocks cannot express.
    struct InMemoryStore {
        subscriptions: Mutex<Vec<SubscriptionEntity>>,
        credits: Mutex<Vec<AddOnCreditEntity>>,
    }

    impl InMemoryStore {
        fn new(
            subscriptions: Vec<SubscriptionEntity>,
            credits: Vec<AddOnCreditEntity>,
        ) -> Arc<Self> {
            Arc::new(Self {
                subscriptions: Mutex::new(subscriptions),
                credits: Mutex::new(credits),
            })
        }
    }

    #[async_trait]
    impl SubscriptionRepository for InMemoryStore {
        async fn list_active_for_user(
            &self,
            user_id: Uuid,
            now: DateTime<Utc>,
            order: SortOrder,
        ) -> Result<Vec<SubscriptionEntity>> {
            let mut rows: Vec<_> = self
                .subscriptions
                .lock()
                .unwrap()
                .iter()
                .filter(|row| {
                    row.user_id == user_id
                        && row.status == SubscriptionStatus::Active.to_string()
                        && row.end_date > now
                })
                .cloned()
                .collect();
            rows.sort_by_key(|row| row.created_at);
            if order == SortOrder::Desc {
                rows.reverse();
            }
            Ok(rows)
        }

        async fn create_subscription(&self, _insert: InsertSubscriptionEntity) -> Result<Uuid> {
            unimplemented!("not needed by consumption tests")
        }

        async fn increment_used_if_unchanged(
            &self,
            subscription_id: Uuid,
            kind: CreditKind,
            observed_used: i32,
        ) -> Result<bool> {
            let mut rows = self.subscriptions.lock().unwrap();
            let Some(row) = rows.iter_mut().find(|row| row.id == subscription_id) else {
                return Ok(false);
            };
            let (used, total) = row.allotment(kind);
            if used != observed_used || used >= total {
                return Ok(false);
            }
            match kind {
                CreditKind::Optimization => row.optimizations_used += 1,
                CreditKind::ScoreCheck => row.score_checks_used += 1,
                CreditKind::LinkedinMessages => row.linkedin_messages_used += 1,
                CreditKind::GuidedBuild => row.guided_builds_used += 1,
            }
            Ok(true)
        }

        async fn exists_for_plan(&self, _user_id: Uuid, _plan_id: &str) -> Result<bool> {
            Ok(false)
        }
    }

    #[async_trait]
    impl AddOnCreditRepository for InMemoryStore {
        async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<AddOnCreditEntity>> {
            Ok(self
                .credits
                .lock()
                .unwrap()
                .iter()
                .filter(|row| row.user_id == user_id)
                .cloned()
                .collect())
        }

        async fn list_available(
            &self,
            user_id: Uuid,
            kind: CreditKind,
        ) -> Result<Vec<AddOnCreditEntity>> {
            let mut rows: Vec<_> = self
                .credits
                .lock()
                .unwrap()
                .iter()
                .filter(|row| {
                    row.user_id == user_id
                        && row.credit_kind == kind.to_string()
                        && row.quantity_remaining > 0
                })
                .cloned()
                .collect();
            rows.sort_by_key(|row| row.created_at);
            Ok(rows)
        }

        async fn create_credit(&self, _insert: InsertAddOnCreditEntity) -> Result<Uuid> {
            unimplemented!("not needed by consumption tests")
        }

        async fn decrement_remaining_if_unchanged(
            &self,
            credit_id: Uuid,
            observed_remaining: i32,
        ) -> Result<bool> {
            let mut rows = self.credits.lock().unwrap();
            let Some(row) = rows.iter_mut().find(|row| row.id == credit_id) else {
                return Ok(false);
            };
            if row.quantity_remaining != observed_remaining || row.quantity_remaining == 0 {
                return Ok(false);
            }
            row.quantity_remaining -= 1;
            Ok(true)
        }
    }

    fn store_usecase(store: Arc<InMemoryStore>) -> Arc<ConsumptionUseCase<InMemoryStore, InMemoryStore>> {
        let entitlements = Arc::new(EntitlementUseCase::new(
            Arc::clone(&store),
            Arc::clone(&store),
        ));
        Arc::new(ConsumptionUseCase::new(
            Arc::clone(&store),
            store,
            entitlements,
        ))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn no_double_spend_under_concurrency() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        // 2 add-on credits + 3 subscription credits = 5 total.
        let store = InMemoryStore::new(
            vec![subscription(user_id, now, 0, 3)],
            vec![credit(user_id, now, 2)],
        );
        let usecase = store_usecase(Arc::clone(&store));

        // 6 concurrent consumers racing for 5 credits.
        let mut handles = Vec::new();
        for _ in 0..6 {
            let usecase = Arc::clone(&usecase);
            handles.push(tokio::spawn(async move {
                usecase.consume(user_id, CreditKind::Optimization).await
            }));
        }

        let mut successes = 0;
        let mut exhausted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(ConsumptionError::CreditsExhausted) => exhausted += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(successes, 5);
        assert_eq!(exhausted, 1);

        let subscriptions = store.subscriptions.lock().unwrap();
        let credits = store.credits.lock().unwrap();
        assert_eq!(subscriptions[0].optimizations_used, 3);
        assert_eq!(credits[0].quantity_remaining, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn exact_credit_count_all_succeed() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let store = InMemoryStore::new(
            vec![subscription(user_id, now, 0, 2)],
            vec![credit(user_id, now, 2)],
        );
        let usecase = store_usecase(Arc::clone(&store));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let usecase = Arc::clone(&usecase);
            handles.push(tokio::spawn(async move {
                usecase.consume(user_id, CreditKind::Optimization).await
            }));
        }

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        let subscriptions = store.subscriptions.lock().unwrap();
        let credits = store.credits.lock().unwrap();
        assert_eq!(subscriptions[0].optimizations_used, 2);
        assert_eq!(credits[0].quantity_remaining, 0);
    }

    #[tokio::test]
    async fn lite_check_scenario_two_then_exhausted() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let store = InMemoryStore::new(vec![subscription(user_id, now, 0, 2)], Vec::new());
        let usecase = store_usecase(Arc::clone(&store));

        let first = usecase
            .consume(user_id, CreditKind::Optimization)
            .await
            .unwrap();
        assert_eq!(first.remaining, 1);

        let second = usecase
            .consume(user_id, CreditKind::Optimization)
            .await
            .unwrap();
        assert_eq!(second.remaining, 0);

        let third = usecase.consume(user_id, CreditKind::Optimization).await;
        assert!(matches!(third, Err(ConsumptionError::CreditsExhausted)));
    }
}

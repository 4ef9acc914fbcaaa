use std::sync::Arc;

use chrono::{Duration, Utc};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    repositories::{
        addon_credits::AddOnCreditRepository, subscriptions::SubscriptionRepository,
    },
    value_objects::{
        credit_kinds::CreditKind,
        entitlements::{CreditBalance, Entitlement},
        sort_order::SortOrder,
        subscription_statuses::SubscriptionStatus,
    },
};

/// End date synthesized for users whose entitlement comes purely from
/// add-on credits (which do not expire in this model).
const ADDON_ONLY_LIFETIME_DAYS: i64 = 36_500;

#[derive(Debug, Error)]
pub enum EntitlementError {
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl EntitlementError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        match self {
            EntitlementError::Internal(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type EntitlementResult<T> = std::result::Result<T, EntitlementError>;

/// The aggregation engine: merges every active subscription row and every
/// add-on credit row for a user into one point-in-time view. Nothing is
/// cached; each call re-reads both collections so the view is always
/// consistent with the latest writes.
pub struct EntitlementUseCase<S, A>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    A: AddOnCreditRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    addon_credit_repo: Arc<A>,
}

impl<S, A> EntitlementUseCase<S, A>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    A: AddOnCreditRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>, addon_credit_repo: Arc<A>) -> Self {
        Self {
            subscription_repo,
            addon_credit_repo,
        }
    }

    /// Returns `None` only for users who have never purchased anything. A
    /// user who purchased and fully consumed their credits gets a present
    /// entitlement with `used == total`.
    pub async fn get_entitlement(&self, user_id: Uuid) -> EntitlementResult<Option<Entitlement>> {
        let now = Utc::now();

        let subscriptions = self
            .subscription_repo
            .list_active_for_user(user_id, now, SortOrder::Desc)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "entitlements: failed to load active subscriptions"
                );
                EntitlementError::Internal(err)
            })?;

        // A failed add-on fetch degrades to subscription-only totals rather
        // than failing the whole view.
        let addon_credits = match self.addon_credit_repo.list_for_user(user_id).await {
            Ok(credits) => credits,
            Err(err) => {
                warn!(
                    %user_id,
                    db_error = ?err,
                    "entitlements: add-on credit fetch failed, degrading to subscription-only totals"
                );
                Vec::new()
            }
        };

        let mut entitlement = match subscriptions.first() {
            Some(latest) => Entitlement {
                status: SubscriptionStatus::from_str(&latest.status),
                plan_id: Some(latest.plan_id.clone()),
                start_date: latest.start_date,
                end_date: latest.end_date,
                payment_id: latest.payment_id.clone(),
                coupon_used: latest.coupon_used.clone(),
                optimizations: CreditBalance::default(),
                score_checks: CreditBalance::default(),
                linkedin_messages: CreditBalance::default(),
                guided_builds: CreditBalance::default(),
            },
            None => Entitlement {
                status: SubscriptionStatus::Active,
                plan_id: None,
                start_date: now,
                end_date: now + Duration::days(ADDON_ONLY_LIFETIME_DAYS),
                payment_id: None,
                coupon_used: None,
                optimizations: CreditBalance::default(),
                score_checks: CreditBalance::default(),
                linkedin_messages: CreditBalance::default(),
                guided_builds: CreditBalance::default(),
            },
        };

        for subscription in &subscriptions {
            for kind in CreditKind::ALL {
                let (used, total) = subscription.allotment(kind);
                let balance = entitlement.balance_mut(kind);
                balance.total += i64::from(total);
                balance.used += i64::from(used);
            }
        }

        for credit in &addon_credits {
            let Some(kind) = CreditKind::from_str(&credit.credit_kind) else {
                // Service add-ons (e.g. live guidance sessions) carry tags
                // outside the four countable kinds.
                continue;
            };
            let balance = entitlement.balance_mut(kind);
            balance.total += i64::from(credit.quantity_purchased);
            balance.used +=
                i64::from(credit.quantity_purchased) - i64::from(credit.quantity_remaining);
        }

        if subscriptions.is_empty() && !entitlement.has_any_total() {
            info!(%user_id, "entitlements: user has no purchases");
            return Ok(None);
        }

        Ok(Some(entitlement))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        entities::{
            addon_credits::AddOnCreditEntity, subscriptions::SubscriptionEntity,
        },
        repositories::{
            addon_credits::MockAddOnCreditRepository,
            subscriptions::MockSubscriptionRepository,
        },
    };
    use anyhow::anyhow;
    use chrono::{DateTime, Utc};

    fn sample_subscription(
        user_id: Uuid,
        plan_id: &str,
        created_at: DateTime<Utc>,
        optimizations: (i32, i32),
    ) -> SubscriptionEntity {
        let now = Utc::now();
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id,
            plan_id: plan_id.to_string(),
            status: SubscriptionStatus::Active.to_string(),
            start_date: created_at,
            end_date: now + Duration::days(30),
            optimizations_used: optimizations.0,
            optimizations_total: optimizations.1,
            score_checks_used: 0,
            score_checks_total: 0,
            linkedin_messages_used: 0,
            linkedin_messages_total: 0,
            guided_builds_used: 0,
            guided_builds_total: 0,
            payment_id: Some("pay_123".to_string()),
            coupon_used: None,
            created_at,
            updated_at: created_at,
        }
    }

    fn sample_credit(
        user_id: Uuid,
        kind: CreditKind,
        purchased: i32,
        remaining: i32,
    ) -> AddOnCreditEntity {
        let now = Utc::now();
        AddOnCreditEntity {
            id: Uuid::new_v4(),
            user_id,
            credit_kind: kind.to_string(),
            quantity_purchased: purchased,
            quantity_remaining: remaining,
            payment_transaction_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn aggregates_subscriptions_and_addon_credits() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let newer = sample_subscription(user_id, "career_pro_max", now, (3, 10));
        let older = sample_subscription(user_id, "lite_check", now - Duration::days(5), (5, 5));

        let mut subscription_repo = MockSubscriptionRepository::new();
        let subscriptions = vec![newer, older];
        subscription_repo
            .expect_list_active_for_user()
            .returning(move |_, _, _| {
                let subscriptions = subscriptions.clone();
                Ok(subscriptions)
            });

        let mut addon_repo = MockAddOnCreditRepository::new();
        let credit = sample_credit(user_id, CreditKind::Optimization, 20, 12);
        addon_repo.expect_list_for_user().returning(move |_| {
            let credit = credit.clone();
            Ok(vec![credit])
        });

        let usecase = EntitlementUseCase::new(Arc::new(subscription_repo), Arc::new(addon_repo));
        let entitlement = usecase.get_entitlement(user_id).await.unwrap().unwrap();

        assert_eq!(entitlement.optimizations.total, 35);
        assert_eq!(entitlement.optimizations.used, 16);
        assert_eq!(entitlement.optimizations.remaining(), 19);
        // Metadata comes from the newest active subscription.
        assert_eq!(entitlement.plan_id.as_deref(), Some("career_pro_max"));
    }

    #[tokio::test]
    async fn never_purchased_is_absent() {
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_list_active_for_user()
            .returning(|_, _, _| Ok(Vec::new()));

        let mut addon_repo = MockAddOnCreditRepository::new();
        addon_repo
            .expect_list_for_user()
            .returning(|_| Ok(Vec::new()));

        let usecase = EntitlementUseCase::new(Arc::new(subscription_repo), Arc::new(addon_repo));
        assert!(usecase
            .get_entitlement(Uuid::new_v4())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn fully_consumed_is_present_not_absent() {
        let user_id = Uuid::new_v4();
        let exhausted = sample_subscription(user_id, "lite_check", Utc::now(), (2, 2));

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_list_active_for_user()
            .returning(move |_, _, _| {
                let exhausted = exhausted.clone();
                Ok(vec![exhausted])
            });

        let mut addon_repo = MockAddOnCreditRepository::new();
        addon_repo
            .expect_list_for_user()
            .returning(|_| Ok(Vec::new()));

        let usecase = EntitlementUseCase::new(Arc::new(subscription_repo), Arc::new(addon_repo));
        let entitlement = usecase.get_entitlement(user_id).await.unwrap().unwrap();

        assert_eq!(entitlement.optimizations.total, 2);
        assert_eq!(entitlement.optimizations.used, 2);
        assert_eq!(entitlement.optimizations.remaining(), 0);
    }

    #[tokio::test]
    async fn addon_only_user_gets_synthesized_active_metadata() {
        let user_id = Uuid::new_v4();

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_list_active_for_user()
            .returning(|_, _, _| Ok(Vec::new()));

        let mut addon_repo = MockAddOnCreditRepository::new();
        let credit = sample_credit(user_id, CreditKind::ScoreCheck, 3, 3);
        addon_repo.expect_list_for_user().returning(move |_| {
            let credit = credit.clone();
            Ok(vec![credit])
        });

        let usecase = EntitlementUseCase::new(Arc::new(subscription_repo), Arc::new(addon_repo));
        let entitlement = usecase.get_entitlement(user_id).await.unwrap().unwrap();

        assert_eq!(entitlement.status, SubscriptionStatus::Active);
        assert!(entitlement.plan_id.is_none());
        assert!(entitlement.end_date > Utc::now() + Duration::days(365));
        assert_eq!(entitlement.score_checks.total, 3);
    }

    #[tokio::test]
    async fn addon_fetch_failure_degrades_to_subscription_totals() {
        let user_id = Uuid::new_v4();
        let subscription = sample_subscription(user_id, "pro_resume_kit", Utc::now(), (1, 20));

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_list_active_for_user()
            .returning(move |_, _, _| {
                let subscription = subscription.clone();
                Ok(vec![subscription])
            });

        let mut addon_repo = MockAddOnCreditRepository::new();
        addon_repo
            .expect_list_for_user()
            .returning(|_| Err(anyhow!("store unreachable")));

        let usecase = EntitlementUseCase::new(Arc::new(subscription_repo), Arc::new(addon_repo));
        let entitlement = usecase.get_entitlement(user_id).await.unwrap().unwrap();

        assert_eq!(entitlement.optimizations.total, 20);
        assert_eq!(entitlement.optimizations.used, 1);
    }

    #[tokio::test]
    async fn subscription_fetch_failure_fails_the_call() {
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_list_active_for_user()
            .returning(|_, _, _| Err(anyhow!("store unreachable")));

        let addon_repo = MockAddOnCreditRepository::new();

        let usecase = EntitlementUseCase::new(Arc::new(subscription_repo), Arc::new(addon_repo));
        assert!(usecase.get_entitlement(Uuid::new_v4()).await.is_err());
    }
}

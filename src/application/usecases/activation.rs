use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    catalog::{ADDON_ONLY_PLAN_ID, FREE_TRIAL_PLAN_ID, PlanCatalog},
    entities::{
        addon_credits::InsertAddOnCreditEntity,
        payment_transactions::InsertPaymentTransactionEntity,
        subscriptions::InsertSubscriptionEntity,
        wallet_transactions::InsertWalletTransactionEntity,
    },
    repositories::{
        addon_credits::AddOnCreditRepository,
        payment_transactions::PaymentTransactionRepository,
        subscriptions::SubscriptionRepository,
        wallet_transactions::WalletTransactionRepository,
    },
    value_objects::{purchase_types::PurchaseType, subscription_statuses::SubscriptionStatus},
};

/// Synthetic refs recorded when a fully-discounted purchase never touched
/// the payment gateway. The ledger downstream cannot tell free credits from
/// paid ones, by contract.
pub const FREE_PLAN_PAYMENT_REF: &str = "FREE_PLAN_ACTIVATION";
pub const FREE_PLAN_ORDER_REF: &str = "FREE_PLAN_ORDER";

const FREE_TRIAL_COUPON: &str = "free_trial";
const CURRENCY: &str = "INR";

#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("plan not found: {0}")]
    PlanNotFound(String),
    #[error("plan {0} has an invalid duration; activation aborted")]
    CorruptCatalogEntry(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ActivationError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            ActivationError::PlanNotFound(_) => StatusCode::NOT_FOUND,
            ActivationError::CorruptCatalogEntry(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ActivationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type ActivationResult<T> = std::result::Result<T, ActivationError>;

/// One completed purchase, paid or free. Amounts are in paise and come from
/// the trusted payment collaborator; `idempotency_key` makes retries safe.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivationRequest {
    pub plan_id: Option<String>,
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub selected_add_ons: HashMap<String, i32>,
    pub amount_minor: i64,
    pub discount_minor: i64,
    pub final_minor: i64,
    #[serde(default)]
    pub wallet_deduction_minor: i64,
    pub payment_ref: Option<String>,
    pub order_ref: Option<String>,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, serde::Serialize, PartialEq)]
pub struct ActivationOutcome {
    pub transaction_id: Uuid,
    pub subscription_id: Option<Uuid>,
    /// True when the idempotency key had already been activated and nothing
    /// new was written.
    pub already_activated: bool,
}

/// The only producer of ledger rows. Creates the payment-transaction audit
/// row, add-on credit rows and (for plan purchases) the subscription row.
pub struct ActivationUseCase<S, A, T, W>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    A: AddOnCreditRepository + Send + Sync + 'static,
    T: PaymentTransactionRepository + Send + Sync + 'static,
    W: WalletTransactionRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    addon_credit_repo: Arc<A>,
    transaction_repo: Arc<T>,
    wallet_repo: Arc<W>,
    catalog: Arc<PlanCatalog>,
}

impl<S, A, T, W> ActivationUseCase<S, A, T, W>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    A: AddOnCreditRepository + Send + Sync + 'static,
    T: PaymentTransactionRepository + Send + Sync + 'static,
    W: WalletTransactionRepository + Send + Sync + 'static,
{
    pub fn new(
        subscription_repo: Arc<S>,
        addon_credit_repo: Arc<A>,
        transaction_repo: Arc<T>,
        wallet_repo: Arc<W>,
        catalog: Arc<PlanCatalog>,
    ) -> Self {
        Self {
            subscription_repo,
            addon_credit_repo,
            transaction_repo,
            wallet_repo,
            catalog,
        }
    }

    pub async fn activate(
        &self,
        user_id: Uuid,
        request: ActivationRequest,
    ) -> ActivationResult<ActivationOutcome> {
        info!(
            %user_id,
            plan_id = ?request.plan_id,
            idempotency_key = %request.idempotency_key,
            "activation: purchase activation requested"
        );

        if let Some(existing) = self
            .transaction_repo
            .find_by_idempotency_key(user_id, &request.idempotency_key)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "activation: idempotency lookup failed"
                );
                ActivationError::Internal(err)
            })?
        {
            info!(
                %user_id,
                transaction_id = %existing.id,
                "activation: idempotency key already activated, replaying outcome"
            );
            return Ok(ActivationOutcome {
                transaction_id: existing.id,
                subscription_id: existing.subscription_id,
                already_activated: true,
            });
        }

        // Treat the add-on-only pseudo-plan the same as "no plan".
        let plan_id = request
            .plan_id
            .as_deref()
            .filter(|id| *id != ADDON_ONLY_PLAN_ID);

        let plan = match plan_id {
            Some(id) => {
                let plan = self
                    .catalog
                    .plan(id)
                    .ok_or_else(|| ActivationError::PlanNotFound(id.to_string()))?;
                // A corrupt catalog entry must never produce an
                // unbounded-lifetime subscription.
                if plan.duration_hours <= 0 {
                    error!(
                        %user_id,
                        plan_id = %plan.id,
                        duration_hours = plan.duration_hours,
                        "activation: corrupt catalog entry"
                    );
                    return Err(ActivationError::CorruptCatalogEntry(plan.id.clone()));
                }
                Some(plan.clone())
            }
            None => None,
        };

        let purchase_type = match (&plan, request.selected_add_ons.is_empty()) {
            (None, _) => PurchaseType::AddonOnly,
            (Some(_), false) => PurchaseType::PlanWithAddons,
            (Some(_), true) => PurchaseType::Plan,
        };

        let payment_ref = request
            .payment_ref
            .clone()
            .unwrap_or_else(|| FREE_PLAN_PAYMENT_REF.to_string());
        let order_ref = request
            .order_ref
            .clone()
            .unwrap_or_else(|| FREE_PLAN_ORDER_REF.to_string());

        let transaction_id = self
            .transaction_repo
            .create_transaction(InsertPaymentTransactionEntity {
                user_id,
                plan_id: plan.as_ref().map(|plan| plan.id.clone()),
                status: "success".to_string(),
                amount_minor: request.amount_minor,
                currency: CURRENCY.to_string(),
                coupon_code: request.coupon_code.clone(),
                discount_minor: request.discount_minor,
                final_minor: request.final_minor,
                purchase_type: purchase_type.to_string(),
                wallet_deduction_minor: request.wallet_deduction_minor,
                payment_ref,
                order_ref,
                idempotency_key: request.idempotency_key.clone(),
            })
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "activation: failed to record payment transaction"
                );
                ActivationError::Internal(err)
            })?;

        for (add_on_id, count) in &request.selected_add_ons {
            if *count <= 0 {
                continue;
            }
            let Some(add_on) = self.catalog.add_on(add_on_id) else {
                warn!(
                    %user_id,
                    %transaction_id,
                    add_on_id = %add_on_id,
                    "activation: unknown add-on id, skipping"
                );
                continue;
            };
            let quantity = add_on.quantity * count;
            self.addon_credit_repo
                .create_credit(InsertAddOnCreditEntity {
                    user_id,
                    credit_kind: add_on.kind.clone(),
                    quantity_purchased: quantity,
                    quantity_remaining: quantity,
                    payment_transaction_id: transaction_id,
                })
                .await
                .map_err(|err| {
                    // The transaction row exists; this must be reconciled,
                    // never swallowed.
                    error!(
                        %user_id,
                        %transaction_id,
                        add_on_id = %add_on_id,
                        db_error = ?err,
                        "activation: failed to insert add-on credits after payment"
                    );
                    ActivationError::Internal(err)
                })?;
        }

        let mut subscription_id = None;
        if let Some(plan) = &plan {
            let now = Utc::now();
            let created = self
                .subscription_repo
                .create_subscription(InsertSubscriptionEntity {
                    user_id,
                    plan_id: plan.id.clone(),
                    status: SubscriptionStatus::Active.to_string(),
                    start_date: now,
                    end_date: now + Duration::hours(plan.duration_hours),
                    optimizations_used: 0,
                    optimizations_total: plan.optimizations,
                    score_checks_used: 0,
                    score_checks_total: plan.score_checks,
                    linkedin_messages_used: 0,
                    linkedin_messages_total: plan.linkedin_messages,
                    guided_builds_used: 0,
                    guided_builds_total: plan.guided_builds,
                    payment_id: Some(request
                        .payment_ref
                        .clone()
                        .unwrap_or_else(|| FREE_PLAN_PAYMENT_REF.to_string())),
                    coupon_used: request.coupon_code.clone(),
                })
                .await
                .map_err(|err| {
                    error!(
                        %user_id,
                        %transaction_id,
                        plan_id = %plan.id,
                        db_error = ?err,
                        "activation: failed to create subscription after payment"
                    );
                    ActivationError::Internal(err)
                })?;

            self.transaction_repo
                .attach_subscription(transaction_id, created)
                .await
                .map_err(|err| {
                    error!(
                        %user_id,
                        %transaction_id,
                        subscription_id = %created,
                        db_error = ?err,
                        "activation: failed to back-link transaction to subscription"
                    );
                    ActivationError::Internal(err)
                })?;

            subscription_id = Some(created);
        }

        if request.wallet_deduction_minor > 0 {
            let deduction = InsertWalletTransactionEntity {
                user_id,
                type_: "purchase_use".to_string(),
                amount_minor: -request.wallet_deduction_minor,
                status: "completed".to_string(),
                transaction_ref: format!("purchase_deduction_{}", transaction_id),
                redeem_details: Some(serde_json::json!({
                    "plan_id": plan.as_ref().map(|plan| plan.id.clone()),
                    "addons_purchased": request.selected_add_ons,
                })),
            };
            // Store-credit bookkeeping is external to the entitlement model;
            // a failure here is flagged for reconciliation, not fatal.
            if let Err(err) = self.wallet_repo.record_deduction(deduction).await {
                warn!(
                    %user_id,
                    %transaction_id,
                    db_error = ?err,
                    "activation: failed to record wallet deduction"
                );
            }
        }

        info!(
            %user_id,
            %transaction_id,
            subscription_id = ?subscription_id,
            purchase_type = %purchase_type,
            "activation: purchase activated"
        );

        Ok(ActivationOutcome {
            transaction_id,
            subscription_id,
            already_activated: false,
        })
    }

    /// One `lite_check` trial per user, activated without payment. Returns
    /// false when the user already claimed it.
    pub async fn activate_free_trial(&self, user_id: Uuid) -> ActivationResult<bool> {
        let already_claimed = self
            .subscription_repo
            .exists_for_plan(user_id, FREE_TRIAL_PLAN_ID)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "activation: failed to check for existing free trial"
                );
                ActivationError::Internal(err)
            })?;

        if already_claimed {
            info!(%user_id, "activation: free trial already claimed, skipping");
            return Ok(false);
        }

        let plan = self
            .catalog
            .plan(FREE_TRIAL_PLAN_ID)
            .ok_or_else(|| ActivationError::PlanNotFound(FREE_TRIAL_PLAN_ID.to_string()))?;
        if plan.duration_hours <= 0 {
            return Err(ActivationError::CorruptCatalogEntry(plan.id.clone()));
        }

        let now = Utc::now();
        self.subscription_repo
            .create_subscription(InsertSubscriptionEntity {
                user_id,
                plan_id: plan.id.clone(),
                status: SubscriptionStatus::Active.to_string(),
                start_date: now,
                end_date: now + Duration::hours(plan.duration_hours),
                optimizations_used: 0,
                optimizations_total: plan.optimizations,
                score_checks_used: 0,
                score_checks_total: plan.score_checks,
                linkedin_messages_used: 0,
                linkedin_messages_total: plan.linkedin_messages,
                guided_builds_used: 0,
                guided_builds_total: plan.guided_builds,
                payment_id: None,
                coupon_used: Some(FREE_TRIAL_COUPON.to_string()),
            })
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "activation: failed to activate free trial"
                );
                ActivationError::Internal(err)
            })?;

        info!(%user_id, "activation: free trial activated");
        Ok(true)
    }
}

use std::sync::Arc;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    catalog::{ADDON_ONLY_PLAN_ID, PlanCatalog},
    value_objects::coupons::{CouponCheck, CouponEvaluation},
};

/// Remote authority that tracks what the local rule table cannot: global
/// usage limits, per-user usage and expiry. It records nothing on evaluation;
/// usage is the authority's own bookkeeping at redemption time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CouponAuthority: Send + Sync {
    async fn validate(&self, coupon_code: &str, user_id: Uuid) -> AnyResult<CouponCheck>;
}

/// Local rules: exact-match on `(normalized code, plan id)`, percentage of
/// the plan's base price, floor division in paise.
const COUPON_RULES: &[(&str, &str, i64)] = &[
    ("fullsupport", "career_pro_max", 100),
    ("first100", "lite_check", 100),
    ("first500", "lite_check", 98),
    ("worthyone", "career_pro_max", 50),
];

const REJECTION_MESSAGE: &str = "Invalid coupon code or not applicable to selected plan";

#[derive(Debug, Error)]
pub enum CouponError {
    #[error("plan not found")]
    PlanNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CouponError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            CouponError::PlanNotFound => StatusCode::NOT_FOUND,
            CouponError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type CouponResult<T> = std::result::Result<T, CouponError>;

pub struct CouponUseCase<C>
where
    C: CouponAuthority + 'static,
{
    authority: Arc<C>,
    catalog: Arc<PlanCatalog>,
}

impl<C> CouponUseCase<C>
where
    C: CouponAuthority + 'static,
{
    pub fn new(authority: Arc<C>, catalog: Arc<PlanCatalog>) -> Self {
        Self { authority, catalog }
    }

    /// Evaluates a coupon against a plan. The remote authority gets a veto:
    /// when the user is known and the authority rejects the code (or cannot
    /// be reached), the evaluation is rejected even if a local rule matches.
    pub async fn evaluate(
        &self,
        plan_id: &str,
        coupon_code: &str,
        user_id: Option<Uuid>,
    ) -> CouponResult<CouponEvaluation> {
        let base_minor = if plan_id == ADDON_ONLY_PLAN_ID {
            // Coupons apply to plans; an add-on-only purchase has a zero base.
            0
        } else {
            self.catalog
                .plan(plan_id)
                .ok_or(CouponError::PlanNotFound)?
                .price_minor()
        };

        if let Some(user_id) = user_id {
            match self.authority.validate(coupon_code, user_id).await {
                Ok(check) if !check.is_valid => {
                    info!(
                        %user_id,
                        plan_id,
                        "coupons: remote authority rejected code"
                    );
                    return Ok(CouponEvaluation::rejected(base_minor, check.message));
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        %user_id,
                        plan_id,
                        error = ?err,
                        "coupons: remote validation failed"
                    );
                    return Ok(CouponEvaluation::rejected(
                        base_minor,
                        "Could not validate coupon. Please try again.",
                    ));
                }
            }
        }

        let normalized = coupon_code.trim().to_lowercase();
        let rule = COUPON_RULES
            .iter()
            .find(|(code, plan, _)| *code == normalized && *plan == plan_id);

        let Some((_, _, percent)) = rule else {
            return Ok(CouponEvaluation::rejected(base_minor, REJECTION_MESSAGE));
        };

        let discount_minor = base_minor * percent / 100;
        let final_minor = (base_minor - discount_minor).max(0);

        info!(
            plan_id,
            coupon = %normalized,
            discount_minor,
            final_minor,
            "coupons: coupon accepted"
        );

        Ok(CouponEvaluation {
            accepted: true,
            coupon_applied: Some(normalized),
            discount_minor,
            final_minor,
            message: "Coupon applied successfully!".to_string(),
        })
    }
}

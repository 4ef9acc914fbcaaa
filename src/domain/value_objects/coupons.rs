use serde::Serialize;

/// Outcome of evaluating a coupon against a plan. A rejected coupon is a
/// value, not an error: the caller shows `message` and keeps the base price.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CouponEvaluation {
    pub accepted: bool,
    pub coupon_applied: Option<String>,
    pub discount_minor: i64,
    pub final_minor: i64,
    pub message: String,
}

impl CouponEvaluation {
    pub fn rejected(base_minor: i64, message: impl Into<String>) -> Self {
        Self {
            accepted: false,
            coupon_applied: None,
            discount_minor: 0,
            final_minor: base_minor,
            message: message.into(),
        }
    }
}

/// Verdict from the remote coupon authority (usage limits, per-user caps,
/// expiry) which the local rule table does not track.
#[derive(Debug, Clone, PartialEq)]
pub struct CouponCheck {
    pub is_valid: bool,
    pub message: String,
}

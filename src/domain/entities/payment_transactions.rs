use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::payment_transactions;

/// Audit record for every completed purchase, paid or fully discounted.
/// Amounts are in paise. `(user_id, idempotency_key)` is unique so a client
/// can safely retry an interrupted activation.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payment_transactions)]
pub struct PaymentTransactionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Option<String>,
    pub status: String,
    pub amount_minor: i64,
    pub currency: String,
    pub coupon_code: Option<String>,
    pub discount_minor: i64,
    pub final_minor: i64,
    pub purchase_type: String,
    pub wallet_deduction_minor: i64,
    pub payment_ref: String,
    pub order_ref: String,
    pub subscription_id: Option<Uuid>,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payment_transactions)]
pub struct InsertPaymentTransactionEntity {
    pub user_id: Uuid,
    pub plan_id: Option<String>,
    pub status: String,
    pub amount_minor: i64,
    pub currency: String,
    pub coupon_code: Option<String>,
    pub discount_minor: i64,
    pub final_minor: i64,
    pub purchase_type: String,
    pub wallet_deduction_minor: i64,
    pub payment_ref: String,
    pub order_ref: String,
    pub idempotency_key: String,
}

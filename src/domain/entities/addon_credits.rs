use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::user_addon_credits;

/// One row per add-on purchase. `quantity_remaining` only ever decreases and
/// never drops below zero; zero-remaining rows still count toward historical
/// totals in the entitlement view.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = user_addon_credits)]
pub struct AddOnCreditEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub credit_kind: String,
    pub quantity_purchased: i32,
    pub quantity_remaining: i32,
    pub payment_transaction_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_addon_credits)]
pub struct InsertAddOnCreditEntity {
    pub user_id: Uuid,
    pub credit_kind: String,
    pub quantity_purchased: i32,
    pub quantity_remaining: i32,
    pub payment_transaction_id: Uuid,
}

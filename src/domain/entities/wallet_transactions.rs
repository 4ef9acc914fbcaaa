use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::wallet_transactions;

/// Store-credit bookkeeping adjacent to the entitlement ledger. Deductions
/// are stored as negative amounts.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = wallet_transactions)]
pub struct InsertWalletTransactionEntity {
    pub user_id: Uuid,
    pub type_: String,
    pub amount_minor: i64,
    pub status: String,
    pub transaction_ref: String,
    pub redeem_details: Option<serde_json::Value>,
}

use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::payment_transactions::{
    InsertPaymentTransactionEntity, PaymentTransactionEntity,
};

#[automock]
#[async_trait]
pub trait PaymentTransactionRepository {
    async fn create_transaction(&self, insert: InsertPaymentTransactionEntity) -> Result<Uuid>;

    async fn find_by_idempotency_key(
        &self,
        user_id: Uuid,
        idempotency_key: &str,
    ) -> Result<Option<PaymentTransactionEntity>>;

    /// Back-links the audit row to the subscription it produced.
    async fn attach_subscription(
        &self,
        transaction_id: Uuid,
        subscription_id: Uuid,
    ) -> Result<()>;
}

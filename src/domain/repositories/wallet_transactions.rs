use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::wallet_transactions::InsertWalletTransactionEntity;

#[automock]
#[async_trait]
pub trait WalletTransactionRepository {
    async fn record_deduction(&self, insert: InsertWalletTransactionEntity) -> Result<Uuid>;
}

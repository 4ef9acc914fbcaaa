use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::wallet_transactions::InsertWalletTransactionEntity,
        repositories::wallet_transactions::WalletTransactionRepository,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::wallet_transactions},
};

pub struct WalletTransactionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl WalletTransactionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl WalletTransactionRepository for WalletTransactionPostgres {
    async fn record_deduction(&self, insert: InsertWalletTransactionEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(wallet_transactions::table)
            .values(&insert)
            .returning(wallet_transactions::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(result)
    }
}

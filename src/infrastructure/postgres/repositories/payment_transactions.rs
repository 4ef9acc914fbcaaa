use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::payment_transactions::{
            InsertPaymentTransactionEntity, PaymentTransactionEntity,
        },
        repositories::payment_transactions::PaymentTransactionRepository,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::payment_transactions},
};

pub struct PaymentTransactionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentTransactionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentTransactionRepository for PaymentTransactionPostgres {
    async fn create_transaction(&self, insert: InsertPaymentTransactionEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(payment_transactions::table)
            .values(&insert)
            .returning(payment_transactions::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(result)
    }

    async fn find_by_idempotency_key(
        &self,
        user_id: Uuid,
        idempotency_key: &str,
    ) -> Result<Option<PaymentTransactionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = payment_transactions::table
            .filter(payment_transactions::user_id.eq(user_id))
            .filter(payment_transactions::idempotency_key.eq(idempotency_key))
            .select(PaymentTransactionEntity::as_select())
            .first::<PaymentTransactionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn attach_subscription(
        &self,
        transaction_id: Uuid,
        subscription_id: Uuid,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(payment_transactions::table)
            .filter(payment_transactions::id.eq(transaction_id))
            .set(payment_transactions::subscription_id.eq(Some(subscription_id)))
            .execute(&mut conn)?;

        Ok(())
    }
}

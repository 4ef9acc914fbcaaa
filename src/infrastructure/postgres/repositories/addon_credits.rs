use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::addon_credits::{AddOnCreditEntity, InsertAddOnCreditEntity},
        repositories::addon_credits::AddOnCreditRepository,
        value_objects::credit_kinds::CreditKind,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::user_addon_credits},
};

pub struct AddOnCreditPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl AddOnCreditPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl AddOnCreditRepository for AddOnCreditPostgres {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<AddOnCreditEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = user_addon_credits::table
            .filter(user_addon_credits::user_id.eq(user_id))
            .select(AddOnCreditEntity::as_select())
            .load::<AddOnCreditEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_available(
        &self,
        user_id: Uuid,
        kind: CreditKind,
    ) -> Result<Vec<AddOnCreditEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = user_addon_credits::table
            .filter(user_addon_credits::user_id.eq(user_id))
            .filter(user_addon_credits::credit_kind.eq(kind.to_string()))
            .filter(user_addon_credits::quantity_remaining.gt(0))
            .order(user_addon_credits::created_at.asc())
            .select(AddOnCreditEntity::as_select())
            .load::<AddOnCreditEntity>(&mut conn)?;

        Ok(results)
    }

    async fn create_credit(&self, insert: InsertAddOnCreditEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(user_addon_credits::table)
            .values(&insert)
            .returning(user_addon_credits::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(result)
    }

    async fn decrement_remaining_if_unchanged(
        &self,
        credit_id: Uuid,
        observed_remaining: i32,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let affected = update(user_addon_credits::table)
            .filter(user_addon_credits::id.eq(credit_id))
            .filter(user_addon_credits::quantity_remaining.eq(observed_remaining))
            .set((
                user_addon_credits::quantity_remaining.eq(observed_remaining - 1),
                user_addon_credits::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(affected == 1)
    }
}

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::value_objects::credit_kinds::CreditKind;
use crate::infrastructure::postgres::schema::subscriptions;

/// One row per purchase event. Totals are copied from the plan at creation
/// time; `*_used` is mutated only by the consumption engine. Invariant:
/// `used <= total` for every kind.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscriptions)]
pub struct SubscriptionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: String,
    pub status: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub optimizations_used: i32,
    pub optimizations_total: i32,
    pub score_checks_used: i32,
    pub score_checks_total: i32,
    pub linkedin_messages_used: i32,
    pub linkedin_messages_total: i32,
    pub guided_builds_used: i32,
    pub guided_builds_total: i32,
    pub payment_id: Option<String>,
    pub coupon_used: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionEntity {
    /// `(used, total)` pair for one credit kind.
    pub fn allotment(&self, kind: CreditKind) -> (i32, i32) {
        match kind {
            CreditKind::Optimization => (self.optimizations_used, self.optimizations_total),
            CreditKind::ScoreCheck => (self.score_checks_used, self.score_checks_total),
            CreditKind::LinkedinMessages => {
                (self.linkedin_messages_used, self.linkedin_messages_total)
            }
            CreditKind::GuidedBuild => (self.guided_builds_used, self.guided_builds_total),
        }
    }

    pub fn has_headroom(&self, kind: CreditKind) -> bool {
        let (used, total) = self.allotment(kind);
        used < total
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = subscriptions)]
pub struct InsertSubscriptionEntity {
    pub user_id: Uuid,
    pub plan_id: String,
    pub status: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub optimizations_used: i32,
    pub optimizations_total: i32,
    pub score_checks_used: i32,
    pub score_checks_total: i32,
    pub linkedin_messages_used: i32,
    pub linkedin_messages_total: i32,
    pub guided_builds_used: i32,
    pub guided_builds_total: i32,
    pub payment_id: Option<String>,
    pub coupon_used: Option<String>,
}

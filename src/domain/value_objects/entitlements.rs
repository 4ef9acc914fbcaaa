use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{credit_kinds::CreditKind, subscription_statuses::SubscriptionStatus};

/// One `{total, used}` pair of the merged entitlement view. Totals are summed
/// in i64 so sentinel-sized plan allotments stay well inside range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CreditBalance {
    pub total: i64,
    pub used: i64,
}

impl CreditBalance {
    pub fn remaining(&self) -> i64 {
        (self.total - self.used).max(0)
    }
}

/// Derived, never persisted: the element-wise sum of every active subscription
/// and every add-on credit row a user owns. Recomputed on every query.
#[derive(Debug, Clone, Serialize)]
pub struct Entitlement {
    pub status: SubscriptionStatus,
    pub plan_id: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub payment_id: Option<String>,
    pub coupon_used: Option<String>,
    pub optimizations: CreditBalance,
    pub score_checks: CreditBalance,
    pub linkedin_messages: CreditBalance,
    pub guided_builds: CreditBalance,
}

impl Entitlement {
    pub fn balance(&self, kind: CreditKind) -> CreditBalance {
        match kind {
            CreditKind::Optimization => self.optimizations,
            CreditKind::ScoreCheck => self.score_checks,
            CreditKind::LinkedinMessages => self.linkedin_messages,
            CreditKind::GuidedBuild => self.guided_builds,
        }
    }

    pub fn balance_mut(&mut self, kind: CreditKind) -> &mut CreditBalance {
        match kind {
            CreditKind::Optimization => &mut self.optimizations,
            CreditKind::ScoreCheck => &mut self.score_checks,
            CreditKind::LinkedinMessages => &mut self.linkedin_messages,
            CreditKind::GuidedBuild => &mut self.guided_builds,
        }
    }

    pub fn has_any_total(&self) -> bool {
        CreditKind::ALL
            .iter()
            .any(|kind| self.balance(*kind).total > 0)
    }
}

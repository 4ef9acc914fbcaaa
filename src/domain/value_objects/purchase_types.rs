use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Classification recorded on every payment transaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseType {
    Plan,
    PlanWithAddons,
    AddonOnly,
}

impl Display for PurchaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let purchase_type = match self {
            PurchaseType::Plan => "plan",
            PurchaseType::PlanWithAddons => "plan_with_addons",
            PurchaseType::AddonOnly => "addon_only",
        };
        write!(f, "{}", purchase_type)
    }
}

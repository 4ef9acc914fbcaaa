use serde::Serialize;

use crate::domain::value_objects::credit_kinds::CreditKind;

/// Finite stand-in for "unlimited" allotments so `total - used` stays
/// well-defined and serializable.
pub const UNLIMITED_CREDITS: i32 = 999_999_999;

/// Pseudo-plan id accepted by coupon evaluation and activation when a
/// purchase contains add-ons but no subscription plan.
pub const ADDON_ONLY_PLAN_ID: &str = "addon_only_purchase";

pub const FREE_TRIAL_PLAN_ID: &str = "lite_check";

/// Prices are in rupees; all arithmetic downstream happens in paise.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub duration_hours: i64,
    pub optimizations: i32,
    pub score_checks: i32,
    pub linkedin_messages: i32,
    pub guided_builds: i32,
}

impl Plan {
    pub fn price_minor(&self) -> i64 {
        self.price * 100
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AddOn {
    pub id: String,
    pub name: String,
    pub price: i64,
    /// Credit-kind tag. Only the four countable kinds feed the entitlement
    /// ledger; service add-ons carry their own tags and are tracked but never
    /// aggregated.
    pub kind: String,
    pub quantity: i32,
}

/// Immutable registry of purchasable plans and add-ons. Built once at process
/// start and injected into every component that needs it; callers must
/// tolerate unknown legacy ids coming back from historical purchase rows.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
    add_ons: Vec<AddOn>,
}

impl PlanCatalog {
    pub fn new(plans: Vec<Plan>, add_ons: Vec<AddOn>) -> Self {
        Self { plans, add_ons }
    }

    pub fn builtin() -> Self {
        Self::new(builtin_plans(), builtin_add_ons())
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    pub fn add_ons(&self) -> &[AddOn] {
        &self.add_ons
    }

    pub fn plan(&self, id: &str) -> Option<&Plan> {
        self.plans.iter().find(|plan| plan.id == id)
    }

    pub fn add_on(&self, id: &str) -> Option<&AddOn> {
        self.add_ons.iter().find(|add_on| add_on.id == id)
    }
}

fn plan(
    id: &str,
    name: &str,
    price: i64,
    duration_hours: i64,
    optimizations: i32,
    score_checks: i32,
    linkedin_messages: i32,
    guided_builds: i32,
) -> Plan {
    Plan {
        id: id.to_string(),
        name: name.to_string(),
        price,
        duration_hours,
        optimizations,
        score_checks,
        linkedin_messages,
        guided_builds,
    }
}

fn add_on(id: &str, name: &str, price: i64, kind: &str, quantity: i32) -> AddOn {
    AddOn {
        id: id.to_string(),
        name: name.to_string(),
        price,
        kind: kind.to_string(),
        quantity,
    }
}

fn builtin_plans() -> Vec<Plan> {
    vec![
        plan("career_pro_max", "Career Pro Max", 1999, 8760, 50, 50, UNLIMITED_CREDITS, 5),
        plan("career_boost_plus", "Career Boost+", 1499, 8760, 30, 30, UNLIMITED_CREDITS, 3),
        plan("pro_resume_kit", "Pro Resume Kit", 999, 8760, 20, 20, 100, 2),
        plan("smart_apply_pack", "Smart Apply Pack", 499, 8760, 10, 10, 50, 1),
        plan("resume_fix_pack", "Resume Fix Pack", 199, 8760, 5, 2, 0, 0),
        plan(FREE_TRIAL_PLAN_ID, "Lite Check", 99, 168, 2, 2, 10, 0),
    ]
}

fn builtin_add_ons() -> Vec<AddOn> {
    let optimization = CreditKind::Optimization.to_string();
    let score_check = CreditKind::ScoreCheck.to_string();
    let linkedin_messages = CreditKind::LinkedinMessages.to_string();
    let guided_build = CreditKind::GuidedBuild.to_string();

    vec![
        add_on("jd_optimization_single", "JD-Based Optimization (1x)", 49, &optimization, 1),
        add_on("guided_resume_build_single", "Guided Resume Build (1x)", 99, &guided_build, 1),
        add_on("resume_score_check_single", "Resume Score Check (1x)", 19, &score_check, 1),
        add_on("linkedin_messages_50", "LinkedIn Messages (50x)", 29, &linkedin_messages, 50),
        add_on(
            "linkedin_optimization_single",
            "LinkedIn Optimization (1x Review)",
            199,
            "linkedin_optimization",
            1,
        ),
        add_on(
            "resume_guidance_session",
            "Resume Guidance Session (Live)",
            299,
            "guidance_session",
            1,
        ),
        add_on(
            "jd_optimization_single_purchase",
            "JD-Based Optimization (1 Use)",
            49,
            &optimization,
            1,
        ),
        add_on(
            "guided_resume_build_single_purchase",
            "Guided Resume Build (1 Use)",
            99,
            &guided_build,
            1,
        ),
        add_on(
            "resume_score_check_single_purchase",
            "Resume Score Check (1 Use)",
            19,
            &score_check,
            1,
        ),
        add_on(
            "linkedin_messages_50_purchase",
            "LinkedIn Messages (50 Uses)",
            29,
            &linkedin_messages,
            50,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_contains_all_plans() {
        let catalog = PlanCatalog::builtin();
        assert_eq!(catalog.plans().len(), 6);
        assert!(catalog.plan("career_pro_max").is_some());
        assert!(catalog.plan("lite_check").is_some());
    }

    #[test]
    fn unlimited_tiers_use_the_finite_sentinel() {
        let catalog = PlanCatalog::builtin();
        let pro_max = catalog.plan("career_pro_max").unwrap();
        assert_eq!(pro_max.linkedin_messages, UNLIMITED_CREDITS);

        let boost = catalog.plan("career_boost_plus").unwrap();
        assert_eq!(boost.linkedin_messages, UNLIMITED_CREDITS);
    }

    #[test]
    fn unknown_ids_return_none_instead_of_failing() {
        let catalog = PlanCatalog::builtin();
        assert!(catalog.plan("legacy_plan_2021").is_none());
        assert!(catalog.add_on("legacy_addon").is_none());
    }

    #[test]
    fn price_minor_converts_rupees_to_paise() {
        let catalog = PlanCatalog::builtin();
        assert_eq!(catalog.plan("lite_check").unwrap().price_minor(), 9_900);
        assert_eq!(
            catalog.plan("career_pro_max").unwrap().price_minor(),
            199_900
        );
    }

    #[test]
    fn add_on_kinds_map_to_credit_kinds() {
        let catalog = PlanCatalog::builtin();
        let messages = catalog.add_on("linkedin_messages_50").unwrap();
        assert_eq!(
            CreditKind::from_str(&messages.kind),
            Some(CreditKind::LinkedinMessages)
        );
        assert_eq!(messages.quantity, 50);

        // Service add-ons are purchasable but never feed the ledger.
        let session = catalog.add_on("resume_guidance_session").unwrap();
        assert!(CreditKind::from_str(&session.kind).is_none());
    }
}

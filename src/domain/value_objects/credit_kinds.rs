use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The four countable entitlement categories. The canonical string tags are
/// the ones persisted on add-on credit rows and accepted by the consume route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditKind {
    Optimization,
    ScoreCheck,
    LinkedinMessages,
    GuidedBuild,
}

impl CreditKind {
    pub const ALL: [CreditKind; 4] = [
        CreditKind::Optimization,
        CreditKind::ScoreCheck,
        CreditKind::LinkedinMessages,
        CreditKind::GuidedBuild,
    ];

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "optimization" => Some(CreditKind::Optimization),
            "score_check" => Some(CreditKind::ScoreCheck),
            "linkedin_messages" => Some(CreditKind::LinkedinMessages),
            "guided_build" => Some(CreditKind::GuidedBuild),
            _ => None,
        }
    }
}

impl Display for CreditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            CreditKind::Optimization => "optimization",
            CreditKind::ScoreCheck => "score_check",
            CreditKind::LinkedinMessages => "linkedin_messages",
            CreditKind::GuidedBuild => "guided_build",
        };
        write!(f, "{}", kind)
    }
}

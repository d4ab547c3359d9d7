use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Basic,
    Premium,
    Elite,
}

/// Everything a plan decides, in one place. Catalog filtering, pricing and
/// capacity checks all read from this table instead of matching on plan names.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PlanRules {
    pub plan: Plan,
    pub guest_cap: Option<u32>,
    pub chrome_colors: bool,
    pub add_ons_included: bool,
    pub lights_included: bool,
    pub offers_premium_bundle: bool,
    pub included_items: &'static [&'static str],
}

const BASIC: PlanRules = PlanRules {
    plan: Plan::Basic,
    guest_cap: None,
    chrome_colors: false,
    add_ons_included: false,
    lights_included: false,
    offers_premium_bundle: false,
    included_items: &[],
};

const PREMIUM: PlanRules = PlanRules {
    plan: Plan::Premium,
    guest_cap: Some(30),
    chrome_colors: true,
    add_ons_included: false,
    lights_included: false,
    offers_premium_bundle: true,
    included_items: &["welcome drink"],
};

const ELITE: PlanRules = PlanRules {
    plan: Plan::Elite,
    guest_cap: Some(50),
    chrome_colors: true,
    add_ons_included: true,
    lights_included: true,
    offers_premium_bundle: false,
    included_items: &["all basic add-ons", "LED name light", "age light", "welcome drink"],
};

impl Plan {
    pub const ALL: [Plan; 3] = [Plan::Basic, Plan::Premium, Plan::Elite];

    pub fn rules(self) -> &'static PlanRules {
        match self {
            Plan::Basic => &BASIC,
            Plan::Premium => &PREMIUM,
            Plan::Elite => &ELITE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Basic => "basic",
            Plan::Premium => "premium",
            Plan::Elite => "elite",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Some(Plan::Basic),
            "premium" => Some(Plan::Premium),
            "elite" => Some(Plan::Elite),
            _ => None,
        }
    }

    /// Empty restriction lists mean the item is offered on every plan.
    pub fn is_allowed_by(self, restriction: &[Plan]) -> bool {
        restriction.is_empty() || restriction.contains(&self)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

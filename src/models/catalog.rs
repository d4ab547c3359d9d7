use serde::{Deserialize, Serialize};

use super::Plan;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Decoration {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub plan_tier: Plan,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddOn {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub max_quantity: u32,
    #[serde(default)]
    pub requires_name: bool,
    #[serde(default)]
    pub plans: Vec<Plan>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorTier {
    Standard,
    Chrome,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BalloonColor {
    pub id: String,
    pub name: String,
    pub hex: String,
    pub tier: ColorTier,
    #[serde(default)]
    pub plans: Vec<Plan>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WelcomeDrink {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub plans: Vec<Plan>,
}

/// A complete snapshot of reference data, as served by a catalog source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub decorations: Vec<Decoration>,
    #[serde(default)]
    pub add_ons: Vec<AddOn>,
    #[serde(default)]
    pub balloon_colors: Vec<BalloonColor>,
    #[serde(default)]
    pub welcome_drinks: Vec<WelcomeDrink>,
}

impl BalloonColor {
    pub fn is_available_for(&self, plan: Plan) -> bool {
        let tier_ok = match self.tier {
            ColorTier::Standard => true,
            ColorTier::Chrome => plan.rules().chrome_colors,
        };
        tier_ok && plan.is_allowed_by(&self.plans)
    }
}

impl CatalogData {
    pub fn decorations_for_plan(&self, plan: Plan) -> Vec<&Decoration> {
        self.decorations
            .iter()
            .filter(|d| d.plan_tier == plan)
            .collect()
    }

    pub fn add_ons_for_plan(&self, plan: Plan) -> Vec<&AddOn> {
        self.add_ons
            .iter()
            .filter(|a| plan.is_allowed_by(&a.plans))
            .collect()
    }

    pub fn colors_for_plan(&self, plan: Plan) -> Vec<&BalloonColor> {
        self.balloon_colors
            .iter()
            .filter(|c| c.is_available_for(plan))
            .collect()
    }

    pub fn drinks_for_plan(&self, plan: Plan) -> Vec<&WelcomeDrink> {
        self.welcome_drinks
            .iter()
            .filter(|d| plan.is_allowed_by(&d.plans))
            .collect()
    }

    pub fn decoration(&self, id: &str) -> Option<&Decoration> {
        self.decorations.iter().find(|d| d.id == id)
    }

    pub fn add_on(&self, id: &str) -> Option<&AddOn> {
        self.add_ons.iter().find(|a| a.id == id)
    }

    pub fn color(&self, id: &str) -> Option<&BalloonColor> {
        self.balloon_colors.iter().find(|c| c.id == id)
    }

    pub fn drink(&self, id: &str) -> Option<&WelcomeDrink> {
        self.welcome_drinks.iter().find(|d| d.id == id)
    }
}

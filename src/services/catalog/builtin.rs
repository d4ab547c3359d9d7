use async_trait::async_trait;

use super::CatalogSource;
use crate::models::{AddOn, BalloonColor, CatalogData, ColorTier, Decoration, Plan, WelcomeDrink};

pub const SOURCE_NAME: &str = "builtin";

pub struct BuiltinCatalog;

#[async_trait]
impl CatalogSource for BuiltinCatalog {
    async fn fetch(&self) -> anyhow::Result<CatalogData> {
        Ok(reference_data())
    }

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }
}

fn decoration(id: &str, name: &str, price: i64, plan_tier: Plan) -> Decoration {
    Decoration {
        id: id.to_string(),
        name: name.to_string(),
        price,
        plan_tier,
    }
}

fn add_on(
    id: &str,
    name: &str,
    price: i64,
    max_quantity: u32,
    requires_name: bool,
    plans: &[Plan],
) -> AddOn {
    AddOn {
        id: id.to_string(),
        name: name.to_string(),
        price,
        max_quantity,
        requires_name,
        plans: plans.to_vec(),
    }
}

fn color(id: &str, name: &str, hex: &str, tier: ColorTier) -> BalloonColor {
    BalloonColor {
        id: id.to_string(),
        name: name.to_string(),
        hex: hex.to_string(),
        tier,
        plans: vec![],
    }
}

fn drink(id: &str, name: &str, plans: &[Plan]) -> WelcomeDrink {
    WelcomeDrink {
        id: id.to_string(),
        name: name.to_string(),
        plans: plans.to_vec(),
    }
}

/// The fixed reference list used when no remote catalog is configured or
/// when the configured one cannot be reached.
pub fn reference_data() -> CatalogData {
    use ColorTier::{Chrome, Standard};
    use Plan::{Basic, Elite, Premium};

    CatalogData {
        decorations: vec![
            decoration("basic-balloon-arch", "Classic Balloon Arch", 2000, Basic),
            decoration("basic-pastel-dream", "Pastel Dream", 2500, Basic),
            decoration("premium-royal-theme", "Royal Theme", 3500, Premium),
            decoration("premium-floral-elegance", "Floral Elegance", 4200, Premium),
            decoration("elite-grand-celebration", "Grand Celebration", 5900, Elite),
            decoration("elite-starry-night", "Starry Night Lounge", 6500, Elite),
        ],
        add_ons: vec![
            add_on("crown", "Crown", 120, 1, false, &[]),
            add_on("party-poppers", "Party Poppers", 60, 6, false, &[]),
            add_on("sash", "Name Sash", 150, 2, true, &[]),
            add_on("cake-topper", "Name Cake Topper", 200, 1, true, &[]),
            add_on("photo-props", "Photo Booth Props", 250, 1, false, &[]),
            add_on("fog-entry", "Fog Entry", 800, 1, false, &[Premium, Elite]),
            add_on("cold-pyro", "Cold Pyro Pair", 1200, 2, false, &[Premium, Elite]),
        ],
        balloon_colors: vec![
            color("red", "Red", "#E53935", Standard),
            color("pink", "Baby Pink", "#F8BBD0", Standard),
            color("blue", "Sky Blue", "#81D4FA", Standard),
            color("white", "White", "#FFFFFF", Standard),
            color("gold", "Gold", "#FFD54F", Standard),
            color("purple", "Lavender", "#B39DDB", Standard),
            color("black", "Black", "#212121", Standard),
            color("chrome-gold", "Chrome Gold", "#D4AF37", Chrome),
            color("chrome-silver", "Chrome Silver", "#C0C0C0", Chrome),
            color("chrome-rose-gold", "Chrome Rose Gold", "#B76E79", Chrome),
        ],
        welcome_drinks: vec![
            drink("fresh-lime", "Fresh Lime Soda", &[]),
            drink("mango-cooler", "Mango Cooler", &[]),
            drink("virgin-mojito", "Virgin Mojito", &[Premium, Elite]),
            drink("blue-lagoon", "Blue Lagoon Mocktail", &[Elite]),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_plan_has_decorations() {
        let data = reference_data();
        for plan in Plan::ALL {
            assert!(!data.decorations_for_plan(plan).is_empty(), "{plan}");
        }
    }

    #[test]
    fn test_decorations_filtered_by_tier() {
        let data = reference_data();
        assert!(data
            .decorations_for_plan(Plan::Premium)
            .iter()
            .all(|d| d.plan_tier == Plan::Premium));
    }

    #[test]
    fn test_restricted_add_ons_hidden_from_basic() {
        let data = reference_data();
        let basic: Vec<&str> = data
            .add_ons_for_plan(Plan::Basic)
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert!(basic.contains(&"crown"));
        assert!(!basic.contains(&"fog-entry"));
        assert_eq!(data.add_ons_for_plan(Plan::Elite).len(), data.add_ons.len());
    }

    #[test]
    fn test_chrome_colors_only_on_upper_plans() {
        let data = reference_data();
        let chrome_on = |plan| {
            data.colors_for_plan(plan)
                .iter()
                .filter(|c| c.tier == ColorTier::Chrome)
                .count()
        };
        assert_eq!(chrome_on(Plan::Basic), 0);
        assert_eq!(chrome_on(Plan::Premium), 3);
        assert_eq!(chrome_on(Plan::Elite), 3);
    }

    #[test]
    fn test_drinks_for_plan() {
        let data = reference_data();
        assert_eq!(data.drinks_for_plan(Plan::Basic).len(), 2);
        assert_eq!(data.drinks_for_plan(Plan::Elite).len(), 4);
    }
}

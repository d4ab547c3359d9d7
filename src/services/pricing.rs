use crate::errors::AppError;
use crate::models::{
    AddOnSelection, Decoration, EnhancedFeatureSelection, Plan, PricingBreakdown, ADVANCE_AMOUNT,
};

/// Per-unit price of hanging photos, and of each light when the plan does
/// not include it.
pub const ENHANCED_UNIT_PRICE: i64 = 80;
pub const PREMIUM_BUNDLE_PRICE: i64 = 300;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanOptions {
    /// Crown, popper and sash bundle. Only priced on plans that offer it.
    pub premium_bundle: bool,
}

pub fn compute_pricing(
    plan: Plan,
    decoration: &Decoration,
    add_ons: &[AddOnSelection],
    enhanced: &EnhancedFeatureSelection,
    options: &PlanOptions,
) -> Result<PricingBreakdown, AppError> {
    enhanced.validate()?;

    if decoration.plan_tier != plan {
        return Err(AppError::invalid(format!(
            "decoration '{}' belongs to the {} plan, not {plan}",
            decoration.id, decoration.plan_tier
        )));
    }
    if decoration.price <= 0 {
        return Err(AppError::invalid(format!(
            "decoration '{}' has no valid price",
            decoration.id
        )));
    }
    if let Some(bad) = add_ons.iter().find(|a| a.unit_price < 0 || a.quantity == 0) {
        return Err(AppError::invalid(format!(
            "add-on '{}' has an invalid price or quantity",
            bad.addon_id
        )));
    }

    let rules = plan.rules();

    // Catalog prices may come from a remote source, so every sum is checked.
    let out_of_range = || AppError::invalid("selection total is out of range");

    let mut add_ons_price = if rules.add_ons_included {
        0
    } else {
        add_ons
            .iter()
            .try_fold(0i64, |acc, a| a.line_total().and_then(|line| acc.checked_add(line)))
            .ok_or_else(out_of_range)?
    };
    if rules.offers_premium_bundle && options.premium_bundle {
        add_ons_price = add_ons_price
            .checked_add(PREMIUM_BUNDLE_PRICE)
            .ok_or_else(out_of_range)?;
    }

    let light_price = if rules.lights_included { 0 } else { ENHANCED_UNIT_PRICE };
    let mut enhanced_features_price = i64::from(enhanced.hanging_photo_count) * ENHANCED_UNIT_PRICE;
    if enhanced.led_light_name.is_some() {
        enhanced_features_price += light_price;
    }
    if enhanced.age_light_value.is_some() {
        enhanced_features_price += light_price;
    }

    let total_amount = decoration
        .price
        .checked_add(add_ons_price)
        .and_then(|t| t.checked_add(enhanced_features_price))
        .ok_or_else(out_of_range)?;

    Ok(PricingBreakdown {
        decoration_price: decoration.price,
        add_ons_price,
        enhanced_features_price,
        total_amount,
        advance_paid: ADVANCE_AMOUNT,
        balance_amount: (total_amount - ADVANCE_AMOUNT).max(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoration(price: i64, plan_tier: Plan) -> Decoration {
        Decoration {
            id: "deco".to_string(),
            name: "Deco".to_string(),
            price,
            plan_tier,
        }
    }

    fn add_on(id: &str, unit_price: i64, quantity: u32) -> AddOnSelection {
        AddOnSelection {
            addon_id: id.to_string(),
            name: id.to_string(),
            unit_price,
            quantity,
            custom_text: None,
        }
    }

    #[test]
    fn test_basic_plan_with_crown() {
        let pricing = compute_pricing(
            Plan::Basic,
            &decoration(2000, Plan::Basic),
            &[add_on("crown", 120, 1)],
            &EnhancedFeatureSelection::default(),
            &PlanOptions::default(),
        )
        .unwrap();

        assert_eq!(pricing.add_ons_price, 120);
        assert_eq!(pricing.total_amount, 2120);
        assert_eq!(pricing.advance_paid, 500);
        assert_eq!(pricing.balance_amount, 1620);
    }

    #[test]
    fn test_elite_lights_included_photos_charged() {
        let enhanced = EnhancedFeatureSelection {
            hanging_photo_count: 3,
            led_light_name: Some("Aria".to_string()),
            age_light_value: Some("25".to_string()),
        };
        let pricing = compute_pricing(
            Plan::Elite,
            &decoration(5900, Plan::Elite),
            &[],
            &enhanced,
            &PlanOptions::default(),
        )
        .unwrap();

        assert_eq!(pricing.enhanced_features_price, 240);
        assert_eq!(pricing.total_amount, 6140);
        assert_eq!(pricing.balance_amount, 5640);
    }

    #[test]
    fn test_elite_add_ons_are_free() {
        let pricing = compute_pricing(
            Plan::Elite,
            &decoration(5900, Plan::Elite),
            &[add_on("crown", 120, 1), add_on("party-poppers", 60, 6)],
            &EnhancedFeatureSelection {
                hanging_photo_count: 2,
                ..Default::default()
            },
            &PlanOptions::default(),
        )
        .unwrap();

        assert_eq!(pricing.add_ons_price, 0);
        assert_eq!(pricing.enhanced_features_price, 160);
    }

    #[test]
    fn test_lights_charged_outside_elite() {
        let enhanced = EnhancedFeatureSelection {
            hanging_photo_count: 1,
            led_light_name: Some("Kabir".to_string()),
            age_light_value: Some("1".to_string()),
        };
        let pricing = compute_pricing(
            Plan::Premium,
            &decoration(3500, Plan::Premium),
            &[],
            &enhanced,
            &PlanOptions::default(),
        )
        .unwrap();
        assert_eq!(pricing.enhanced_features_price, 240);
    }

    #[test]
    fn test_premium_bundle_only_on_premium() {
        let options = PlanOptions { premium_bundle: true };
        let premium = compute_pricing(
            Plan::Premium,
            &decoration(3500, Plan::Premium),
            &[add_on("party-poppers", 60, 2)],
            &EnhancedFeatureSelection::default(),
            &options,
        )
        .unwrap();
        assert_eq!(premium.add_ons_price, 420);
        assert_eq!(premium.total_amount, 3920);

        let basic = compute_pricing(
            Plan::Basic,
            &decoration(2000, Plan::Basic),
            &[],
            &EnhancedFeatureSelection::default(),
            &options,
        )
        .unwrap();
        assert_eq!(basic.add_ons_price, 0);
    }

    #[test]
    fn test_decoration_must_match_plan() {
        let result = compute_pricing(
            Plan::Basic,
            &decoration(5900, Plan::Elite),
            &[],
            &EnhancedFeatureSelection::default(),
            &PlanOptions::default(),
        );
        assert!(matches!(result, Err(AppError::InvalidSelection(_))));
    }

    #[test]
    fn test_too_many_photos_rejected_not_clamped() {
        let result = compute_pricing(
            Plan::Basic,
            &decoration(2000, Plan::Basic),
            &[],
            &EnhancedFeatureSelection {
                hanging_photo_count: 10,
                ..Default::default()
            },
            &PlanOptions::default(),
        );
        assert!(matches!(result, Err(AppError::InvalidSelection(_))));
    }

    #[test]
    fn test_order_of_add_ons_does_not_matter() {
        let deco = decoration(2500, Plan::Basic);
        let enhanced = EnhancedFeatureSelection::default();
        let forward = [add_on("crown", 120, 1), add_on("sash", 150, 2), add_on("party-poppers", 60, 3)];
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = compute_pricing(Plan::Basic, &deco, &forward, &enhanced, &PlanOptions::default()).unwrap();
        let b = compute_pricing(Plan::Basic, &deco, &reversed, &enhanced, &PlanOptions::default()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.add_ons_price, 600);
    }

    #[test]
    fn test_balance_never_negative() {
        let pricing = compute_pricing(
            Plan::Basic,
            &decoration(300, Plan::Basic),
            &[],
            &EnhancedFeatureSelection::default(),
            &PlanOptions::default(),
        )
        .unwrap();
        assert_eq!(pricing.total_amount, 300);
        assert_eq!(pricing.balance_amount, 0);
    }

    #[test]
    fn test_oversized_add_on_line_rejected() {
        let result = compute_pricing(
            Plan::Premium,
            &decoration(3500, Plan::Premium),
            &[add_on("cold-pyro", i64::MAX / 2 + 1, 2)],
            &EnhancedFeatureSelection::default(),
            &PlanOptions::default(),
        );
        assert!(matches!(result, Err(AppError::InvalidSelection(_))));
    }

    #[test]
    fn test_oversized_total_rejected() {
        let result = compute_pricing(
            Plan::Basic,
            &decoration(i64::MAX - 100, Plan::Basic),
            &[add_on("crown", 120, 1)],
            &EnhancedFeatureSelection::default(),
            &PlanOptions::default(),
        );
        assert!(matches!(result, Err(AppError::InvalidSelection(_))));
    }
}

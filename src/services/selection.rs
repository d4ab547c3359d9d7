use std::collections::HashSet;

use crate::errors::AppError;
use crate::models::selection::{non_empty, MAX_CUSTOM_TEXT_CHARS};
use crate::models::{
    AddOnRequest, AddOnSelection, BalloonColorSelection, CatalogData, Decoration,
    EnhancedFeatureSelection, Plan, PricingBreakdown, SelectionRequest,
};
use crate::services::pricing::{compute_pricing, PlanOptions};

/// A selection checked against the catalog, with catalog prices copied in.
#[derive(Debug, Clone)]
pub struct ResolvedSelection {
    pub plan: Plan,
    pub decoration: Decoration,
    pub add_ons: Vec<AddOnSelection>,
    pub enhanced_features: EnhancedFeatureSelection,
    pub balloon_colors: BalloonColorSelection,
    pub welcome_drink_id: Option<String>,
    pub premium_bundle: bool,
}

impl ResolvedSelection {
    pub fn price(&self) -> Result<PricingBreakdown, AppError> {
        compute_pricing(
            self.plan,
            &self.decoration,
            &self.add_ons,
            &self.enhanced_features,
            &PlanOptions {
                premium_bundle: self.premium_bundle,
            },
        )
    }
}

pub fn resolve(catalog: &CatalogData, req: &SelectionRequest) -> Result<ResolvedSelection, AppError> {
    let plan = req.plan;

    let decoration = catalog
        .decoration(req.decoration_id.trim())
        .ok_or_else(|| AppError::invalid(format!("unknown decoration '{}'", req.decoration_id)))?;
    if decoration.plan_tier != plan {
        return Err(AppError::invalid(format!(
            "decoration '{}' is not offered on the {plan} plan",
            decoration.id
        )));
    }

    let mut seen = HashSet::new();
    let mut add_ons = Vec::with_capacity(req.add_ons.len());
    for item in &req.add_ons {
        if !seen.insert(item.addon_id.as_str()) {
            return Err(AppError::invalid(format!(
                "add-on '{}' selected more than once",
                item.addon_id
            )));
        }
        add_ons.push(resolve_add_on(catalog, plan, item)?);
    }

    let enhanced_features = req.enhanced_features.clone().normalized();
    enhanced_features.validate()?;

    let mut balloon_colors = BalloonColorSelection::new();
    for id in &req.balloon_colors {
        let color = catalog
            .color(id.trim())
            .ok_or_else(|| AppError::invalid(format!("unknown balloon color '{id}'")))?;
        balloon_colors.add(color, plan)?;
    }

    let welcome_drink_id = match non_empty(req.welcome_drink_id.clone()) {
        Some(id) => {
            let drink = catalog
                .drink(&id)
                .ok_or_else(|| AppError::invalid(format!("unknown welcome drink '{id}'")))?;
            if !plan.is_allowed_by(&drink.plans) {
                return Err(AppError::invalid(format!(
                    "welcome drink '{id}' is not offered on the {plan} plan"
                )));
            }
            Some(id)
        }
        None => None,
    };

    Ok(ResolvedSelection {
        plan,
        decoration: decoration.clone(),
        add_ons,
        enhanced_features,
        balloon_colors,
        welcome_drink_id,
        premium_bundle: req.premium_bundle && plan.rules().offers_premium_bundle,
    })
}

fn resolve_add_on(
    catalog: &CatalogData,
    plan: Plan,
    item: &AddOnRequest,
) -> Result<AddOnSelection, AppError> {
    let addon = catalog
        .add_on(item.addon_id.trim())
        .ok_or_else(|| AppError::invalid(format!("unknown add-on '{}'", item.addon_id)))?;

    if !plan.is_allowed_by(&addon.plans) {
        return Err(AppError::invalid(format!(
            "add-on '{}' is not offered on the {plan} plan",
            addon.id
        )));
    }
    if addon.price < 0 {
        return Err(AppError::invalid(format!("add-on '{}' has no valid price", addon.id)));
    }
    if item.quantity == 0 || item.quantity > addon.max_quantity {
        return Err(AppError::invalid(format!(
            "quantity for '{}' must be between 1 and {}",
            addon.id, addon.max_quantity
        )));
    }

    let custom_text = non_empty(item.custom_text.clone());
    match (&custom_text, addon.requires_name) {
        (None, true) => {
            return Err(AppError::invalid(format!("add-on '{}' needs a name", addon.id)));
        }
        (Some(_), false) => {
            return Err(AppError::invalid(format!(
                "add-on '{}' does not take custom text",
                addon.id
            )));
        }
        (Some(text), true) if text.chars().count() > MAX_CUSTOM_TEXT_CHARS => {
            return Err(AppError::invalid(format!(
                "name for '{}' must be at most {MAX_CUSTOM_TEXT_CHARS} characters",
                addon.id
            )));
        }
        _ => {}
    }

    Ok(AddOnSelection {
        addon_id: addon.id.clone(),
        name: addon.name.clone(),
        unit_price: addon.price,
        quantity: item.quantity,
        custom_text,
    })
}

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::{AddOn, BalloonColor, Decoration, Plan, PlanRules, WelcomeDrink};
use crate::services::catalog::{self, CatalogOrigin};
use crate::state::AppState;

use super::extract::AppPath;

// GET /api/catalog/:plan
#[derive(Serialize)]
pub struct CatalogResponse {
    plan: Plan,
    rules: PlanRules,
    decorations: Vec<Decoration>,
    add_ons: Vec<AddOn>,
    balloon_colors: Vec<BalloonColor>,
    welcome_drinks: Vec<WelcomeDrink>,
    source: CatalogOrigin,
}

pub async fn get_catalog(
    State(state): State<Arc<AppState>>,
    AppPath(plan): AppPath<String>,
) -> Result<Json<CatalogResponse>, AppError> {
    let plan = Plan::parse(&plan).ok_or_else(|| AppError::NotFound(format!("plan {plan}")))?;
    let snapshot = catalog::load(state.catalog.as_ref()).await;
    let data = &snapshot.data;

    Ok(Json(CatalogResponse {
        plan,
        rules: *plan.rules(),
        decorations: data.decorations_for_plan(plan).into_iter().cloned().collect(),
        add_ons: data.add_ons_for_plan(plan).into_iter().cloned().collect(),
        balloon_colors: data.colors_for_plan(plan).into_iter().cloned().collect(),
        welcome_drinks: data.drinks_for_plan(plan).into_iter().cloned().collect(),
        source: snapshot.origin,
    }))
}

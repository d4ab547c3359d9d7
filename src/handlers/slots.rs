use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::NaiveDate;

use crate::errors::AppError;
use crate::models::TimeSlot;
use crate::services::slots::{self, DayReport};
use crate::state::AppState;

use super::admin::check_auth;
use super::extract::AppPath;

// GET /api/slots/available/:date
pub async fn available_slots(
    State(state): State<Arc<AppState>>,
    AppPath(date): AppPath<NaiveDate>,
) -> Result<Json<Vec<TimeSlot>>, AppError> {
    let conn = state.conn()?;
    Ok(Json(slots::list_available_slots(&conn, &date)?))
}

// GET /api/slots/:date
pub async fn slot_grid(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppPath(date): AppPath<NaiveDate>,
) -> Result<Json<DayReport>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let conn = state.conn()?;
    Ok(Json(slots::day_report(
        &conn,
        &date,
        state.config.daily_guest_capacity,
    )?))
}

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    AddOnSelection, Booking, BookingEvent, BookingRequest, BookingStatus, PaymentStatus, Plan,
    PricingBreakdown, SelectionRequest,
};
use crate::services::lifecycle::{self, LifecycleUpdate, ReservationOptions};
use crate::services::{catalog, selection, verification};
use crate::state::AppState;

use super::admin::check_auth;
use super::extract::{AppJson, AppPath, AppQuery};

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<BookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let snapshot = catalog::load(state.catalog.as_ref()).await;

    let outcome = {
        let mut conn = state.conn()?;
        lifecycle::create_booking(
            &mut conn,
            &snapshot.data,
            body,
            &ReservationOptions {
                qr_secret: &state.config.qr_secret,
                guest_limit: state.config.enforced_guest_limit(),
            },
        )
    };

    let outcome = match outcome {
        Ok(o) => o,
        Err(e) => {
            tracing::info!(error = e.code(), reason = %e, "booking rejected");
            return Err(e);
        }
    };

    state.publish(outcome.events);
    Ok((StatusCode::CREATED, Json(outcome.booking)))
}

// POST /api/quote
#[derive(Serialize)]
pub struct QuoteResponse {
    plan: Plan,
    decoration_id: String,
    add_ons: Vec<AddOnSelection>,
    premium_bundle: bool,
    included_items: &'static [&'static str],
    #[serde(flatten)]
    pricing: PricingBreakdown,
}

pub async fn quote(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<SelectionRequest>,
) -> Result<Json<QuoteResponse>, AppError> {
    let snapshot = catalog::load(state.catalog.as_ref()).await;
    let resolved = selection::resolve(&snapshot.data, &body)?;
    let pricing = resolved.price()?;

    Ok(Json(QuoteResponse {
        plan: resolved.plan,
        decoration_id: resolved.decoration.id,
        add_ons: resolved.add_ons,
        premium_bundle: resolved.premium_bundle,
        included_items: resolved.plan.rules().included_items,
        pricing,
    }))
}

// GET /api/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    #[serde(rename = "bookingId")]
    pub booking_id: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppQuery(query): AppQuery<BookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let conn = state.conn()?;

    if let Some(code) = query.booking_id.as_deref() {
        let booking = verification::resolve_scanned(&conn, code, &state.config.qr_secret)?;
        return Ok(Json(vec![booking]));
    }

    let status = match query.status.as_deref() {
        Some(s) => Some(
            BookingStatus::parse(s)
                .ok_or_else(|| AppError::invalid(format!("unknown status '{s}'")))?,
        ),
        None => None,
    };
    let limit = query.limit.unwrap_or(50);

    Ok(Json(queries::get_all_bookings(&conn, status, limit)?))
}

// GET /api/bookings/date/:date
pub async fn bookings_for_date(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppPath(date): AppPath<NaiveDate>,
) -> Result<Json<Vec<Booking>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let conn = state.conn()?;
    Ok(Json(queries::get_bookings_for_date(&conn, &date)?))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppPath(id): AppPath<String>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let conn = state.conn()?;
    Ok(Json(verification::find_by_code(&conn, &id)?))
}

// GET /api/bookings/:id/events
pub async fn booking_events(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppPath(id): AppPath<String>,
) -> Result<Json<Vec<BookingEvent>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let conn = state.conn()?;
    let id = verification::normalize_code(&id);
    Ok(Json(queries::get_booking_events(&conn, &id)?))
}

// PUT /api/bookings/:id
#[derive(Deserialize)]
pub struct UpdateBookingRequest {
    pub status: Option<BookingStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub verified_by: Option<String>,
}

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppPath(id): AppPath<String>,
    AppJson(body): AppJson<UpdateBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if body.status.is_none() && body.payment_status.is_none() {
        return Err(AppError::invalid("nothing to update"));
    }

    let outcome = {
        let mut conn = state.conn()?;
        lifecycle::apply_update(
            &mut conn,
            &verification::normalize_code(&id),
            &LifecycleUpdate {
                status: body.status,
                payment_status: body.payment_status,
                actor: body.verified_by,
                check_in: false,
            },
        )?
    };

    state.publish(outcome.events);
    Ok(Json(outcome.booking))
}

// DELETE /api/bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppPath(id): AppPath<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let event = {
        let mut conn = state.conn()?;
        lifecycle::delete_booking(&mut conn, &verification::normalize_code(&id))?
    };

    state.publish(vec![event]);
    Ok(Json(serde_json::json!({"ok": true})))
}

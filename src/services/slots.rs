use chrono::NaiveDate;
use rusqlite::{Connection, ErrorCode};
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, TimeSlot};

/// Fixed slots minus the ones held by live bookings, recomputed from
/// storage on every call.
pub fn list_available_slots(conn: &Connection, date: &NaiveDate) -> Result<Vec<TimeSlot>, AppError> {
    let occupied: Vec<TimeSlot> = queries::occupied_slot_labels(conn, date)?
        .iter()
        .filter_map(|label| TimeSlot::parse(label))
        .collect();

    Ok(TimeSlot::all().filter(|s| !occupied.contains(s)).collect())
}

/// Claims (date, slot) for `booking` by inserting it. Must run inside the
/// transaction that owns the insert; the unique index on live slots backs
/// up the re-check if another writer gets in first.
pub fn reserve(
    conn: &Connection,
    booking: &Booking,
    guest_limit: Option<u32>,
) -> Result<(), AppError> {
    if let Some(holder) = queries::slot_holder(conn, &booking.event_date, booking.time_slot)? {
        tracing::warn!(
            date = %booking.event_date,
            slot = %booking.time_slot,
            held_by = %holder,
            "slot already taken at reservation time"
        );
        return Err(AppError::SlotUnavailable);
    }

    if let Some(limit) = guest_limit {
        let booked = queries::guests_booked_on(conn, &booking.event_date)?;
        if booked + i64::from(booking.guest_count) > i64::from(limit) {
            return Err(AppError::invalid(format!(
                "daily guest capacity of {limit} would be exceeded ({booked} already booked)"
            )));
        }
    }

    queries::insert_booking(conn, booking).map_err(classify_insert_error)
}

fn classify_insert_error(err: rusqlite::Error) -> AppError {
    if let rusqlite::Error::SqliteFailure(e, Some(msg)) = &err {
        if e.code == ErrorCode::ConstraintViolation {
            if msg.contains("bookings.booking_id") {
                return AppError::DuplicateBookingId;
            }
            if msg.contains("bookings.event_date") {
                return AppError::SlotUnavailable;
            }
        }
    }
    AppError::Database(err)
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotState {
    pub time_slot: TimeSlot,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayReport {
    pub date: NaiveDate,
    pub slots: Vec<SlotState>,
    pub available_count: usize,
    pub guests_booked: i64,
    pub daily_capacity: u32,
    pub over_capacity: bool,
}

/// Slot grid for the admin view, with the advisory guest total.
pub fn day_report(conn: &Connection, date: &NaiveDate, daily_capacity: u32) -> Result<DayReport, AppError> {
    let bookings = queries::get_bookings_for_date(conn, date)?;

    let slots: Vec<SlotState> = TimeSlot::all()
        .map(|slot| match bookings.iter().find(|b| b.time_slot == slot) {
            Some(b) => SlotState {
                time_slot: slot,
                available: false,
                booking_id: Some(b.booking_id.clone()),
                status: Some(b.status),
                guest_count: Some(b.guest_count),
            },
            None => SlotState {
                time_slot: slot,
                available: true,
                booking_id: None,
                status: None,
                guest_count: None,
            },
        })
        .collect();

    let guests_booked: i64 = bookings.iter().map(|b| i64::from(b.guest_count)).sum();

    Ok(DayReport {
        date: *date,
        available_count: slots.iter().filter(|s| s.available).count(),
        slots,
        guests_booked,
        daily_capacity,
        over_capacity: guests_booked > i64::from(daily_capacity),
    })
}

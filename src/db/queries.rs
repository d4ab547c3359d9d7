use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{
    AddOnSelection, BalloonColorSelection, Booking, BookingEvent, BookingStatus,
    EnhancedFeatureSelection, PaymentStatus, Plan, PricingBreakdown, TimeSlot,
};

const DATE_FMT: &str = "%Y-%m-%d";
const TS_FMT: &str = "%Y-%m-%d %H:%M:%S";

const BOOKING_COLUMNS: &str = "booking_id, applicant_name, contact, event_type, honoree_name, partner_name, \
     event_date, time_slot, guest_count, plan, decoration_id, decoration_name, add_ons, \
     enhanced_features, balloon_colors, welcome_drink_id, premium_bundle, notes, \
     decoration_price, add_ons_price, enhanced_features_price, total_amount, advance_paid, \
     balance_amount, status, payment_status, is_verified, verified_at, verified_by, qr_payload, \
     created_at, updated_at";

// ── Bookings ──

/// Plain insert. Constraint violations are returned untouched so the caller
/// can tell a taken slot from a taken id.
pub fn insert_booking(conn: &Connection, booking: &Booking) -> rusqlite::Result<()> {
    let add_ons = to_json(&booking.add_ons)?;
    let enhanced = to_json(&booking.enhanced_features)?;
    let colors = to_json(&booking.balloon_colors)?;
    let p = &booking.pricing;

    conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS}) VALUES \
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, \
              ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32)"
        ),
        params![
            booking.booking_id,
            booking.applicant_name,
            booking.contact,
            booking.event_type,
            booking.honoree_name,
            booking.partner_name,
            booking.event_date.format(DATE_FMT).to_string(),
            booking.time_slot.label(),
            booking.guest_count,
            booking.plan.as_str(),
            booking.decoration_id,
            booking.decoration_name,
            add_ons,
            enhanced,
            colors,
            booking.welcome_drink_id,
            booking.premium_bundle,
            booking.notes,
            p.decoration_price,
            p.add_ons_price,
            p.enhanced_features_price,
            p.total_amount,
            p.advance_paid,
            p.balance_amount,
            booking.status.as_str(),
            booking.payment_status.as_str(),
            booking.is_verified,
            booking.verified_at.map(|t| t.format(TS_FMT).to_string()),
            booking.verified_by,
            booking.qr_payload,
            booking.created_at.format(TS_FMT).to_string(),
            booking.updated_at.format(TS_FMT).to_string(),
        ],
    )?;
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> rusqlite::Result<String> {
    serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Live (non-cancelled) bookings on a date, in slot order.
pub fn get_bookings_for_date(conn: &Connection, date: &NaiveDate) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE event_date = ?1 AND status != 'cancelled'"
    ))?;

    let rows = stmt.query_map(params![date.format(DATE_FMT).to_string()], |row| {
        Ok(parse_booking_row(row))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    bookings.sort_by_key(|b| b.time_slot);
    Ok(bookings)
}

pub fn get_all_bookings(
    conn: &Connection,
    status_filter: Option<BookingStatus>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = ?1 \
                 ORDER BY event_date DESC, created_at DESC LIMIT ?2"
            ),
            vec![
                Box::new(status.as_str()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings \
                 ORDER BY event_date DESC, created_at DESC LIMIT ?1"
            ),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// The id of the live booking holding (date, slot), if any.
pub fn slot_holder(
    conn: &Connection,
    date: &NaiveDate,
    slot: TimeSlot,
) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT booking_id FROM bookings
         WHERE event_date = ?1 AND time_slot = ?2 AND status != 'cancelled'",
        params![date.format(DATE_FMT).to_string(), slot.label()],
        |row| row.get(0),
    )
    .optional()
}

/// Slot labels held by live bookings on a date.
pub fn occupied_slot_labels(conn: &Connection, date: &NaiveDate) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT time_slot FROM bookings WHERE event_date = ?1 AND status != 'cancelled'",
    )?;
    let rows = stmt.query_map(params![date.format(DATE_FMT).to_string()], |row| row.get(0))?;

    let mut labels = vec![];
    for row in rows {
        labels.push(row?);
    }
    Ok(labels)
}

pub fn guests_booked_on(conn: &Connection, date: &NaiveDate) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COALESCE(SUM(guest_count), 0) FROM bookings
         WHERE event_date = ?1 AND status != 'cancelled'",
        params![date.format(DATE_FMT).to_string()],
        |row| row.get(0),
    )
}

/// Persists the mutable lifecycle fields. Everything else on a booking is
/// written once at creation.
pub fn update_booking_lifecycle(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, payment_status = ?2, is_verified = ?3,
             verified_at = ?4, verified_by = ?5, updated_at = ?6
         WHERE booking_id = ?7",
        params![
            booking.status.as_str(),
            booking.payment_status.as_str(),
            booking.is_verified,
            booking.verified_at.map(|t| t.format(TS_FMT).to_string()),
            booking.verified_by,
            booking.updated_at.format(TS_FMT).to_string(),
            booking.booking_id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_booking(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE booking_id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let booking_id: String = row.get(0)?;
    let event_date_str: String = row.get(6)?;
    let time_slot_str: String = row.get(7)?;
    let plan_str: String = row.get(9)?;
    let add_ons_json: String = row.get(12)?;
    let enhanced_json: String = row.get(13)?;
    let colors_json: String = row.get(14)?;
    let status_str: String = row.get(24)?;
    let payment_str: String = row.get(25)?;
    let verified_at_str: Option<String> = row.get(27)?;
    let created_at_str: String = row.get(30)?;
    let updated_at_str: String = row.get(31)?;

    let ctx = |field: &str| format!("booking {booking_id}: bad {field}");

    let add_ons: Vec<AddOnSelection> =
        serde_json::from_str(&add_ons_json).with_context(|| ctx("add_ons"))?;
    let enhanced_features: EnhancedFeatureSelection =
        serde_json::from_str(&enhanced_json).with_context(|| ctx("enhanced_features"))?;
    enhanced_features
        .validate()
        .with_context(|| ctx("enhanced_features"))?;
    let balloon_colors: BalloonColorSelection =
        serde_json::from_str(&colors_json).with_context(|| ctx("balloon_colors"))?;
    balloon_colors
        .check_shape()
        .with_context(|| ctx("balloon_colors"))?;

    Ok(Booking {
        applicant_name: row.get(1)?,
        contact: row.get(2)?,
        event_type: row.get(3)?,
        honoree_name: row.get(4)?,
        partner_name: row.get(5)?,
        event_date: NaiveDate::parse_from_str(&event_date_str, DATE_FMT)
            .with_context(|| ctx("event_date"))?,
        time_slot: TimeSlot::parse(&time_slot_str).with_context(|| ctx("time_slot"))?,
        guest_count: row.get(8)?,
        plan: Plan::parse(&plan_str).with_context(|| ctx("plan"))?,
        decoration_id: row.get(10)?,
        decoration_name: row.get(11)?,
        add_ons,
        enhanced_features,
        balloon_colors,
        welcome_drink_id: row.get(15)?,
        premium_bundle: row.get(16)?,
        notes: row.get(17)?,
        pricing: PricingBreakdown {
            decoration_price: row.get(18)?,
            add_ons_price: row.get(19)?,
            enhanced_features_price: row.get(20)?,
            total_amount: row.get(21)?,
            advance_paid: row.get(22)?,
            balance_amount: row.get(23)?,
        },
        status: BookingStatus::parse(&status_str).with_context(|| ctx("status"))?,
        payment_status: PaymentStatus::parse(&payment_str).with_context(|| ctx("payment_status"))?,
        is_verified: row.get(26)?,
        verified_at: verified_at_str
            .map(|s| NaiveDateTime::parse_from_str(&s, TS_FMT))
            .transpose()
            .with_context(|| ctx("verified_at"))?,
        verified_by: row.get(28)?,
        qr_payload: row.get(29)?,
        created_at: NaiveDateTime::parse_from_str(&created_at_str, TS_FMT)
            .with_context(|| ctx("created_at"))?,
        updated_at: NaiveDateTime::parse_from_str(&updated_at_str, TS_FMT)
            .with_context(|| ctx("updated_at"))?,
        booking_id,
    })
}

// ── Booking Events ──

pub fn insert_booking_event(
    conn: &Connection,
    booking_id: &str,
    kind: &str,
    detail: &str,
) -> anyhow::Result<BookingEvent> {
    let created_at = Utc::now().naive_utc().format(TS_FMT).to_string();
    conn.execute(
        "INSERT INTO booking_events (booking_id, kind, detail, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![booking_id, kind, detail, created_at],
    )?;
    Ok(BookingEvent {
        id: conn.last_insert_rowid(),
        booking_id: booking_id.to_string(),
        kind: kind.to_string(),
        detail: detail.to_string(),
        created_at,
    })
}

pub fn get_booking_events(conn: &Connection, booking_id: &str) -> anyhow::Result<Vec<BookingEvent>> {
    let mut stmt = conn.prepare(
        "SELECT id, booking_id, kind, detail, created_at
         FROM booking_events WHERE booking_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![booking_id], map_event)?;

    let mut events = vec![];
    for row in rows {
        events.push(row?);
    }
    Ok(events)
}

pub fn get_events_since(conn: &Connection, since_id: i64) -> anyhow::Result<Vec<BookingEvent>> {
    let mut stmt = conn.prepare(
        "SELECT id, booking_id, kind, detail, created_at
         FROM booking_events WHERE id > ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![since_id], map_event)?;

    let mut events = vec![];
    for row in rows {
        events.push(row?);
    }
    Ok(events)
}

fn map_event(row: &rusqlite::Row) -> rusqlite::Result<BookingEvent> {
    Ok(BookingEvent {
        id: row.get(0)?,
        booking_id: row.get(1)?,
        kind: row.get(2)?,
        detail: row.get(3)?,
        created_at: row.get(4)?,
    })
}

use chrono::{NaiveDateTime, Timelike, Utc};
use rusqlite::{Connection, TransactionBehavior};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::selection::non_empty;
use crate::models::{
    Booking, BookingEvent, BookingRequest, BookingStatus, CatalogData, PaymentStatus,
};
use crate::services::{selection, slots, verification};

pub const BOOKING_ID_PREFIX: &str = "C3";
const MAX_ID_ATTEMPTS: u32 = 16;
const MAX_NAME_CHARS: usize = 60;
const MAX_CONTACT_CHARS: usize = 20;

pub struct ReservationOptions<'a> {
    pub qr_secret: &'a str,
    /// Daily guest ceiling to enforce, when capacity is a hard rule.
    pub guest_limit: Option<u32>,
}

/// A committed change and the audit events it produced.
#[derive(Debug)]
pub struct Outcome {
    pub booking: Booking,
    pub events: Vec<BookingEvent>,
}

fn now() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

/// `C3-<epoch millis>`, with a `-<n>` suffix on collision retries.
pub fn booking_id(epoch_millis: i64, attempt: u32) -> String {
    if attempt == 0 {
        format!("{BOOKING_ID_PREFIX}-{epoch_millis}")
    } else {
        format!("{BOOKING_ID_PREFIX}-{epoch_millis}-{attempt}")
    }
}

fn required(value: &str, field: &str, max: usize) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::invalid(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(AppError::invalid(format!("{field} must be at most {max} characters")));
    }
    Ok(value.to_string())
}

/// Validates and prices the request, then reserves the slot and writes the
/// booking in one IMMEDIATE transaction. The booking id and QR payload are
/// issued here and nowhere else.
pub fn create_booking(
    conn: &mut Connection,
    catalog: &CatalogData,
    req: BookingRequest,
    opts: &ReservationOptions<'_>,
) -> Result<Outcome, AppError> {
    let applicant_name = required(&req.applicant_name, "applicant name", MAX_NAME_CHARS)?;
    let contact = required(&req.contact, "contact", MAX_CONTACT_CHARS)?;
    let event_type = non_empty(Some(req.event_type)).unwrap_or_else(|| "birthday".to_string());

    let resolved = selection::resolve(catalog, &req.selection)?;

    if req.guest_count == 0 {
        return Err(AppError::invalid("guest count must be at least 1"));
    }
    if let Some(cap) = resolved.plan.rules().guest_cap {
        if req.guest_count > cap {
            return Err(AppError::invalid(format!(
                "the {} plan allows at most {cap} guests",
                resolved.plan
            )));
        }
    }

    let pricing = resolved.price()?;
    let created_at = now();

    let mut booking = Booking {
        booking_id: String::new(),
        applicant_name,
        contact,
        event_type,
        honoree_name: non_empty(req.honoree_name),
        partner_name: non_empty(req.partner_name),
        event_date: req.event_date,
        time_slot: req.time_slot,
        guest_count: req.guest_count,
        plan: resolved.plan,
        decoration_id: resolved.decoration.id.clone(),
        decoration_name: resolved.decoration.name.clone(),
        add_ons: resolved.add_ons,
        enhanced_features: resolved.enhanced_features,
        balloon_colors: resolved.balloon_colors,
        welcome_drink_id: resolved.welcome_drink_id,
        premium_bundle: resolved.premium_bundle,
        notes: non_empty(req.notes),
        pricing,
        status: BookingStatus::Pending,
        payment_status: PaymentStatus::AdvancePaid,
        is_verified: false,
        verified_at: None,
        verified_by: None,
        qr_payload: String::new(),
        created_at,
        updated_at: created_at,
    };

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let millis = Utc::now().timestamp_millis();

    let mut attempt = 0;
    loop {
        booking.booking_id = booking_id(millis, attempt);
        booking.qr_payload = verification::build_qr_payload(&booking, opts.qr_secret)?;

        match slots::reserve(&tx, &booking, opts.guest_limit) {
            Ok(()) => break,
            Err(AppError::DuplicateBookingId) if attempt + 1 < MAX_ID_ATTEMPTS => {
                tracing::debug!(booking_id = %booking.booking_id, "booking id collision, retrying");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }

    let event = queries::insert_booking_event(
        &tx,
        &booking.booking_id,
        "created",
        &format!(
            "{} {} plan={} total={}",
            booking.event_date, booking.time_slot, booking.plan, booking.pricing.total_amount
        ),
    )?;
    tx.commit()?;

    tracing::info!(
        booking_id = %booking.booking_id,
        date = %booking.event_date,
        slot = %booking.time_slot,
        plan = %booking.plan,
        total = booking.pricing.total_amount,
        "booking created"
    );

    Ok(Outcome {
        booking,
        events: vec![event],
    })
}

/// `Ok(None)` when already in `target`, `Ok(Some(target))` for a legal move.
pub fn next_status(
    current: BookingStatus,
    target: BookingStatus,
) -> Result<Option<BookingStatus>, AppError> {
    if current == target {
        Ok(None)
    } else if current.can_move_to(target) {
        Ok(Some(target))
    } else {
        Err(AppError::IllegalTransition {
            from: current,
            to: target,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct LifecycleUpdate {
    pub status: Option<BookingStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub actor: Option<String>,
    /// Venue scan: a booking that is already confirmed still records who
    /// checked it in.
    pub check_in: bool,
}

pub fn apply_update(
    conn: &mut Connection,
    id: &str,
    update: &LifecycleUpdate,
) -> Result<Outcome, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut booking = queries::get_booking_by_id(&tx, id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
    let actor = non_empty(update.actor.clone()).unwrap_or_else(|| "admin".to_string());
    let mut events = vec![];

    if let Some(target) = update.status {
        if let Some(next) = next_status(booking.status, target)? {
            let from = booking.status;
            booking.status = next;
            if next == BookingStatus::Confirmed {
                booking.is_verified = true;
                booking.verified_at = Some(now());
                booking.verified_by = Some(actor.clone());
            }
            events.push((
                "status_changed",
                format!("{from} -> {next} by {actor}"),
            ));
        }
    }

    if update.check_in && events.is_empty() && booking.status == BookingStatus::Confirmed {
        booking.is_verified = true;
        booking.verified_at = Some(now());
        booking.verified_by = Some(actor.clone());
        events.push(("verified", format!("checked in by {actor}")));
    }

    if let Some(payment) = update.payment_status {
        if payment != booking.payment_status {
            events.push((
                "payment_changed",
                format!("{} -> {} by {actor}", booking.payment_status.as_str(), payment.as_str()),
            ));
            booking.payment_status = payment;
        }
    }

    if events.is_empty() {
        return Ok(Outcome {
            booking,
            events: vec![],
        });
    }

    booking.updated_at = now();
    queries::update_booking_lifecycle(&tx, &booking)?;

    let mut recorded = Vec::with_capacity(events.len());
    for (kind, detail) in events {
        recorded.push(queries::insert_booking_event(&tx, &booking.booking_id, kind, &detail)?);
    }
    tx.commit()?;

    tracing::info!(
        booking_id = %booking.booking_id,
        status = %booking.status,
        payment_status = booking.payment_status.as_str(),
        actor = %actor,
        "booking updated"
    );

    Ok(Outcome {
        booking,
        events: recorded,
    })
}

/// Physically removes a booking. Its slot becomes free immediately since
/// occupancy is derived from the rows that remain.
pub fn delete_booking(conn: &mut Connection, id: &str) -> Result<BookingEvent, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let booking = queries::get_booking_by_id(&tx, id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
    queries::delete_booking(&tx, id)?;
    let event = queries::insert_booking_event(
        &tx,
        id,
        "deleted",
        &format!("{} {} released", booking.event_date, booking.time_slot),
    )?;
    tx.commit()?;

    tracing::info!(
        booking_id = %id,
        date = %booking.event_date,
        slot = %booking.time_slot,
        "booking deleted, slot released"
    );
    Ok(event)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::db;
    use crate::models::{
        BalloonColorSelection, EnhancedFeatureSelection, Plan, PricingBreakdown, SelectionRequest,
        TimeSlot,
    };
    use crate::services::catalog::builtin::reference_data;

    /// A fully-formed booking for storage-level tests.
    pub(crate) fn sample_booking(id: &str, date: &str, slot: usize) -> Booking {
        let created_at = NaiveDate::from_ymd_opt(2024, 4, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        Booking {
            booking_id: id.to_string(),
            applicant_name: "Meera".to_string(),
            contact: "9876543210".to_string(),
            event_type: "birthday".to_string(),
            honoree_name: Some("Aria".to_string()),
            partner_name: None,
            event_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            time_slot: TimeSlot::all().nth(slot).unwrap(),
            guest_count: 20,
            plan: Plan::Basic,
            decoration_id: "basic-balloon-arch".to_string(),
            decoration_name: "Classic Balloon Arch".to_string(),
            add_ons: vec![],
            enhanced_features: EnhancedFeatureSelection::default(),
            balloon_colors: BalloonColorSelection::new(),
            welcome_drink_id: None,
            premium_bundle: false,
            notes: None,
            pricing: PricingBreakdown {
                decoration_price: 2000,
                add_ons_price: 0,
                enhanced_features_price: 0,
                total_amount: 2000,
                advance_paid: 500,
                balance_amount: 1500,
            },
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::AdvancePaid,
            is_verified: false,
            verified_at: None,
            verified_by: None,
            qr_payload: "payload".to_string(),
            created_at,
            updated_at: created_at,
        }
    }

    fn request(plan: Plan, decoration_id: &str, slot: &str, guests: u32) -> BookingRequest {
        BookingRequest {
            applicant_name: " Meera ".to_string(),
            contact: "9876543210".to_string(),
            event_type: "birthday".to_string(),
            honoree_name: Some("Aria".to_string()),
            partner_name: Some("".to_string()),
            event_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            time_slot: TimeSlot::parse(slot).unwrap(),
            guest_count: guests,
            selection: SelectionRequest {
                plan,
                decoration_id: decoration_id.to_string(),
                add_ons: vec![],
                enhanced_features: EnhancedFeatureSelection::default(),
                balloon_colors: vec!["red".to_string(), "gold".to_string()],
                welcome_drink_id: None,
                premium_bundle: false,
            },
            notes: None,
        }
    }

    const OPTS: ReservationOptions<'static> = ReservationOptions {
        qr_secret: "secret",
        guest_limit: None,
    };

    fn create(conn: &mut Connection, slot: &str) -> Booking {
        create_booking(
            conn,
            &reference_data(),
            request(Plan::Basic, "basic-balloon-arch", slot, 20),
            &OPTS,
        )
        .unwrap()
        .booking
    }

    #[test]
    fn test_create_issues_id_and_payload_once() {
        let mut conn = db::init_db(":memory:").unwrap();
        let outcome = create_booking(
            &mut conn,
            &reference_data(),
            request(Plan::Basic, "basic-balloon-arch", "11:00 AM - 12:00 PM", 20),
            &OPTS,
        )
        .unwrap();

        let booking = &outcome.booking;
        assert!(booking.booking_id.starts_with("C3-"));
        assert_eq!(booking.applicant_name, "Meera");
        assert_eq!(booking.partner_name, None);
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.payment_status, PaymentStatus::AdvancePaid);
        assert_eq!(booking.pricing.advance_paid, 500);
        assert_eq!(outcome.events[0].kind, "created");

        let stored = queries::get_booking_by_id(&conn, &booking.booking_id)
            .unwrap()
            .unwrap();
        assert_eq!(stored.qr_payload, booking.qr_payload);
        assert_eq!(stored.balloon_colors, booking.balloon_colors);
        assert_eq!(stored.balloon_colors.colors()[1].hex, "#FFD54F");
        assert_eq!(stored.created_at, booking.created_at);
    }

    #[test]
    fn test_same_millisecond_ids_get_suffix() {
        assert_eq!(booking_id(1714550000000, 0), "C3-1714550000000");
        assert_eq!(booking_id(1714550000000, 2), "C3-1714550000000-2");
    }

    #[test]
    fn test_rapid_creates_never_share_an_id() {
        let mut conn = db::init_db(":memory:").unwrap();
        let ids: Vec<String> = crate::models::slot::SLOT_LABELS
            .iter()
            .map(|slot| create(&mut conn, slot).booking_id)
            .collect();
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_double_booking_rejected() {
        let mut conn = db::init_db(":memory:").unwrap();
        create(&mut conn, "4:00 PM - 5:00 PM");

        let second = create_booking(
            &mut conn,
            &reference_data(),
            request(Plan::Basic, "basic-pastel-dream", "4:00 PM - 5:00 PM", 10),
            &OPTS,
        );
        assert!(matches!(second, Err(AppError::SlotUnavailable)));
    }

    #[test]
    fn test_premium_guest_cap_enforced() {
        let mut conn = db::init_db(":memory:").unwrap();
        let result = create_booking(
            &mut conn,
            &reference_data(),
            request(Plan::Premium, "premium-royal-theme", "11:00 AM - 12:00 PM", 35),
            &OPTS,
        );
        assert!(matches!(result, Err(AppError::InvalidSelection(_))));

        let zero = create_booking(
            &mut conn,
            &reference_data(),
            request(Plan::Basic, "basic-balloon-arch", "11:00 AM - 12:00 PM", 0),
            &OPTS,
        );
        assert!(matches!(zero, Err(AppError::InvalidSelection(_))));
    }

    #[test]
    fn test_missing_contact_rejected_before_write() {
        let mut conn = db::init_db(":memory:").unwrap();
        let mut req = request(Plan::Basic, "basic-balloon-arch", "11:00 AM - 12:00 PM", 10);
        req.contact = "  ".to_string();
        assert!(create_booking(&mut conn, &reference_data(), req, &OPTS).is_err());
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert!(queries::get_bookings_for_date(&conn, &date).unwrap().is_empty());
    }

    #[test]
    fn test_confirm_sets_verification() {
        let mut conn = db::init_db(":memory:").unwrap();
        let booking = create(&mut conn, "11:00 AM - 12:00 PM");

        let outcome = apply_update(
            &mut conn,
            &booking.booking_id,
            &LifecycleUpdate {
                status: Some(BookingStatus::Confirmed),
                actor: Some("front-desk".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(outcome.booking.status, BookingStatus::Confirmed);
        assert!(outcome.booking.is_verified);
        assert!(outcome.booking.verified_at.is_some());
        assert_eq!(outcome.booking.verified_by.as_deref(), Some("front-desk"));
        assert_eq!(outcome.events.len(), 1);
    }

    #[test]
    fn test_repeated_target_is_noop() {
        let mut conn = db::init_db(":memory:").unwrap();
        let booking = create(&mut conn, "11:00 AM - 12:00 PM");
        let confirm = LifecycleUpdate {
            status: Some(BookingStatus::Confirmed),
            ..Default::default()
        };

        let first = apply_update(&mut conn, &booking.booking_id, &confirm).unwrap();
        let second = apply_update(&mut conn, &booking.booking_id, &confirm).unwrap();
        assert!(second.events.is_empty());
        assert_eq!(second.booking.verified_at, first.booking.verified_at);
    }

    #[test]
    fn test_cancelled_then_confirm_is_illegal() {
        let mut conn = db::init_db(":memory:").unwrap();
        let booking = create(&mut conn, "11:00 AM - 12:00 PM");
        let id = &booking.booking_id;

        for status in [BookingStatus::Confirmed, BookingStatus::Cancelled] {
            apply_update(
                &mut conn,
                id,
                &LifecycleUpdate {
                    status: Some(status),
                    ..Default::default()
                },
            )
            .unwrap();
        }

        let result = apply_update(
            &mut conn,
            id,
            &LifecycleUpdate {
                status: Some(BookingStatus::Confirmed),
                ..Default::default()
            },
        );
        assert!(matches!(
            result,
            Err(AppError::IllegalTransition {
                from: BookingStatus::Cancelled,
                to: BookingStatus::Confirmed
            })
        ));

        // The slot it held is free again.
        create(&mut conn, "11:00 AM - 12:00 PM");
    }

    #[test]
    fn test_terminal_states_absorb_every_sequence() {
        use BookingStatus::*;
        let all = [Pending, Confirmed, Completed, Cancelled];

        for start in [Completed, Cancelled] {
            for a in all {
                for b in all {
                    let mut status = start;
                    for target in [a, b] {
                        if let Ok(Some(next)) = next_status(status, target) {
                            status = next;
                        }
                    }
                    assert_eq!(status, start);
                }
            }
        }
    }

    #[test]
    fn test_payment_status_independent_of_status() {
        let mut conn = db::init_db(":memory:").unwrap();
        let booking = create(&mut conn, "11:00 AM - 12:00 PM");

        let outcome = apply_update(
            &mut conn,
            &booking.booking_id,
            &LifecycleUpdate {
                payment_status: Some(PaymentStatus::Failed),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(outcome.booking.status, BookingStatus::Pending);
        assert_eq!(outcome.booking.payment_status, PaymentStatus::Failed);
        assert_eq!(outcome.events[0].kind, "payment_changed");
    }

    #[test]
    fn test_delete_releases_slot() {
        let mut conn = db::init_db(":memory:").unwrap();
        let booking = create(&mut conn, "9:00 PM - 10:00 PM");

        let event = delete_booking(&mut conn, &booking.booking_id).unwrap();
        assert_eq!(event.kind, "deleted");
        assert!(matches!(
            delete_booking(&mut conn, &booking.booking_id),
            Err(AppError::NotFound(_))
        ));
        create(&mut conn, "9:00 PM - 10:00 PM");
    }

    #[test]
    fn test_update_unknown_booking() {
        let mut conn = db::init_db(":memory:").unwrap();
        let result = apply_update(&mut conn, "C3-0", &LifecycleUpdate::default());
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_check_in_on_confirmed_booking_records_verifier() {
        let mut conn = db::init_db(":memory:").unwrap();
        let booking = create(&mut conn, "11:00 AM - 12:00 PM");
        apply_update(
            &mut conn,
            &booking.booking_id,
            &LifecycleUpdate {
                status: Some(BookingStatus::Confirmed),
                actor: Some("front-desk".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        let outcome = apply_update(
            &mut conn,
            &booking.booking_id,
            &LifecycleUpdate {
                status: Some(BookingStatus::Confirmed),
                actor: Some("gate-2".to_string()),
                check_in: true,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(outcome.booking.status, BookingStatus::Confirmed);
        assert_eq!(outcome.booking.verified_by.as_deref(), Some("gate-2"));
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].kind, "verified");

        let stored = queries::get_booking_by_id(&conn, &booking.booking_id)
            .unwrap()
            .unwrap();
        assert_eq!(stored.verified_by.as_deref(), Some("gate-2"));
    }

    #[test]
    fn test_check_in_on_pending_booking_confirms_once() {
        let mut conn = db::init_db(":memory:").unwrap();
        let booking = create(&mut conn, "11:00 AM - 12:00 PM");

        let outcome = apply_update(
            &mut conn,
            &booking.booking_id,
            &LifecycleUpdate {
                status: Some(BookingStatus::Confirmed),
                actor: Some("gate-1".to_string()),
                check_in: true,
                ..Default::default()
            },
        )
        .unwrap();

        let kinds: Vec<_> = outcome.events.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec!["status_changed"]);
        assert_eq!(outcome.booking.verified_by.as_deref(), Some("gate-1"));
    }
}

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use sha1::Sha1;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, Plan, TimeSlot};

type HmacSha1 = Hmac<Sha1>;

/// What the QR code carries. Enough for a venue to read the booking at a
/// glance without a lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QrSummary {
    pub booking_id: String,
    pub applicant_name: String,
    pub event_date: chrono::NaiveDate,
    pub time_slot: TimeSlot,
    pub plan: Plan,
    pub total_amount: i64,
    pub advance_paid: i64,
    pub balance_amount: i64,
}

impl QrSummary {
    pub fn of(booking: &Booking) -> Self {
        Self {
            booking_id: booking.booking_id.clone(),
            applicant_name: booking.applicant_name.clone(),
            event_date: booking.event_date,
            time_slot: booking.time_slot,
            plan: booking.plan,
            total_amount: booking.pricing.total_amount,
            advance_paid: booking.pricing.advance_paid,
            balance_amount: booking.pricing.balance_amount,
        }
    }
}

fn mac(secret: &str) -> anyhow::Result<HmacSha1> {
    HmacSha1::new_from_slice(secret.as_bytes()).map_err(|e| anyhow::anyhow!("invalid QR secret: {e}"))
}

/// `base64url(summary json) "." base64url(hmac)`.
pub fn build_qr_payload(booking: &Booking, secret: &str) -> anyhow::Result<String> {
    let body = serde_json::to_vec(&QrSummary::of(booking))?;
    let mut mac = mac(secret)?;
    mac.update(&body);
    let signature = mac.finalize().into_bytes();

    Ok(format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(&body),
        URL_SAFE_NO_PAD.encode(signature)
    ))
}

#[derive(Debug, PartialEq)]
pub enum ScannedCode {
    /// Plain typed code, still to be normalized.
    Typed(String),
    /// Payload whose signature checked out.
    Signed(QrSummary),
    /// Looked like a payload but was tampered with or signed elsewhere.
    Forged,
}

pub fn read_scanned(raw: &str, secret: &str) -> ScannedCode {
    let raw = raw.trim();
    let Some((body_b64, sig_b64)) = raw.split_once('.') else {
        return ScannedCode::Typed(raw.to_string());
    };

    let (Ok(body), Ok(signature)) = (URL_SAFE_NO_PAD.decode(body_b64), URL_SAFE_NO_PAD.decode(sig_b64))
    else {
        return ScannedCode::Forged;
    };

    let Ok(mut mac) = mac(secret) else {
        return ScannedCode::Forged;
    };
    mac.update(&body);
    if mac.verify_slice(&signature).is_err() {
        return ScannedCode::Forged;
    }

    match serde_json::from_slice::<QrSummary>(&body) {
        Ok(summary) => ScannedCode::Signed(summary),
        Err(_) => ScannedCode::Forged,
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

pub fn find_by_code(conn: &Connection, code: &str) -> Result<Booking, AppError> {
    let code = normalize_code(code);
    if code.is_empty() {
        return Err(AppError::NotFound("empty booking code".to_string()));
    }
    queries::get_booking_by_id(conn, &code)?
        .ok_or_else(|| AppError::NotFound(format!("booking {code}")))
}

/// Resolves whatever the venue scanner or the admin search box produced.
pub fn resolve_scanned(conn: &Connection, raw: &str, secret: &str) -> Result<Booking, AppError> {
    match read_scanned(raw, secret) {
        ScannedCode::Typed(code) => find_by_code(conn, &code),
        ScannedCode::Signed(summary) => find_by_code(conn, &summary.booking_id),
        ScannedCode::Forged => {
            tracing::warn!("rejected QR payload with invalid signature");
            Err(AppError::NotFound("booking code".to_string()))
        }
    }
}

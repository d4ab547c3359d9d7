use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{AddOnSelection, BalloonColorSelection, EnhancedFeatureSelection, Plan, TimeSlot};

pub const ADVANCE_AMOUNT: i64 = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub booking_id: String,
    pub applicant_name: String,
    pub contact: String,
    pub event_type: String,
    pub honoree_name: Option<String>,
    pub partner_name: Option<String>,
    pub event_date: NaiveDate,
    pub time_slot: TimeSlot,
    pub guest_count: u32,
    pub plan: Plan,
    pub decoration_id: String,
    pub decoration_name: String,
    pub add_ons: Vec<AddOnSelection>,
    pub enhanced_features: EnhancedFeatureSelection,
    pub balloon_colors: BalloonColorSelection,
    pub welcome_drink_id: Option<String>,
    pub premium_bundle: bool,
    pub notes: Option<String>,
    #[serde(flatten)]
    pub pricing: PricingBreakdown,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub is_verified: bool,
    pub verified_at: Option<NaiveDateTime>,
    pub verified_by: Option<String>,
    pub qr_payload: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PricingBreakdown {
    pub decoration_price: i64,
    pub add_ons_price: i64,
    pub enhanced_features_price: i64,
    pub total_amount: i64,
    pub advance_paid: i64,
    pub balance_amount: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Forward edges of the lifecycle. Staying in place is not an edge.
    pub fn can_move_to(&self, target: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, target),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed) | (Confirmed, Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    AdvancePaid,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::AdvancePaid => "advance_paid",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "advance_paid" => Some(PaymentStatus::AdvancePaid),
            "completed" => Some(PaymentStatus::Completed),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

/// Customer-facing creation payload. Prices are never taken from here.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub applicant_name: String,
    pub contact: String,
    #[serde(default = "default_event_type")]
    pub event_type: String,
    #[serde(default)]
    pub honoree_name: Option<String>,
    #[serde(default)]
    pub partner_name: Option<String>,
    pub event_date: NaiveDate,
    pub time_slot: TimeSlot,
    pub guest_count: u32,
    #[serde(flatten)]
    pub selection: SelectionRequest,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_event_type() -> String {
    "birthday".to_string()
}

/// The priced part of a booking, also accepted on its own for quotes.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionRequest {
    pub plan: Plan,
    pub decoration_id: String,
    #[serde(default)]
    pub add_ons: Vec<AddOnRequest>,
    #[serde(default)]
    pub enhanced_features: EnhancedFeatureSelection,
    #[serde(default)]
    pub balloon_colors: Vec<String>,
    #[serde(default)]
    pub welcome_drink_id: Option<String>,
    #[serde(default)]
    pub premium_bundle: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddOnRequest {
    pub addon_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub custom_text: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

/// One row of the booking audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingEvent {
    pub id: i64,
    pub booking_id: String,
    pub kind: String,
    pub detail: String,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_edges() {
        use BookingStatus::*;
        assert!(Pending.can_move_to(Confirmed));
        assert!(Pending.can_move_to(Cancelled));
        assert!(Confirmed.can_move_to(Completed));
        assert!(Confirmed.can_move_to(Cancelled));
        assert!(!Pending.can_move_to(Completed));
        assert!(!Confirmed.can_move_to(Pending));
        for target in [Pending, Confirmed, Completed, Cancelled] {
            assert!(!Cancelled.can_move_to(target));
            assert!(!Completed.can_move_to(target));
        }
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(BookingStatus::parse("cancelled"), Some(BookingStatus::Cancelled));
        assert_eq!(BookingStatus::parse("archived"), None);
        assert_eq!(PaymentStatus::parse("advance_paid"), Some(PaymentStatus::AdvancePaid));
        assert_eq!(
            serde_json::to_string(&PaymentStatus::AdvancePaid).unwrap(),
            "\"advance_paid\""
        );
    }

    #[test]
    fn test_booking_request_flattens_selection() {
        let json = r#"{
            "applicant_name": "Meera",
            "contact": "9876543210",
            "event_date": "2024-05-01",
            "time_slot": "11:00 AM - 12:00 PM",
            "guest_count": 12,
            "plan": "basic",
            "decoration_id": "basic-balloon-arch",
            "add_ons": [{"addon_id": "crown"}]
        }"#;
        let req: BookingRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.event_type, "birthday");
        assert_eq!(req.selection.plan, Plan::Basic);
        assert_eq!(req.selection.add_ons[0].quantity, 1);
        assert!(!req.selection.premium_bundle);
    }
}

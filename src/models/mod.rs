pub mod booking;
pub mod catalog;
pub mod plan;
pub mod selection;
pub mod slot;

pub use booking::{
    AddOnRequest, Booking, BookingEvent, BookingRequest, BookingStatus, PaymentStatus,
    PricingBreakdown, SelectionRequest, ADVANCE_AMOUNT,
};
pub use catalog::{AddOn, BalloonColor, CatalogData, ColorTier, Decoration, WelcomeDrink};
pub use plan::{Plan, PlanRules};
pub use selection::{
    AddOnSelection, BalloonColorSelection, ChosenColor, EnhancedFeatureSelection,
};
pub use slot::TimeSlot;

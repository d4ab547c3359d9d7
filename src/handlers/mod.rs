pub mod admin;
pub mod bookings;
pub mod catalog;
pub mod extract;
pub mod health;
pub mod slots;

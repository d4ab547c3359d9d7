pub mod catalog;
pub mod lifecycle;
pub mod pricing;
pub mod selection;
pub mod slots;
pub mod verification;

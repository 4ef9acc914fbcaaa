pub mod catalog;
pub mod coupons;
pub mod credits;
pub mod entitlements;
pub mod purchases;

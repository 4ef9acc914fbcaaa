pub mod coupons;
pub mod credit_kinds;
pub mod entitlements;
pub mod purchase_types;
pub mod sort_order;
pub mod subscription_statuses;

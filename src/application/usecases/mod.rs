pub mod activation;
pub mod consumption;
pub mod coupons;
pub mod entitlements;

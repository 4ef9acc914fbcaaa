pub mod axum_http;
pub mod coupon_authority;
pub mod postgres;

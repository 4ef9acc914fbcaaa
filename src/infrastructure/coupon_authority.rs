use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::{
    application::usecases::coupons::CouponAuthority, config::config_model::CouponAuthorityConfig,
    domain::value_objects::coupons::CouponCheck,
};

/// Coupon validation client built on reqwest. The remote service owns usage
/// counters and expiry; this process only asks yes/no.
pub struct HttpCouponAuthority {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateCouponRequest<'a> {
    coupon_code: &'a str,
    user_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateCouponResponse {
    is_valid: bool,
    #[serde(default)]
    message: Option<String>,
}

impl HttpCouponAuthority {
    pub fn new(config: &CouponAuthorityConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CouponAuthority for HttpCouponAuthority {
    async fn validate(&self, coupon_code: &str, user_id: Uuid) -> Result<CouponCheck> {
        let url = format!("{}/validate-coupon", self.base_url);

        let resp = self
            .http
            .post(&url)
            .json(&ValidateCouponRequest {
                coupon_code,
                user_id,
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = match resp.text().await {
                Ok(text) if !text.is_empty() => text,
                Ok(_) => "<empty response body>".to_string(),
                Err(err) => format!("<failed to read response body: {err}>"),
            };

            error!(
                status = %status,
                response_body = %body,
                "coupon authority request failed"
            );

            anyhow::bail!("Coupon authority request failed (status {})", status);
        }

        let parsed = resp.json::<ValidateCouponResponse>().await?;

        Ok(CouponCheck {
            is_valid: parsed.is_valid,
            message: parsed
                .message
                .unwrap_or_else(|| "Coupon validation completed".to_string()),
        })
    }
}

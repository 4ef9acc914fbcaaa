use anyhow::{Context, Result};

use super::config_model::{CouponAuthorityConfig, Database, DotEnvyConfig, Server, Supabase};

const DEFAULT_COUPON_AUTHORITY_TIMEOUT_SECONDS: u64 = 10;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let server = Server {
        port: std::env::var("SERVER_PORT")
            .context("SERVER_PORT is invalid")?
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .context("SERVER_BODY_LIMIT is invalid")?
            .parse()?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .context("SERVER_TIMEOUT is invalid")?
            .parse()?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").context("DATABASE_URL is invalid")?,
    };

    let supabase = Supabase {
        jwt_secret: std::env::var("SUPABASE_JWT_SECRET")
            .context("SUPABASE_JWT_SECRET is invalid")?,
    };

    let coupon_authority = CouponAuthorityConfig {
        base_url: std::env::var("COUPON_AUTHORITY_URL")
            .context("COUPON_AUTHORITY_URL is invalid")?,
        timeout_seconds: std::env::var("COUPON_AUTHORITY_TIMEOUT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_COUPON_AUTHORITY_TIMEOUT_SECONDS),
    };

    Ok(DotEnvyConfig {
        server,
        database,
        supabase,
        coupon_authority,
    })
}

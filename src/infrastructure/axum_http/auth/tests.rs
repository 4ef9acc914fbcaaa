use super::*;
use jsonwebtoken::{EncodingKey, Header, encode};
use std::env;

const TEST_SECRET: &str = "supersecretjwtsecretforunittesting123";

fn set_env_vars() {
    unsafe {
        env::set_var("SERVER_PORT", "8080");
        env::set_var("SERVER_BODY_LIMIT", "10");
        env::set_var("SERVER_TIMEOUT", "30");
        env::set_var("DATABASE_URL", "postgres://localhost:5432/db");
        env::set_var("SUPABASE_JWT_SECRET", TEST_SECRET);
        env::set_var("COUPON_AUTHORITY_URL", "http://localhost:9090");
    }
}

fn claims(exp: usize) -> SupabaseClaims {
    SupabaseClaims {
        sub: "123e4567-e89b-12d3-a456-426614174000".to_string(),
        aud: "authenticated".to_string(),
        role: "authenticated".to_string(),
        email: Some("test@example.com".to_string()),
        exp,
    }
}

#[test]
fn test_validate_supabase_jwt_success() {
    set_env_vars();
    let my_claims = claims(9999999999);

    let token = encode(
        &Header::default(),
        &my_claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    let decoded = validate_supabase_jwt(&token).expect("Valid token should pass");
    assert_eq!(decoded.sub, my_claims.sub);
    assert_eq!(decoded.email, my_claims.email);
}

#[test]
fn test_validate_supabase_jwt_expired() {
    set_env_vars();
    let my_claims = claims(1);

    let token = encode(
        &Header::default(),
        &my_claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    let result = validate_supabase_jwt(&token);
    assert!(result.is_err());
}

#[test]
fn test_validate_supabase_jwt_invalid_signature() {
    set_env_vars();
    let my_claims = claims(9999999999);

    let token = encode(
        &Header::default(),
        &my_claims,
        &EncodingKey::from_secret("wrongsecret".as_bytes()),
    )
    .unwrap();

    let result = validate_supabase_jwt(&token);
    assert!(result.is_err());
}

#[test]
fn test_validate_supabase_jwt_wrong_audience() {
    set_env_vars();
    let mut my_claims = claims(9999999999);
    my_claims.aud = "anon".to_string();

    let token = encode(
        &Header::default(),
        &my_claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    let result = validate_supabase_jwt(&token);
    assert!(result.is_err());
}

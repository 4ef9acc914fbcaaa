use anyhow::Result;
use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    application::usecases::coupons::{CouponAuthority, CouponUseCase},
    config::config_model::CouponAuthorityConfig,
    domain::catalog::PlanCatalog,
    infrastructure::{
        axum_http::{auth::AuthUser, error_responses::usecase_error},
        coupon_authority::HttpCouponAuthority,
    },
};

pub fn routes(catalog: Arc<PlanCatalog>, config: &CouponAuthorityConfig) -> Result<Router> {
    let authority = Arc::new(HttpCouponAuthority::new(config)?);
    let coupons_usecase = CouponUseCase::new(authority, catalog);

    Ok(Router::new()
        .route("/evaluate", post(evaluate_coupon))
        .with_state(Arc::new(coupons_usecase)))
}

#[derive(Debug, Deserialize)]
pub struct EvaluateCouponRequest {
    pub plan_id: String,
    pub coupon_code: String,
}

pub async fn evaluate_coupon<C>(
    State(coupons_usecase): State<Arc<CouponUseCase<C>>>,
    auth: Option<AuthUser>,
    Json(payload): Json<EvaluateCouponRequest>,
) -> Response
where
    C: CouponAuthority + 'static,
{
    let user_id = auth.map(|auth| auth.user_id);

    match coupons_usecase
        .evaluate(&payload.plan_id, &payload.coupon_code, user_id)
        .await
    {
        Ok(evaluation) => Json(evaluation).into_response(),
        Err(err) => usecase_error(err.status_code(), err.to_string()),
    }
}

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use std::sync::Arc;

use crate::domain::catalog::PlanCatalog;

pub fn routes(catalog: Arc<PlanCatalog>) -> Router {
    Router::new()
        .route("/plans", get(list_plans))
        .route("/add-ons", get(list_add_ons))
        .with_state(catalog)
}

pub async fn list_plans(State(catalog): State<Arc<PlanCatalog>>) -> impl IntoResponse {
    Json(catalog.plans().to_vec())
}

pub async fn list_add_ons(State(catalog): State<Arc<PlanCatalog>>) -> impl IntoResponse {
    Json(catalog.add_ons().to_vec())
}

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;

use crate::{
    application::usecases::entitlements::EntitlementUseCase,
    domain::repositories::{
        addon_credits::AddOnCreditRepository, subscriptions::SubscriptionRepository,
    },
    infrastructure::{
        axum_http::{auth::AuthUser, error_responses::usecase_error},
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{
                addon_credits::AddOnCreditPostgres, subscriptions::SubscriptionPostgres,
            },
        },
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let subscription_repo = Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool)));
    let addon_credit_repo = Arc::new(AddOnCreditPostgres::new(Arc::clone(&db_pool)));
    let entitlements_usecase = EntitlementUseCase::new(subscription_repo, addon_credit_repo);

    Router::new()
        .route("/me", get(get_my_entitlement))
        .with_state(Arc::new(entitlements_usecase))
}

pub async fn get_my_entitlement<S, A>(
    State(entitlements_usecase): State<Arc<EntitlementUseCase<S, A>>>,
    auth: AuthUser,
) -> Response
where
    S: SubscriptionRepository + Send + Sync + 'static,
    A: AddOnCreditRepository + Send + Sync + 'static,
{
    match entitlements_usecase.get_entitlement(auth.user_id).await {
        Ok(Some(entitlement)) => Json(entitlement).into_response(),
        Ok(None) => usecase_error(
            StatusCode::NOT_FOUND,
            "No entitlement found for this user".to_string(),
        ),
        Err(err) => usecase_error(err.status_code(), err.to_string()),
    }
}

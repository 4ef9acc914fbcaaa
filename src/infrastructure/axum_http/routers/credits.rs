use axum::{
    Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::post,
};
use std::sync::Arc;

use crate::{
    application::usecases::{
        consumption::ConsumptionUseCase, entitlements::EntitlementUseCase,
    },
    domain::{
        repositories::{
            addon_credits::AddOnCreditRepository, subscriptions::SubscriptionRepository,
        },
        value_objects::credit_kinds::CreditKind,
    },
    infrastructure::{
        axum_http::{
            auth::AuthUser,
            error_responses::{AppError, usecase_error},
        },
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
    let entitlements_usecase = Arc::new(EntitlementUseCase::new(
        Arc::clone(&subscription_repo),
        Arc::clone(&addon_credit_repo),
    ));
    let consumption_usecase =
        ConsumptionUseCase::new(subscription_repo, addon_credit_repo, entitlements_usecase);

    Router::new()
        .route("/consume/:kind", post(consume_credit))
        .with_state(Arc::new(consumption_usecase))
}

pub async fn consume_credit<S, A>(
    State(consumption_usecase): State<Arc<ConsumptionUseCase<S, A>>>,
    auth: AuthUser,
    Path(kind): Path<String>,
) -> Response
where
    S: SubscriptionRepository + Send + Sync + 'static,
    A: AddOnCreditRepository + Send + Sync + 'static,
{
    let Some(kind) = CreditKind::from_str(&kind) else {
        return AppError::BadRequest(format!("Unknown credit kind: {kind}")).into_response();
    };

    match consumption_usecase.consume(auth.user_id, kind).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(err) => usecase_error(err.status_code(), err.to_string()),
    }
}

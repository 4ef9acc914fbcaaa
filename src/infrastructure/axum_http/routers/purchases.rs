use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::json;
use std::sync::Arc;

use crate::{
    application::usecases::activation::{ActivationRequest, ActivationUseCase},
    domain::{
        catalog::PlanCatalog,
        repositories::{
            addon_credits::AddOnCreditRepository,
            payment_transactions::PaymentTransactionRepository,
            subscriptions::SubscriptionRepository,
            wallet_transactions::WalletTransactionRepository,
        },
    },
    infrastructure::{
        axum_http::{auth::AuthUser, error_responses::usecase_error},
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{
                addon_credits::AddOnCreditPostgres,
                payment_transactions::PaymentTransactionPostgres,
                subscriptions::SubscriptionPostgres,
                wallet_transactions::WalletTransactionPostgres,
            },
        },
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>, catalog: Arc<PlanCatalog>) -> Router {
    let subscription_repo = Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool)));
    let addon_credit_repo = Arc::new(AddOnCreditPostgres::new(Arc::clone(&db_pool)));
    let transaction_repo = Arc::new(PaymentTransactionPostgres::new(Arc::clone(&db_pool)));
    let wallet_repo = Arc::new(WalletTransactionPostgres::new(Arc::clone(&db_pool)));
    let activation_usecase = ActivationUseCase::new(
        subscription_repo,
        addon_credit_repo,
        transaction_repo,
        wallet_repo,
        catalog,
    );

    Router::new()
        .route("/activate", post(activate))
        .route("/free-trial", post(activate_free_trial))
        .with_state(Arc::new(activation_usecase))
}

pub async fn activate<S, A, T, W>(
    State(activation_usecase): State<Arc<ActivationUseCase<S, A, T, W>>>,
    auth: AuthUser,
    Json(payload): Json<ActivationRequest>,
) -> Response
where
    S: SubscriptionRepository + Send + Sync + 'static,
    A: AddOnCreditRepository + Send + Sync + 'static,
    T: PaymentTransactionRepository + Send + Sync + 'static,
    W: WalletTransactionRepository + Send + Sync + 'static,
{
    match activation_usecase.activate(auth.user_id, payload).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(err) => usecase_error(err.status_code(), err.to_string()),
    }
}

pub async fn activate_free_trial<S, A, T, W>(
    State(activation_usecase): State<Arc<ActivationUseCase<S, A, T, W>>>,
    auth: AuthUser,
) -> Response
where
    S: SubscriptionRepository + Send + Sync + 'static,
    A: AddOnCreditRepository + Send + Sync + 'static,
    T: PaymentTransactionRepository + Send + Sync + 'static,
    W: WalletTransactionRepository + Send + Sync + 'static,
{
    match activation_usecase.activate_free_trial(auth.user_id).await {
        Ok(activated) => Json(json!({ "activated": activated })).into_response(),
        Err(err) => usecase_error(err.status_code(), err.to_string()),
    }
}

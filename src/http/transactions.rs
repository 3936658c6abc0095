//! `/api/transactions` handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde_json::Value;

use crate::http::middleware::AuthenticatedUser;
use crate::http::request::PaymentRequest;
use crate::http::response::{
    panic_message, ApiError, BalancesResponse, HistoryResponse, PaymentResponse, TransactionSummary,
};
use crate::http::server::AppState;
use crate::payments::{BalanceQuery, DispatchError, PayerInfo};

const PAYMENT_FAILED: &str = "Payment processing failed";

/// `POST /api/transactions/payment`
pub async fn process_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let Json(body) = payload?;
    let request = PaymentRequest::from_json(&body).map_err(ApiError::Validation)?;
    let chain = request.chain;

    let payer_wallet = user.wallets.get(chain).ok_or_else(|| {
        ApiError::bad_request(
            PAYMENT_FAILED,
            format!("No {} wallet registered for user {}", chain, user.id),
        )
    })?;

    let provider = state.catalog.provider_for(&request.data_id);
    let payee = provider.wallets.get(chain).ok_or_else(|| {
        ApiError::bad_request(
            PAYMENT_FAILED,
            format!("Data provider {} has no {} wallet", provider.id, chain),
        )
    })?;

    let payer = PayerInfo {
        wallet_address: payer_wallet.to_string(),
        credential: state.credentials.get(&chain).cloned(),
    };
    let payee = payee.to_string();

    tracing::info!(
        user_id = %user.id,
        data_id = %request.data_id,
        chain = %chain,
        amount = %request.amount,
        "Processing data access payment"
    );

    // Detached so a client disconnect does not abort a submission in flight.
    let task = {
        let dispatcher = state.dispatcher.clone();
        let ledger = state.ledger.clone();
        let user_id = user.id.clone();
        let data_id = request.data_id.clone();
        let amount = request.amount;
        tokio::spawn(async move {
            let outcome = dispatcher
                .process_payment(chain.as_str(), &payer, &payee, amount)
                .await;
            if let Ok(result) = &outcome {
                ledger.record(&user_id, &data_id, chain, result);
            }
            outcome
        })
    };

    let expose = state.config.environment.exposes_errors();
    let outcome = task.await.map_err(|e| {
        let detail = if e.is_panic() {
            panic_message(e.into_panic().as_ref())
        } else {
            e.to_string()
        };
        tracing::error!(error = %detail, "Payment task failed");
        ApiError::internal(detail, expose)
    })?;

    let result = outcome.map_err(|e| match e {
        DispatchError::UnsupportedChain(_) => ApiError::bad_request(PAYMENT_FAILED, e.to_string()),
    })?;

    if !result.success() {
        return Err(ApiError::bad_request(
            PAYMENT_FAILED,
            result.error_message().unwrap_or("Unknown error"),
        ));
    }

    let id = result.transaction_id().unwrap_or_default().to_string();
    tracing::info!(
        user_id = %user.id,
        data_id = %request.data_id,
        tx_id = %id,
        "Payment processed successfully"
    );

    Ok(Json(PaymentResponse {
        success: true,
        message: "Payment processed successfully",
        transaction: TransactionSummary {
            id,
            amount: request.amount,
            timestamp: result.timestamp().to_string(),
            blockchain: chain,
        },
    }))
}

/// `GET /api/transactions/balances`
pub async fn get_balances(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Json<BalancesResponse> {
    let query = user
        .wallets
        .iter()
        .fold(BalanceQuery::new(), |query, (chain, address)| query.with(chain, address));

    let balances = state.aggregator.get_balances(&query).await;
    Json(BalancesResponse {
        success: true,
        balances,
    })
}

/// `GET /api/transactions/history`
pub async fn get_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        success: true,
        transactions: state.ledger.history(&user.id),
    })
}

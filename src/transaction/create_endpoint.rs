//! Defines the endpoint for appending a new transaction.
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    ledger::Ledger,
    transaction::{NewTransaction, TransactionPayload},
};

/// A route handler for appending a transaction to the ledger.
///
/// Responds with the created transaction as JSON, a 400 status if the
/// request body is invalid, or a 500 status if the transaction could not be
/// stored.
pub async fn create_transaction_endpoint(
    State(ledger): State<Ledger>,
    payload: Result<Json<TransactionPayload>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            tracing::warn!("could not decode transaction payload: {rejection}");
            return Error::InvalidRequestBody(rejection.body_text()).into_response();
        }
    };

    let new_transaction = match NewTransaction::try_from(payload) {
        Ok(new_transaction) => new_transaction,
        Err(error) => {
            tracing::warn!("rejected transaction: {error}");
            return error.into_response();
        }
    };

    match ledger.append(new_transaction) {
        Ok(transaction) => Json(transaction).into_response(),
        Err(error) => error.into_append_response(),
    }
}

//! Defines the endpoint for listing the transactions in the ledger.
use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};

use crate::ledger::Ledger;

/// A route handler for listing all transactions, most recent date first.
pub async fn get_transactions_endpoint(State(ledger): State<Ledger>) -> Response {
    match ledger.list() {
        Ok(transactions) => Json(transactions).into_response(),
        Err(error) => error.into_list_response(),
    }
}

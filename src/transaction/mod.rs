//! Transactions recorded in the ledger.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the validated `NewTransaction` input
//! - Database functions for storing and querying transactions
//! - The route handlers for creating and listing transactions

mod core;
mod create_endpoint;
mod list_endpoint;

pub use core::{
    AmountInput, NewTransaction, Transaction, TransactionPayload, TransactionType,
    create_transaction_table, get_latest_balance, insert_transaction, list_transactions,
};
pub use create_endpoint::create_transaction_endpoint;
pub use list_endpoint::get_transactions_endpoint;

#[cfg(test)]
pub use core::count_transactions;

//! Database ID type definition.

/// Alias for the integer type used for transaction IDs assigned by the database.
pub type TransactionId = i64;

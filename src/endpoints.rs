//! The API endpoints URIs.

/// The route to append and list transactions.
pub const TRANSACTIONS: &str = "/transactions";

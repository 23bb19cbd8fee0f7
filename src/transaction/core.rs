//! Defines the core data models and database queries for transactions.

use std::fmt::Display;

use rusqlite::{
    Connection, OptionalExtension, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::TransactionId};

// ============================================================================
// MODELS
// ============================================================================

/// Whether a transaction adds money to the ledger or takes money out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming in, increases the balance.
    Credit,
    /// Money going out, decreases the balance.
    Debit,
}

impl TransactionType {
    /// The name of the type as stored in the database and sent over the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "credit",
            TransactionType::Debit => "debit",
        }
    }

    /// Apply a movement of `amount` to `balance`.
    pub fn apply(&self, balance: f64, amount: f64) -> f64 {
        match self {
            TransactionType::Credit => balance + amount,
            TransactionType::Debit => balance - amount,
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TransactionType {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "credit" => Ok(TransactionType::Credit),
            "debit" => Ok(TransactionType::Debit),
            other => Err(Error::InvalidTransactionType(other.to_owned())),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        TransactionType::try_from(text).map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A credit or debit recorded in the ledger.
///
/// Transactions are created by [Ledger::append](crate::Ledger::append) and
/// are never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction, assigned by the database.
    pub id: TransactionId,
    /// Whether the transaction is a credit or a debit.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The magnitude of the movement. The sign is given by `transaction_type`.
    pub amount: f64,
    /// Text detailing the transaction.
    pub description: Option<String>,
    /// The caller supplied date of the transaction, kept as an opaque string.
    pub date: String,
    /// The balance of the ledger right after this transaction was applied.
    ///
    /// `None` only for rows that were written without a balance by something
    /// other than this service.
    pub running_balance: Option<f64>,
}

/// The validated input for appending a transaction to the ledger.
///
/// Build one with [NewTransaction::new] or by converting a
/// [TransactionPayload] with `try_from`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    transaction_type: TransactionType,
    amount: f64,
    description: Option<String>,
    date: String,
}

impl NewTransaction {
    /// Create a new transaction input.
    ///
    /// # Errors
    /// Returns [Error::InvalidAmount] if `amount` is negative or not finite,
    /// or [Error::MissingField] if `date` is empty or `amount` is zero.
    pub fn new(
        transaction_type: TransactionType,
        amount: f64,
        description: Option<String>,
        date: &str,
    ) -> Result<Self, Error> {
        if amount == 0.0 {
            return Err(Error::MissingField("amount"));
        }

        if date.is_empty() {
            return Err(Error::MissingField("date"));
        }

        Ok(Self {
            transaction_type,
            amount: validate_amount(amount)?,
            description,
            date: date.to_owned(),
        })
    }

    /// Whether the transaction is a credit or a debit.
    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    /// The magnitude of the movement.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Text detailing the transaction, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The caller supplied date.
    pub fn date(&self) -> &str {
        &self.date
    }
}

fn validate_amount(amount: f64) -> Result<f64, Error> {
    if !amount.is_finite() {
        return Err(Error::InvalidAmount(format!("{amount} is not a finite number")));
    }

    if amount < 0.0 {
        return Err(Error::InvalidAmount(format!(
            "{amount} is negative, use the transaction type to give the direction"
        )));
    }

    Ok(amount)
}

/// An amount as sent by a client, either a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    /// A JSON number, e.g. `12.5`.
    Number(f64),
    /// A string holding a number, e.g. `"12.5"`.
    Text(String),
}

/// The request body for creating a transaction, before validation.
///
/// Every field is optional here so that a missing field can be reported as a
/// client error instead of a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPayload {
    /// Either "credit" or "debit".
    #[serde(rename = "type", default)]
    pub transaction_type: Option<String>,
    /// The magnitude of the movement.
    #[serde(default)]
    pub amount: Option<AmountInput>,
    /// Text detailing the transaction.
    #[serde(default)]
    pub description: Option<String>,
    /// The date of the transaction.
    #[serde(default)]
    pub date: Option<String>,
}

impl TryFrom<TransactionPayload> for NewTransaction {
    type Error = Error;

    /// Validate the payload.
    ///
    /// Presence is checked for the type, amount and date (in that order)
    /// before the type and amount values are checked. Empty strings and a
    /// zero amount count as missing.
    fn try_from(payload: TransactionPayload) -> Result<Self, Self::Error> {
        let transaction_type = payload
            .transaction_type
            .filter(|transaction_type| !transaction_type.is_empty())
            .ok_or(Error::MissingField("type"))?;

        let amount = match payload.amount {
            None => return Err(Error::MissingField("amount")),
            Some(AmountInput::Number(amount)) if amount == 0.0 => {
                return Err(Error::MissingField("amount"));
            }
            Some(AmountInput::Text(text)) if text.is_empty() => {
                return Err(Error::MissingField("amount"));
            }
            Some(amount) => amount,
        };

        let date = payload
            .date
            .filter(|date| !date.is_empty())
            .ok_or(Error::MissingField("date"))?;

        let transaction_type = TransactionType::try_from(transaction_type.as_str())?;

        let amount = match amount {
            AmountInput::Number(amount) => amount,
            AmountInput::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|error| Error::InvalidAmount(format!("\"{text}\": {error}")))?,
        };

        if amount == 0.0 {
            return Err(Error::InvalidAmount("amount must be greater than zero".to_owned()));
        }

        NewTransaction::new(transaction_type, amount, payload.description, &date)
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transactions table in the database if it does not exist.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL,
                amount REAL NOT NULL,
                description TEXT,
                date TEXT NOT NULL,
                running_balance REAL
                )",
        (),
    )?;

    Ok(())
}

/// Get the running balance of the most recently created transaction.
///
/// Returns zero if there are no transactions, or if the latest transaction
/// has no running balance.
///
/// # Errors
/// Returns an error if the query fails or the stored balance is not a number.
pub fn get_latest_balance(connection: &Connection) -> Result<f64, rusqlite::Error> {
    let balance: Option<Option<f64>> = connection
        .query_row(
            "SELECT running_balance FROM transactions ORDER BY id DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(balance.flatten().unwrap_or(0.0))
}

/// Insert a transaction with its precomputed `running_balance`.
///
/// # Errors
/// Returns [Error::SqlError] if the insert fails.
pub fn insert_transaction(
    new_transaction: &NewTransaction,
    running_balance: f64,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO transactions (type, amount, description, date, running_balance)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, type, amount, description, date, running_balance",
        )?
        .query_row(
            (
                new_transaction.transaction_type(),
                new_transaction.amount(),
                new_transaction.description(),
                new_transaction.date(),
                running_balance,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Get all transactions, most recent date first.
///
/// Dates are compared as text, so dates in a sortable format such as
/// ISO 8601 give a chronological order.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn list_transactions(connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, type, amount, description, date, running_balance
             FROM transactions
             ORDER BY date DESC",
        )?
        .query_map([], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM transactions;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let transaction_type = row.get(1)?;
    let amount = row.get(2)?;
    let description = row.get(3)?;
    let date = row.get(4)?;
    let running_balance = row.get(5)?;

    Ok(Transaction {
        id,
        transaction_type,
        amount,
        description,
        date,
        running_balance,
    })
}

// ============================================================================
// TESTS
// ============================================================================

//! The ledger service: appends transactions with their running balance and
//! lists the recorded transactions.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, TransactionBehavior};

use crate::{
    Error,
    transaction::{
        NewTransaction, Transaction, get_latest_balance, insert_transaction, list_transactions,
    },
};

/// What [Ledger::append] does when the current balance cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum BalanceFallback {
    /// Log a warning and continue as if the balance were zero.
    #[default]
    Zero,
    /// Fail the append with [Error::BalanceUnavailable].
    Reject,
}

/// Records transactions in the database and keeps the running balance.
///
/// Appends hold the connection lock and an immediate SQL transaction from
/// the balance lookup until the insert commits, so concurrent appends are
/// applied one after the other.
#[derive(Debug, Clone)]
pub struct Ledger {
    connection: Arc<Mutex<Connection>>,
    balance_fallback: BalanceFallback,
}

impl Ledger {
    /// Create a ledger that stores transactions using `connection`.
    ///
    /// The database must already be initialized with
    /// [initialize_db](crate::initialize_db).
    pub fn new(connection: Arc<Mutex<Connection>>, balance_fallback: BalanceFallback) -> Self {
        Self {
            connection,
            balance_fallback,
        }
    }

    /// Append a transaction to the ledger.
    ///
    /// The running balance of the new transaction is the running balance of
    /// the most recently created transaction (zero if there is none) plus the
    /// amount for a credit, or minus the amount for a debit.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidAmount] if the new balance would not be a finite number,
    /// - or [Error::BalanceUnavailable] if the current balance cannot be read and
    ///   the fallback is [BalanceFallback::Reject],
    /// - or [Error::DatabaseLockError] if the connection lock is poisoned,
    /// - or [Error::SqlError] if the transaction could not be written.
    ///
    /// No transaction is written when an error is returned.
    pub fn append(&self, new_transaction: NewTransaction) -> Result<Transaction, Error> {
        let mut connection = self.lock()?;
        let sql_transaction =
            connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let balance = match get_latest_balance(&sql_transaction) {
            Ok(balance) => balance,
            Err(error) => match self.balance_fallback {
                BalanceFallback::Zero => {
                    tracing::warn!(
                        "could not read the current balance, continuing from zero: {error}"
                    );
                    0.0
                }
                BalanceFallback::Reject => {
                    return Err(Error::BalanceUnavailable(error.to_string()));
                }
            },
        };

        let new_balance = new_transaction
            .transaction_type()
            .apply(balance, new_transaction.amount());

        if !new_balance.is_finite() {
            return Err(Error::InvalidAmount(format!(
                "applying {} to the balance {balance} overflows",
                new_transaction.amount()
            )));
        }

        let transaction = insert_transaction(&new_transaction, new_balance, &sql_transaction)?;
        sql_transaction.commit()?;

        tracing::debug!(
            "appended {} transaction {} of {}, balance {balance} -> {new_balance}",
            transaction.transaction_type,
            transaction.id,
            transaction.amount,
        );

        Ok(transaction)
    }

    /// Get all transactions, most recent date first.
    ///
    /// # Errors
    /// Returns [Error::DatabaseLockError] if the connection lock is poisoned,
    /// or [Error::SqlError] if the transactions could not be read.
    pub fn list(&self) -> Result<Vec<Transaction>, Error> {
        let connection = self.lock()?;

        list_transactions(&connection)
    }

    /// Get the balance that the next append will start from.
    ///
    /// # Errors
    /// Returns [Error::DatabaseLockError] if the connection lock is poisoned,
    /// or [Error::SqlError] if the balance could not be read.
    pub fn current_balance(&self) -> Result<f64, Error> {
        let connection = self.lock()?;

        Ok(get_latest_balance(&connection)?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })
    }
}

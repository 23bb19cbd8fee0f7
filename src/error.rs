//! Defines the app level error type and its conversion to HTTP responses.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A required field was missing, `null` or empty in the request body.
    ///
    /// The string is the name of the first missing field.
    #[error("missing required field \"{0}\"")]
    MissingField(&'static str),

    /// The transaction type was something other than "credit" or "debit".
    #[error("invalid transaction type \"{0}\", expected \"credit\" or \"debit\"")]
    InvalidTransactionType(String),

    /// The amount could not be interpreted as a positive, finite number.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The request body could not be decoded into a transaction payload.
    #[error("could not decode the request body: {0}")]
    InvalidRequestBody(String),

    /// The current balance could not be read and the ledger is configured to
    /// reject appends in that case.
    ///
    /// The string holds the underlying error and should only be logged.
    #[error("could not read the current balance: {0}")]
    BalanceUnavailable(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        tracing::error!("an unhandled SQL error occurred: {}", value);
        Error::SqlError(value)
    }
}

impl Error {
    /// Whether the error was caused by bad client input rather than a server
    /// side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::MissingField(_)
                | Error::InvalidTransactionType(_)
                | Error::InvalidAmount(_)
                | Error::InvalidRequestBody(_)
        )
    }

    /// Convert the error into a response for a failed append.
    pub fn into_append_response(self) -> Response {
        if self.is_client_error() {
            return self.into_response();
        }

        tracing::error!("could not add transaction: {self}");
        (StatusCode::INTERNAL_SERVER_ERROR, "Error adding transaction").into_response()
    }

    /// Convert the error into a response for a failed listing.
    pub fn into_list_response(self) -> Response {
        if self.is_client_error() {
            return self.into_response();
        }

        tracing::error!("could not fetch transactions: {self}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error fetching transactions",
        )
            .into_response()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::MissingField(_) => {
                (StatusCode::BAD_REQUEST, "Missing required fields").into_response()
            }
            Error::InvalidTransactionType(_) => {
                (StatusCode::BAD_REQUEST, "Invalid transaction type").into_response()
            }
            Error::InvalidAmount(_) => (StatusCode::BAD_REQUEST, "Invalid amount").into_response(),
            Error::InvalidRequestBody(_) => {
                (StatusCode::BAD_REQUEST, "Invalid request body").into_response()
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

//! Defines the app level error type and its conversion into JSON error responses.
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request did not include a bearer token, or the `Authorization`
    /// header could not be parsed.
    #[error("missing or malformed authorization header")]
    Unauthenticated,

    /// The username and password did not match a registered user, or the
    /// bearer token failed the signature/expiry check, or the token refers to
    /// a user that no longer exists.
    #[error("invalid credentials")]
    InvalidCredential,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An empty string was used as a username.
    #[error("username cannot be empty")]
    EmptyUsername,

    /// The username is already taken by another user.
    #[error("the username is already taken")]
    DuplicateUsername,

    /// A transaction or category type other than "income" or "expense".
    #[error("invalid type \"{0}\", must be 'income' or 'expense'")]
    InvalidTransactionType(String),

    /// An amount that is negative, infinite or NaN.
    #[error("invalid amount {0}, amounts must be a non-negative number")]
    InvalidAmount(f64),

    /// An empty string was used to create a category name.
    #[error("category name cannot be empty")]
    EmptyCategoryName,

    /// A date query parameter that is not in the format YYYY-MM-DD.
    #[error("invalid date \"{0}\", expected the format YYYY-MM-DD")]
    InvalidDate(String),

    /// The start of a date range falls after its end.
    #[error("invalid date range, {start} is after {end}")]
    InvalidDateRange {
        /// The first day of the requested range.
        start: String,
        /// The last day of the requested range.
        end: String,
    },

    /// The request body could not be parsed as the expected JSON object.
    #[error("invalid request body: {0}")]
    InvalidJson(String),

    /// The query string could not be parsed into the expected parameters.
    #[error("invalid query string: {0}")]
    InvalidQuery(String),

    /// A path parameter could not be parsed as an ID.
    #[error("invalid ID: {0}")]
    InvalidId(String),

    /// The requested resource was not found, or it belongs to another user.
    ///
    /// Both cases share one error so that clients cannot probe for the
    /// existence of other users' records.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A bearer token could not be signed.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// A sum of transaction amounts is too large to represent as a finite number.
    #[error("the {0} is too large to represent")]
    TotalOutOfRange(&'static str),

    /// A connection could not be checked out of the database pool.
    #[error("could not get a database connection: {0}")]
    PoolError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                Some(ref desc),
            ) if desc.ends_with("user.username") => Error::DuplicateUsername,
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<r2d2::Error> for Error {
    fn from(value: r2d2::Error) -> Self {
        tracing::error!("could not check out a database connection: {value}");
        Error::PoolError(value.to_string())
    }
}

impl From<JsonRejection> for Error {
    fn from(value: JsonRejection) -> Self {
        Error::InvalidJson(value.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(value: QueryRejection) -> Self {
        Error::InvalidQuery(value.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(value: PathRejection) -> Self {
        Error::InvalidId(value.body_text())
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated | Error::InvalidCredential => StatusCode::UNAUTHORIZED,
            Error::TooWeak(_)
            | Error::EmptyUsername
            | Error::InvalidTransactionType(_)
            | Error::InvalidAmount(_)
            | Error::EmptyCategoryName
            | Error::InvalidDate(_)
            | Error::InvalidDateRange { .. }
            | Error::InvalidJson(_)
            | Error::InvalidQuery(_)
            | Error::InvalidId(_) => StatusCode::BAD_REQUEST,
            Error::DuplicateUsername => StatusCode::CONFLICT,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::InvalidTimezone(_)
            | Error::TotalOutOfRange(_)
            | Error::PoolError(_)
            | Error::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status.is_server_error() {
            // Server faults are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

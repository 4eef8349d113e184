//! Defines the app level error type and its conversion to JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::transaction::TransactionType;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of email and password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The string is not a valid email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The email address is already registered to another user.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// A required text field was empty or only whitespace.
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    /// Money amounts must be finite and greater than zero.
    #[error("{0} is not a valid amount")]
    InvalidAmount(f64),

    /// Months are numbered 1 (January) through 12 (December).
    #[error("{0} is not a valid month, expected a number from 1 to 12")]
    InvalidMonth(u8),

    /// Days of the month are numbered 1 through 31.
    #[error("{0} is not a valid day of the month, expected a number from 1 to 31")]
    InvalidDayOfMonth(u8),

    /// A date could not be constructed, e.g. the year is out of range.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// A fixed recurring expense was created without an amount.
    #[error("fixed recurring expenses need an amount")]
    MissingFixedAmount,

    /// A transaction is missing an account required by its type.
    #[error("{0} transactions need a {1} account")]
    MissingAccount(TransactionType, &'static str),

    /// The role is not one of ADMIN, COLLABORATOR or VIEWER.
    #[error("invalid role \"{0}\"")]
    InvalidRole(String),

    /// The requester is not allowed to perform the action on the context.
    #[error("forbidden: only admins can manage members")]
    Forbidden,

    /// No user is registered with the given email address.
    #[error("no user is registered with the email address \"{0}\"")]
    UnknownUser(String),

    /// The request did not identify the requesting user via the `x-user-id` header.
    #[error("the x-user-id header is missing or is not a valid user ID")]
    MissingRequester,

    /// The user is already a member of the context.
    #[error("the user is already a member of the context")]
    DuplicateMembership,

    /// Another budget already exists for the same category and month.
    #[error("a budget already exists for this category and month")]
    DuplicateBudget,

    /// A row references a row that does not exist, or a row that is still
    /// referenced by other rows was deleted.
    #[error("the operation violates a foreign key constraint")]
    ForeignKeyViolation,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing or deserializing JSON.
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to update a context that does not exist
    #[error("tried to update a context that is not in the database")]
    UpdateMissingContext,

    /// Tried to delete a context that does not exist
    #[error("tried to delete a context that is not in the database")]
    DeleteMissingContext,

    /// Tried to remove a membership that does not exist
    #[error("the user is not a member of the context")]
    DeleteMissingMembership,

    /// Tried to update an account that does not exist
    #[error("tried to update an account that is not in the database")]
    UpdateMissingAccount,

    /// Tried to archive an account that does not exist
    #[error("tried to delete an account that is not in the database")]
    DeleteMissingAccount,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to update a budget that does not exist
    #[error("tried to update a budget that is not in the database")]
    UpdateMissingBudget,

    /// Tried to delete a budget that does not exist
    #[error("tried to delete a budget that is not in the database")]
    DeleteMissingBudget,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.contains("membership.") =>
            {
                Error::DuplicateMembership
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.contains("budget.") =>
            {
                Error::DuplicateBudget
            }
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                Error::ForeignKeyViolation
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::JSONSerializationError(value.to_string())
    }
}

impl Error {
    /// The HTTP status code that should be sent to the client for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::TooWeak(_)
            | Error::InvalidEmail(_)
            | Error::EmptyField(_)
            | Error::InvalidAmount(_)
            | Error::InvalidMonth(_)
            | Error::InvalidDayOfMonth(_)
            | Error::InvalidDate(_)
            | Error::MissingFixedAmount
            | Error::MissingAccount(_, _)
            | Error::InvalidRole(_)
            | Error::UnknownUser(_) => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials | Error::MissingRequester => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::NotFound
            | Error::UpdateMissingContext
            | Error::DeleteMissingContext
            | Error::DeleteMissingMembership
            | Error::UpdateMissingAccount
            | Error::DeleteMissingAccount
            | Error::UpdateMissingCategory
            | Error::DeleteMissingCategory
            | Error::UpdateMissingBudget
            | Error::DeleteMissingBudget => StatusCode::NOT_FOUND,
            Error::DuplicateEmail
            | Error::DuplicateMembership
            | Error::DuplicateBudget
            | Error::ForeignKeyViolation => StatusCode::CONFLICT,
            Error::HashingError(_)
            | Error::SqlError(_)
            | Error::InvalidTimezoneError(_)
            | Error::JSONSerializationError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match self {
            Error::InvalidTimezoneError(timezone) => format!(
                "Could not get local timezone \"{timezone}\". Check your server settings and \
                ensure the timezone has been set to valid, canonical timezone string"
            ),
            // Internal details are not intended to be shown to the client.
            error if status.is_server_error() => {
                tracing::error!("An unexpected error occurred: {}", error);
                "An unexpected error occurred, check the server logs for more details.".to_owned()
            }
            error => error.to_string(),
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

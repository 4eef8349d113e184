//! The endpoint for checking a user's credentials.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    user::{PublicUser, get_user_by_email},
};

/// The state needed to perform a log-in.
#[derive(Debug, Clone)]
pub struct LoginState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The credentials for a log-in request.
#[derive(Clone, Deserialize)]
pub struct LogInData {
    pub email: String,
    pub password: String,
}

/// Handler for log-in requests.
///
/// Returns the user's public profile when the email and password match.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if the email does not belong to a
/// registered user or the password is not correct. An unknown email and a
/// wrong password are indistinguishable to the client.
pub async fn post_log_in(
    State(state): State<LoginState>,
    Json(credentials): Json<LogInData>,
) -> Result<Json<PublicUser>, Error> {
    let user = {
        let connection = lock_connection(&state.db_connection)?;
        get_user_by_email(&credentials.email, &connection)?
    }
    .ok_or(Error::InvalidCredentials)?;

    let is_password_valid = user
        .password_hash
        .verify(&credentials.password)
        .map_err(|error| {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            Error::HashingError(error.to_string())
        })?;

    if !is_password_valid {
        tracing::debug!("wrong password for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }

    Ok(Json(PublicUser::from(user)))
}

//! The endpoint for registering a new user.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    app_state::lock_connection,
    user::{NewUser, PublicUser, create_user},
};

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The bcrypt cost used to hash the new user's password.
    pub password_hash_cost: u32,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            password_hash_cost: state.password_hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The data for registering a user.
#[derive(Clone, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// A route handler for registering a new user.
///
/// The password must be strong enough, taking the user's name and email into
/// account, and is stored only as a salted hash.
///
/// # Errors
/// This function will return a:
/// - [Error::TooWeak] if the password is too easy to guess,
/// - [Error::InvalidEmail] or [Error::EmptyField] for an invalid email or name,
/// - [Error::DuplicateEmail] if the email is already registered,
/// - or [Error::HashingError] if the password could not be hashed.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Json(form): Json<RegisterForm>,
) -> Result<(StatusCode, Json<PublicUser>), Error> {
    let password = ValidatedPassword::new(&form.password, &[&form.name, &form.email])?;
    let password_hash = PasswordHash::new(password, state.password_hash_cost).inspect_err(|error| {
        tracing::error!("could not hash password: {error}");
    })?;

    let connection = lock_connection(&state.db_connection)?;
    let user = create_user(
        NewUser {
            name: form.name,
            email: form.email,
            password_hash,
        },
        &connection,
    )?;

    tracing::info!("registered user {}", user.id);

    Ok((StatusCode::CREATED, Json(PublicUser::from(user))))
}

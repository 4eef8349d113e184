//! Defines the endpoint for creating a new account.

use axum::{Json, extract::State, http::StatusCode};

use crate::{
    Error,
    account::{Account, AccountState, NewAccount, create_account},
    app_state::lock_connection,
};

/// A route handler for creating a new account, responds with the created account.
pub async fn create_account_endpoint(
    State(state): State<AccountState>,
    Json(new_account): Json<NewAccount>,
) -> Result<(StatusCode, Json<Account>), Error> {
    let connection = lock_connection(&state.db_connection)?;
    let account = create_account(new_account, &connection)?;

    tracing::info!("created account {} in context {}", account.id, account.context_id);

    Ok((StatusCode::CREATED, Json(account)))
}

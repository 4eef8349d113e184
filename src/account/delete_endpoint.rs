//! Defines the endpoint for deleting an account.
//!
//! Accounts are never removed from the database, deleting one archives it so
//! that the transactions referencing it keep their history.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    Error,
    account::{Account, AccountState, archive_account},
    app_state::lock_connection,
    database_id::AccountId,
};

/// A route handler for archiving an account, responds with the archived account.
pub async fn delete_account_endpoint(
    State(state): State<AccountState>,
    Path(account_id): Path<AccountId>,
) -> Result<Json<Account>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let account = archive_account(account_id, &connection)?;

    tracing::info!("archived account {account_id}");

    Ok(Json(account))
}

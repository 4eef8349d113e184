//! Defines the endpoints for reading accounts.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    Error,
    account::{Account, AccountState, AccountWithBalance, get_account, get_accounts_with_balance},
    app_state::lock_connection,
    database_id::{AccountId, ContextId},
};

pub async fn get_account_endpoint(
    State(state): State<AccountState>,
    Path(account_id): Path<AccountId>,
) -> Result<Json<Account>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_account(account_id, &connection)?
        .map(Json)
        .ok_or(Error::NotFound)
}

/// A route handler for listing a context's active accounts with a computed `currentBalance`.
pub async fn get_accounts_endpoint(
    State(state): State<AccountState>,
    Path(context_id): Path<ContextId>,
) -> Result<Json<Vec<AccountWithBalance>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_accounts_with_balance(context_id, &connection).map(Json)
}

//! Defines the endpoints for reading transactions.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    Error,
    app_state::lock_connection,
    database_id::{AccountId, ContextId, TransactionId},
    transaction::{
        Transaction, TransactionListing, TransactionState, get_transaction,
        get_transactions_by_account, get_transactions_by_context,
    },
};

pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_transaction(transaction_id, &connection)?
        .map(Json)
        .ok_or(Error::NotFound)
}

pub async fn get_context_transactions_endpoint(
    State(state): State<TransactionState>,
    Path(context_id): Path<ContextId>,
) -> Result<Json<Vec<TransactionListing>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_transactions_by_context(context_id, &connection).map(Json)
}

pub async fn get_account_transactions_endpoint(
    State(state): State<TransactionState>,
    Path(account_id): Path<AccountId>,
) -> Result<Json<Vec<TransactionListing>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_transactions_by_account(account_id, &connection).map(Json)
}

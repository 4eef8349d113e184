//! Defines the endpoint for settling a scheduled transaction.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    Error,
    app_state::lock_connection,
    database_id::TransactionId,
    transaction::{Transaction, TransactionState, settle_transaction},
};

/// The request body for settling a transaction.
#[derive(Debug, Deserialize)]
pub struct PayTransactionRequest {
    /// When the payment was made.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

/// A route handler for marking a transaction as paid, responds with the updated transaction.
pub async fn pay_transaction_endpoint(
    State(state): State<TransactionState>,
    Path(transaction_id): Path<TransactionId>,
    Json(request): Json<PayTransactionRequest>,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    settle_transaction(transaction_id, request.date, &connection)?
        .map(Json)
        .ok_or(Error::NotFound)
}

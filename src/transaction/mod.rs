//! The transaction ledger.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model, its settlement state and `TransactionBuilder` for creating transactions
//! - Splitting purchases into monthly installments
//! - Database functions for storing, listing and settling transactions
//! - The route handlers for the transaction API

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod core;
mod create_endpoint;
mod get_endpoint;
mod installments;
mod pay_endpoint;
mod query;

pub use core::{
    Settlement, Transaction, TransactionBuilder, TransactionType, create_transaction,
    create_transaction_table, get_transaction, map_transaction_row, settle_transaction,
};
pub use create_endpoint::create_transaction_endpoint;
pub use get_endpoint::{
    get_account_transactions_endpoint, get_context_transactions_endpoint,
    get_transaction_endpoint,
};
pub use installments::{CreatedTransactions, create_installments};
pub use pay_endpoint::pay_transaction_endpoint;
pub use query::{TransactionListing, get_transactions_by_account, get_transactions_by_context};

/// The state needed to manage transactions.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

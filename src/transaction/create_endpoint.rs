//! Defines the endpoint for creating transactions and installment groups.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    Error,
    app_state::lock_connection,
    database_id::{AccountId, CategoryId, ContextId},
    transaction::{
        CreatedTransactions, Transaction, TransactionState, TransactionType, create_installments,
    },
};

/// The request body for creating a transaction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub context_id: ContextId,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub is_paid: bool,
    pub category_id: Option<CategoryId>,
    pub source_account_id: Option<AccountId>,
    pub destination_account_id: Option<AccountId>,
    /// Split the amount over this many months, values of one or less create a single transaction.
    pub installments: Option<i64>,
}

/// Check that a transaction has the accounts its type needs.
///
/// EXPENSE needs a source account, INCOME a destination account, TRANSFER and
/// INVESTMENT need both.
///
/// # Errors
/// Returns [Error::MissingAccount] naming the first missing account.
pub fn check_accounts(
    transaction_type: TransactionType,
    source_account_id: Option<AccountId>,
    destination_account_id: Option<AccountId>,
) -> Result<(), Error> {
    let (needs_source, needs_destination) = match transaction_type {
        TransactionType::Expense => (true, false),
        TransactionType::Income => (false, true),
        TransactionType::Transfer | TransactionType::Investment => (true, true),
    };

    if needs_source && source_account_id.is_none() {
        return Err(Error::MissingAccount(transaction_type, "source"));
    }

    if needs_destination && destination_account_id.is_none() {
        return Err(Error::MissingAccount(transaction_type, "destination"));
    }

    Ok(())
}

/// A route handler for creating a transaction.
///
/// Responds with the created transaction, or an array of transactions if
/// `installments` is greater than one.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<CreatedTransactions>), Error> {
    check_accounts(
        request.transaction_type,
        request.source_account_id,
        request.destination_account_id,
    )?;

    let builder = Transaction::build(
        request.context_id,
        request.transaction_type,
        request.amount,
        request.date,
        &request.description,
    )
    .due_date(request.due_date)
    .paid(request.is_paid)
    .category(request.category_id)
    .source_account(request.source_account_id)
    .destination_account(request.destination_account_id);

    // Non-positive counts fall back to a single transaction.
    let installments = request
        .installments
        .map(|count| u32::try_from(count.max(0)).unwrap_or(u32::MAX));

    let connection = lock_connection(&state.db_connection)?;
    let created = create_installments(builder, installments, &connection)?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[cfg(test)]
mod check_accounts_tests {
    use crate::{Error, transaction::TransactionType};

    use super::check_accounts;

    #[test]
    fn expense_needs_source() {
        assert_eq!(check_accounts(TransactionType::Expense, Some(1), None), Ok(()));
        assert_eq!(
            check_accounts(TransactionType::Expense, None, Some(1)),
            Err(Error::MissingAccount(TransactionType::Expense, "source"))
        );
    }

    #[test]
    fn income_needs_destination() {
        assert_eq!(check_accounts(TransactionType::Income, None, Some(1)), Ok(()));
        assert_eq!(
            check_accounts(TransactionType::Income, Some(1), None),
            Err(Error::MissingAccount(TransactionType::Income, "destination"))
        );
    }

    #[test]
    fn transfer_and_investment_need_both() {
        for transaction_type in [TransactionType::Transfer, TransactionType::Investment] {
            assert_eq!(check_accounts(transaction_type, Some(1), Some(2)), Ok(()));
            assert!(check_accounts(transaction_type, Some(1), None).is_err());
            assert!(check_accounts(transaction_type, None, Some(2)).is_err());
        }
    }
}

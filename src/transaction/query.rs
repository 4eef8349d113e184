//! Read queries for listing transactions with the names of what they reference.

use rusqlite::{Connection, Row, ToSql, named_params};
use serde::Serialize;

use crate::{
    Error,
    database_id::{AccountId, ContextId},
    transaction::{Transaction, map_transaction_row},
};

/// The display name of an account referenced by a transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountName {
    pub name: String,
}

/// The display details of the category of a transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub icon: Option<String>,
}

/// A transaction annotated with its account names and category details.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListing {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub source_account: Option<AccountName>,
    pub destination_account: Option<AccountName>,
    pub category: Option<CategorySummary>,
}

const LISTING_QUERY: &str = "SELECT t.id, t.context_id, t.description, t.amount, t.type, t.date, \
    t.due_date, t.is_paid, t.payment_date, t.source_account_id, t.destination_account_id, \
    t.category_id, t.installment_number, t.installments_total, \
    source.name, destination.name, category.name, category.icon \
    FROM \"transaction\" t \
    LEFT JOIN account source ON source.id = t.source_account_id \
    LEFT JOIN account destination ON destination.id = t.destination_account_id \
    LEFT JOIN category ON category.id = t.category_id";

/// Get the transactions of a context, newest first.
pub fn get_transactions_by_context(
    context_id: ContextId,
    connection: &Connection,
) -> Result<Vec<TransactionListing>, Error> {
    query_listing(
        "t.context_id = :id",
        named_params! {":id": context_id},
        connection,
    )
}

/// Get the transactions paid out of or into an account, newest first.
///
/// Archived accounts are included.
pub fn get_transactions_by_account(
    account_id: AccountId,
    connection: &Connection,
) -> Result<Vec<TransactionListing>, Error> {
    query_listing(
        "t.source_account_id = :id OR t.destination_account_id = :id",
        named_params! {":id": account_id},
        connection,
    )
}

fn query_listing(
    condition: &str,
    params: &[(&str, &dyn ToSql)],
    connection: &Connection,
) -> Result<Vec<TransactionListing>, Error> {
    // Sort by date, and then ID to keep the order stable for transactions on the same date
    connection
        .prepare(&format!(
            "{LISTING_QUERY} WHERE {condition} ORDER BY t.date DESC, t.id DESC"
        ))?
        .query_map(params, map_listing_row)?
        .map(|maybe_listing| maybe_listing.map_err(Error::from))
        .collect()
}

fn map_listing_row(row: &Row) -> Result<TransactionListing, rusqlite::Error> {
    let transaction = map_transaction_row(row)?;
    let source_account = row
        .get::<_, Option<String>>(14)?
        .map(|name| AccountName { name });
    let destination_account = row
        .get::<_, Option<String>>(15)?
        .map(|name| AccountName { name });
    let category = row
        .get::<_, Option<String>>(16)?
        .map(|name| -> Result<CategorySummary, rusqlite::Error> {
            Ok(CategorySummary {
                name,
                icon: row.get(17)?,
            })
        })
        .transpose()?;

    Ok(TransactionListing {
        transaction,
        source_account,
        destination_account,
        category,
    })
}

//! Accounts hold money within a context. Their current balance is derived from settled transactions.

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::{AccountId, ContextId},
    sql_enum::text_enum,
    validation::non_empty,
};

text_enum! {
    /// What kind of financial container an account is.
    pub enum AccountType {
        /// A bank account or a wallet.
        Cash => "CASH",
        /// A credit card.
        Credit => "CREDIT",
        /// A brokerage or savings account.
        Investment => "INVESTMENT",
        /// Property, e.g. a car.
        Asset => "ASSET",
    }
}

/// A named container for money, e.g. a bank account or a credit card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The context that owns the account.
    pub context_id: ContextId,
    /// The display name of the account.
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// The balance before any recorded transaction, may be negative.
    pub initial_balance: f64,
    /// Archived accounts are hidden from listings but kept for historical transactions.
    pub archived: bool,
}

/// An account together with its balance after all settled transactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountWithBalance {
    #[serde(flatten)]
    pub account: Account,
    pub current_balance: f64,
}

/// The data needed to create an account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    /// The context that owns the account.
    pub context_id: ContextId,
    /// The display name, must not be blank.
    pub name: String,
    /// What kind of account this is.
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// The balance before any transactions, defaults to zero.
    #[serde(default)]
    pub initial_balance: f64,
}

/// A partial update of an account, `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdate {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub account_type: Option<AccountType>,
    pub initial_balance: Option<f64>,
    pub archived: Option<bool>,
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            context_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            type TEXT NOT NULL,
            initial_balance REAL NOT NULL DEFAULT 0,
            archived INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY(context_id) REFERENCES context(id)
        );

        CREATE INDEX IF NOT EXISTS idx_account_context ON account(context_id);",
    )?;

    Ok(())
}

pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        context_id: row.get(1)?,
        name: row.get(2)?,
        account_type: row.get(3)?,
        initial_balance: row.get(4)?,
        archived: row.get(5)?,
    })
}

/// Create a new, unarchived account.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyField] if the name is blank,
/// - [Error::InvalidAmount] if the initial balance is not a finite number,
/// - [Error::ForeignKeyViolation] if the context does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_account(new_account: NewAccount, connection: &Connection) -> Result<Account, Error> {
    let name = non_empty(&new_account.name, "name")?;
    if !new_account.initial_balance.is_finite() {
        return Err(Error::InvalidAmount(new_account.initial_balance));
    }

    connection
        .prepare(
            "INSERT INTO account (context_id, name, type, initial_balance) VALUES (?1, ?2, ?3, ?4)
             RETURNING id, context_id, name, type, initial_balance, archived",
        )?
        .query_row(
            (
                new_account.context_id,
                name,
                new_account.account_type,
                new_account.initial_balance,
            ),
            map_row_to_account,
        )
        .map_err(Error::from)
}

/// Retrieve an account by ID, archived or not. `None` if it does not exist.
pub fn get_account(id: AccountId, connection: &Connection) -> Result<Option<Account>, Error> {
    connection
        .prepare(
            "SELECT id, context_id, name, type, initial_balance, archived
             FROM account WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_row_to_account)
        .optional()
        .map_err(Error::from)
}

/// Update the fields of an account that are set in `update`.
///
/// # Errors
/// Returns [Error::UpdateMissingAccount] if the account does not exist.
pub fn update_account(
    id: AccountId,
    update: AccountUpdate,
    connection: &Connection,
) -> Result<Account, Error> {
    let name = update
        .name
        .map(|name| non_empty(&name, "name"))
        .transpose()?;
    if let Some(balance) = update.initial_balance
        && !balance.is_finite()
    {
        return Err(Error::InvalidAmount(balance));
    }

    connection
        .prepare(
            "UPDATE account
             SET name = COALESCE(?1, name),
                 type = COALESCE(?2, type),
                 initial_balance = COALESCE(?3, initial_balance),
                 archived = COALESCE(?4, archived),
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = ?5
             RETURNING id, context_id, name, type, initial_balance, archived",
        )?
        .query_row(
            (
                name,
                update.account_type,
                update.initial_balance,
                update.archived,
                id,
            ),
            map_row_to_account,
        )
        .optional()?
        .ok_or(Error::UpdateMissingAccount)
}

/// Soft delete an account by marking it as archived.
///
/// # Errors
/// Returns [Error::DeleteMissingAccount] if the account does not exist.
pub fn archive_account(id: AccountId, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare(
            "UPDATE account SET archived = 1, updated_at = CURRENT_TIMESTAMP WHERE id = ?1
             RETURNING id, context_id, name, type, initial_balance, archived",
        )?
        .query_row([id], map_row_to_account)
        .optional()?
        .ok_or(Error::DeleteMissingAccount)
}

/// Get the unarchived accounts of a context with their current balances.
///
/// The current balance is the initial balance, plus the settled transactions
/// paid into the account, minus the settled transactions paid out of it.
/// Scheduled transactions do not count. Balances are computed on every call.
pub fn get_accounts_with_balance(
    context_id: ContextId,
    connection: &Connection,
) -> Result<Vec<AccountWithBalance>, Error> {
    connection
        .prepare(
            "SELECT a.id, a.context_id, a.name, a.type, a.initial_balance, a.archived,
                a.initial_balance
                + COALESCE((SELECT SUM(t.amount) FROM \"transaction\" t
                            WHERE t.destination_account_id = a.id AND t.is_paid = 1), 0)
                - COALESCE((SELECT SUM(t.amount) FROM \"transaction\" t
                            WHERE t.source_account_id = a.id AND t.is_paid = 1), 0)
             FROM account a
             WHERE a.context_id = :context_id AND a.archived = 0
             ORDER BY a.name ASC, a.id ASC",
        )?
        .query_map(&[(":context_id", &context_id)], |row| {
            Ok(AccountWithBalance {
                account: map_row_to_account(row)?,
                current_balance: row.get(6)?,
            })
        })?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

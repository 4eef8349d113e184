//! Creates the application's database schema.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, account::create_account_table, budget::create_budget_table,
    category::create_category_table, context::create_context_table,
    context::create_membership_table, recurring_expense::create_recurring_expense_table,
    transaction::create_transaction_table, user::create_user_table,
};

/// Enable foreign keys and create every table and index that does not exist yet.
///
/// Tables are created in one exclusive SQL transaction, parents before the
/// tables that reference them. Calling this on an initialized database is a no-op.
///
/// # Errors
/// Returns an [Error::SqlError] if any table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Has no effect inside a transaction, so it must come first.
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_context_table(&transaction)?;
    create_membership_table(&transaction)?;
    create_category_table(&transaction)?;
    create_account_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_table(&transaction)?;
    create_recurring_expense_table(&transaction)?;

    transaction.commit()?;

    tracing::debug!("database schema initialized");

    Ok(())
}

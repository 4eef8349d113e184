use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::{AccountId, CategoryId, ContextId, RecurringExpenseId},
    sql_enum::text_enum,
    validation::{non_empty, positive_amount},
};

text_enum! {
    /// Whether a recurring expense costs the same every month.
    pub enum RecurrenceType {
        /// The same amount every month, e.g. rent.
        Fixed => "FIXED",
        /// An amount that changes from month to month, e.g. the power bill.
        Variable => "VARIABLE",
    }
}

/// A template for an expense that repeats on the same day every month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringExpense {
    pub id: RecurringExpenseId,
    pub context_id: ContextId,
    pub description: String,
    /// Always `None` for [RecurrenceType::Variable] expenses.
    pub amount: Option<f64>,
    #[serde(rename = "type")]
    pub recurrence_type: RecurrenceType,
    pub day_of_month: u8,
    pub notification_days_before: Option<u32>,
    pub active: bool,
    pub category_id: Option<CategoryId>,
    pub source_account_id: Option<AccountId>,
}

fn default_active() -> bool {
    true
}

/// The data needed to create a recurring expense.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecurringExpense {
    pub context_id: ContextId,
    pub description: String,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(rename = "type")]
    pub recurrence_type: RecurrenceType,
    pub day_of_month: u8,
    #[serde(default)]
    pub notification_days_before: Option<u32>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub source_account_id: Option<AccountId>,
}

pub fn create_recurring_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS recurring_expense (
            id INTEGER PRIMARY KEY,
            context_id INTEGER NOT NULL,
            description TEXT NOT NULL,
            amount REAL,
            type TEXT NOT NULL,
            day_of_month INTEGER NOT NULL CHECK (day_of_month BETWEEN 1 AND 31),
            notification_days_before INTEGER,
            active INTEGER NOT NULL DEFAULT 1,
            category_id INTEGER,
            source_account_id INTEGER,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY(context_id) REFERENCES context(id),
            FOREIGN KEY(category_id) REFERENCES category(id),
            FOREIGN KEY(source_account_id) REFERENCES account(id)
        );

        CREATE INDEX IF NOT EXISTS idx_recurring_expense_context
            ON recurring_expense(context_id);",
    )?;

    Ok(())
}

/// Create a recurring expense template.
///
/// Fixed expenses need a positive amount. Any amount given for a variable
/// expense is discarded.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyField] if the description is blank,
/// - [Error::InvalidDayOfMonth] if `day_of_month` is not 1 to 31,
/// - [Error::MissingFixedAmount] if a fixed expense has no amount,
/// - [Error::InvalidAmount] if a fixed expense's amount is not positive,
/// - [Error::ForeignKeyViolation] if a referenced row does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_recurring_expense(
    new_expense: NewRecurringExpense,
    connection: &Connection,
) -> Result<RecurringExpense, Error> {
    let description = non_empty(&new_expense.description, "description")?;

    if !(1..=31).contains(&new_expense.day_of_month) {
        return Err(Error::InvalidDayOfMonth(new_expense.day_of_month));
    }

    let amount = match new_expense.recurrence_type {
        RecurrenceType::Fixed => Some(positive_amount(
            new_expense.amount.ok_or(Error::MissingFixedAmount)?,
        )?),
        RecurrenceType::Variable => None,
    };

    connection
        .prepare(
            "INSERT INTO recurring_expense
                (context_id, description, amount, type, day_of_month,
                 notification_days_before, active, category_id, source_account_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING id, context_id, description, amount, type, day_of_month,
                notification_days_before, active, category_id, source_account_id",
        )?
        .query_row(
            (
                new_expense.context_id,
                description,
                amount,
                new_expense.recurrence_type,
                new_expense.day_of_month,
                new_expense.notification_days_before,
                new_expense.active,
                new_expense.category_id,
                new_expense.source_account_id,
            ),
            map_recurring_expense_row,
        )
        .map_err(Error::from)
}

/// Get the recurring expenses of a context, ordered by day of the month.
pub fn get_recurring_expenses(
    context_id: ContextId,
    connection: &Connection,
) -> Result<Vec<RecurringExpense>, Error> {
    connection
        .prepare(
            "SELECT id, context_id, description, amount, type, day_of_month,
                notification_days_before, active, category_id, source_account_id
             FROM recurring_expense
             WHERE context_id = :context_id
             ORDER BY day_of_month ASC, id ASC",
        )?
        .query_map(&[(":context_id", &context_id)], map_recurring_expense_row)?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

fn map_recurring_expense_row(row: &Row) -> Result<RecurringExpense, rusqlite::Error> {
    Ok(RecurringExpense {
        id: row.get(0)?,
        context_id: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        recurrence_type: row.get(4)?,
        day_of_month: row.get(5)?,
        notification_days_before: row.get(6)?,
        active: row.get(7)?,
        category_id: row.get(8)?,
        source_account_id: row.get(9)?,
    })
}

//! Monthly spending targets per category.

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    category::Category,
    database_id::{BudgetId, CategoryId, ContextId},
    validation::{month_number, non_negative_amount},
};

/// The amount a context plans to spend on a category in one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: BudgetId,
    pub context_id: ContextId,
    pub category_id: CategoryId,
    pub amount: f64,
    /// 1 for January through 12 for December.
    pub month: u8,
    pub year: i32,
}

/// A budget together with its category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetWithCategory {
    #[serde(flatten)]
    pub budget: Budget,
    pub category: Category,
}

/// The data needed to set a budget.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBudget {
    pub category_id: CategoryId,
    pub amount: f64,
    pub month: u8,
    pub year: i32,
}

/// A partial update of a budget, `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetUpdate {
    pub amount: Option<f64>,
    pub month: Option<u8>,
    pub year: Option<i32>,
}

const BUDGET_COLUMNS: &str = "id, context_id, category_id, amount, month, year";

pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            context_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            amount REAL NOT NULL,
            month INTEGER NOT NULL,
            year INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(context_id, category_id, month, year),
            FOREIGN KEY(context_id) REFERENCES context(id),
            FOREIGN KEY(category_id) REFERENCES category(id)
        );

        CREATE INDEX IF NOT EXISTS idx_budget_context ON budget(context_id);",
    )?;

    Ok(())
}

/// Set the budget for a category and month.
///
/// If the context already has a budget for the same category, month and year,
/// its amount is replaced instead of adding a second budget.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidMonth] if `month` is not 1 to 12,
/// - [Error::InvalidAmount] if the amount is negative or not finite,
/// - [Error::ForeignKeyViolation] if the context or category does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn set_budget(
    context_id: ContextId,
    new_budget: NewBudget,
    connection: &Connection,
) -> Result<Budget, Error> {
    let month = month_number(new_budget.month)?;
    let amount = non_negative_amount(new_budget.amount)?;

    connection
        .prepare(&format!(
            "INSERT INTO budget (context_id, category_id, amount, month, year)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(context_id, category_id, month, year)
             DO UPDATE SET amount = excluded.amount, updated_at = CURRENT_TIMESTAMP
             RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_row(
            (context_id, new_budget.category_id, amount, month, new_budget.year),
            map_budget_row,
        )
        .map_err(Error::from)
}

/// Get the budgets of a context with their categories, ordered by category name.
///
/// `month` and `year` narrow the result when given.
pub fn get_budgets(
    context_id: ContextId,
    month: Option<u8>,
    year: Option<i32>,
    connection: &Connection,
) -> Result<Vec<BudgetWithCategory>, Error> {
    connection
        .prepare(
            "SELECT b.id, b.context_id, b.category_id, b.amount, b.month, b.year,
                c.id, c.context_id, c.name, c.icon, c.type
             FROM budget b
             INNER JOIN category c ON c.id = b.category_id
             WHERE b.context_id = ?1
                AND (?2 IS NULL OR b.month = ?2)
                AND (?3 IS NULL OR b.year = ?3)
             ORDER BY c.name ASC, b.year ASC, b.month ASC",
        )?
        .query_map((context_id, month, year), |row| {
            Ok(BudgetWithCategory {
                budget: map_budget_row(row)?,
                category: Category {
                    id: row.get(6)?,
                    context_id: row.get(7)?,
                    name: row.get(8)?,
                    icon: row.get(9)?,
                    category_type: row.get(10)?,
                },
            })
        })?
        .map(|maybe_budget| maybe_budget.map_err(Error::from))
        .collect()
}

/// Retrieve a budget by ID, `None` if it does not exist.
pub fn get_budget(id: BudgetId, connection: &Connection) -> Result<Option<Budget>, Error> {
    connection
        .prepare(&format!("SELECT {BUDGET_COLUMNS} FROM budget WHERE id = :id"))?
        .query_row(&[(":id", &id)], map_budget_row)
        .optional()
        .map_err(Error::from)
}

/// Update the fields of a budget that are set in `update`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidMonth] or [Error::InvalidAmount] for invalid values,
/// - [Error::DuplicateBudget] if the change collides with another budget,
/// - [Error::UpdateMissingBudget] if the budget does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_budget(
    id: BudgetId,
    update: BudgetUpdate,
    connection: &Connection,
) -> Result<Budget, Error> {
    let month = update.month.map(month_number).transpose()?;
    let amount = update.amount.map(non_negative_amount).transpose()?;

    connection
        .prepare(&format!(
            "UPDATE budget
             SET amount = COALESCE(?1, amount),
                 month = COALESCE(?2, month),
                 year = COALESCE(?3, year),
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = ?4
             RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_row((amount, month, update.year, id), map_budget_row)
        .optional()?
        .ok_or(Error::UpdateMissingBudget)
}

/// Delete a budget by ID.
///
/// # Errors
/// Returns [Error::DeleteMissingBudget] if the budget does not exist.
pub fn delete_budget(id: BudgetId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM budget WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingBudget);
    }

    Ok(())
}

fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        context_id: row.get(1)?,
        category_id: row.get(2)?,
        amount: row.get(3)?,
        month: row.get(4)?,
        year: row.get(5)?,
    })
}

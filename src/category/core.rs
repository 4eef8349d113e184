//! Categories label transactions and budgets within a context.

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::{CategoryId, ContextId},
    sql_enum::text_enum,
    validation::non_empty,
};

text_enum! {
    /// The kind of money movement a category describes.
    pub enum CategoryType {
        Income => "INCOME",
        Expense => "EXPENSE",
        Investment => "INVESTMENT",
    }
}

/// A named, typed label for transactions, e.g. 'Alimentação' or 'Salário'.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub context_id: ContextId,
    pub name: String,
    /// A short glyph shown next to the name, usually an emoji.
    pub icon: Option<String>,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
}

/// The data needed to create a category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub context_id: ContextId,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
}

/// A partial update of a category, `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub icon: Option<String>,
    #[serde(rename = "type")]
    pub category_type: Option<CategoryType>,
}

/// The categories offered to every new context.
pub const DEFAULT_CATEGORIES: [(&str, CategoryType, &str); 14] = [
    ("Alimentação", CategoryType::Expense, "🛒"),
    ("Moradia", CategoryType::Expense, "🏠"),
    ("Transporte", CategoryType::Expense, "🚗"),
    ("Lazer", CategoryType::Expense, "🎉"),
    ("Saúde", CategoryType::Expense, "🏥"),
    ("Salário", CategoryType::Income, "💼"),
    ("Outros", CategoryType::Expense, "📦"),
    ("FIIs", CategoryType::Investment, "🏢"),
    ("Ações", CategoryType::Investment, "📈"),
    ("Criptomoedas", CategoryType::Investment, "₿"),
    ("Renda Fixa", CategoryType::Investment, "💰"),
    ("Tesouro Direto", CategoryType::Investment, "🏛️"),
    ("Stocks", CategoryType::Investment, "🇺🇸"),
    ("ETFs", CategoryType::Investment, "📊"),
];

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            context_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            icon TEXT,
            type TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY(context_id) REFERENCES context(id)
        );

        CREATE INDEX IF NOT EXISTS idx_category_context ON category(context_id);",
    )?;

    Ok(())
}

/// Create a category and return it with its generated ID.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyField] if the name is blank,
/// - [Error::ForeignKeyViolation] if the context does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_category(
    new_category: NewCategory,
    connection: &Connection,
) -> Result<Category, Error> {
    let name = non_empty(&new_category.name, "name")?;

    connection
        .prepare(
            "INSERT INTO category (context_id, name, icon, type) VALUES (?1, ?2, ?3, ?4)
             RETURNING id, context_id, name, icon, type",
        )?
        .query_row(
            (
                new_category.context_id,
                name,
                new_category.icon,
                new_category.category_type,
            ),
            map_row,
        )
        .map_err(Error::from)
}

/// Retrieve a single category by ID, `None` if it does not exist.
pub fn get_category(id: CategoryId, connection: &Connection) -> Result<Option<Category>, Error> {
    connection
        .prepare("SELECT id, context_id, name, icon, type FROM category WHERE id = :id")?
        .query_row(&[(":id", &id)], map_row)
        .optional()
        .map_err(Error::from)
}

/// Retrieve the categories of a context ordered alphabetically by name,
/// optionally only those of `category_type`.
pub fn get_categories(
    context_id: ContextId,
    category_type: Option<CategoryType>,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, context_id, name, icon, type FROM category
             WHERE context_id = ?1 AND (?2 IS NULL OR type = ?2)
             ORDER BY name ASC, id ASC",
        )?
        .query_map((context_id, category_type), map_row)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

/// Update the fields of a category that are set in `update`.
///
/// # Errors
/// Returns [Error::UpdateMissingCategory] if the category does not exist.
pub fn update_category(
    id: CategoryId,
    update: CategoryUpdate,
    connection: &Connection,
) -> Result<Category, Error> {
    let name = update
        .name
        .map(|name| non_empty(&name, "name"))
        .transpose()?;

    connection
        .prepare(
            "UPDATE category
             SET name = COALESCE(?1, name),
                 icon = COALESCE(?2, icon),
                 type = COALESCE(?3, type),
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = ?4
             RETURNING id, context_id, name, icon, type",
        )?
        .query_row((name, update.icon, update.category_type, id), map_row)
        .optional()?
        .ok_or(Error::UpdateMissingCategory)
}

/// Delete a category by ID.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingCategory] if the category does not exist,
/// - [Error::ForeignKeyViolation] if transactions, budgets or recurring expenses still use it,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_category(id: CategoryId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM category WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(())
}

/// Add each of [DEFAULT_CATEGORIES] that the context does not have yet.
///
/// A default is considered present when the context has a category with the
/// same name and type. All inserts happen in one SQL transaction.
/// Returns all of the context's categories afterwards.
pub fn seed_default_categories(
    context_id: ContextId,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    let transaction = connection.unchecked_transaction()?;
    let mut inserted = 0;

    {
        let mut exists = transaction.prepare(
            "SELECT EXISTS(SELECT 1 FROM category WHERE context_id = ?1 AND name = ?2 AND type = ?3)",
        )?;
        let mut insert = transaction
            .prepare("INSERT INTO category (context_id, name, icon, type) VALUES (?1, ?2, ?3, ?4)")?;

        for (name, category_type, icon) in DEFAULT_CATEGORIES {
            let is_present: bool =
                exists.query_row((context_id, name, category_type), |row| row.get(0))?;

            if !is_present {
                insert.execute((context_id, name, icon, category_type))?;
                inserted += 1;
            }
        }
    }

    transaction.commit()?;

    tracing::info!("seeded {inserted} default categories for context {context_id}");

    get_categories(context_id, None, connection)
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        context_id: row.get(1)?,
        name: row.get(2)?,
        icon: row.get(3)?,
        category_type: row.get(4)?,
    })
}

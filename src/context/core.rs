//! Defines the context model, the tenancy boundary that owns all other financial data.

use std::collections::BTreeSet;

use rusqlite::{Connection, OptionalExtension, Row, types::Type};
use serde::{Deserialize, Serialize};

use crate::{
    Error, UserID,
    context::membership::{Role, insert_membership},
    database_id::ContextId,
    sql_enum::text_enum,
    validation::non_empty,
};

text_enum! {
    /// Whether a context belongs to one person or is shared by a household.
    pub enum ContextType {
        /// Used by one person.
        Personal => "PERSONAL",
        /// Shared by several members, e.g. a couple.
        Shared => "SHARED",
    }
}

/// A group of users and the accounts, categories, transactions and budgets they share.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    pub id: ContextId,
    pub name: String,
    #[serde(rename = "type")]
    pub context_type: ContextType,
    /// Optional parts of the app enabled for this context, e.g. "INVESTMENTS".
    pub features: BTreeSet<String>,
}

/// The data needed to create a context.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContext {
    /// The display name, must not be blank.
    pub name: String,
    /// Defaults to PERSONAL.
    #[serde(rename = "type", default = "default_context_type")]
    pub context_type: ContextType,
    /// Feature flags to enable, stored upper-case.
    #[serde(default)]
    pub features: BTreeSet<String>,
}

fn default_context_type() -> ContextType {
    ContextType::Personal
}

/// A partial update of a context, `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextUpdate {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub context_type: Option<ContextType>,
    pub features: Option<BTreeSet<String>>,
}

pub fn create_context_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS context (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            type TEXT NOT NULL,
            features TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        (),
    )?;

    Ok(())
}

/// Create a context and make `creator` its first ADMIN member.
///
/// Both rows are written in one SQL transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyField] if the name is blank,
/// - [Error::ForeignKeyViolation] if `creator` is not a registered user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_context(
    new_context: NewContext,
    creator: UserID,
    connection: &Connection,
) -> Result<Context, Error> {
    let name = non_empty(&new_context.name, "name")?;
    let features = serde_json::to_string(&normalize_features(new_context.features))?;

    let transaction = connection.unchecked_transaction()?;

    let context = transaction
        .prepare(
            "INSERT INTO context (name, type, features) VALUES (?1, ?2, ?3)
             RETURNING id, name, type, features",
        )?
        .query_row((name, new_context.context_type, features), map_context_row)?;

    insert_membership(context.id, creator, Role::Admin, &transaction)?;

    transaction.commit()?;

    tracing::info!("created context {} for user {creator}", context.id);

    Ok(context)
}

/// Retrieve a context by ID, `None` if it does not exist.
pub fn get_context(id: ContextId, connection: &Connection) -> Result<Option<Context>, Error> {
    connection
        .prepare("SELECT id, name, type, features FROM context WHERE id = :id")?
        .query_row(&[(":id", &id)], map_context_row)
        .optional()
        .map_err(Error::from)
}

/// Retrieve the contexts that `user_id` is a member of, ordered by name.
pub fn get_contexts_for_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Context>, Error> {
    connection
        .prepare(
            "SELECT c.id, c.name, c.type, c.features
             FROM context c
             INNER JOIN membership m ON m.context_id = c.id
             WHERE m.user_id = :user_id
             ORDER BY c.name ASC, c.id ASC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_context_row)?
        .map(|maybe_context| maybe_context.map_err(Error::from))
        .collect()
}

/// Update the fields of a context that are set in `update`.
///
/// # Errors
/// Returns [Error::UpdateMissingContext] if the context does not exist.
pub fn update_context(
    id: ContextId,
    update: ContextUpdate,
    connection: &Connection,
) -> Result<Context, Error> {
    let name = update
        .name
        .map(|name| non_empty(&name, "name"))
        .transpose()?;
    let features = update
        .features
        .map(|features| serde_json::to_string(&normalize_features(features)))
        .transpose()?;

    connection
        .prepare(
            "UPDATE context
             SET name = COALESCE(?1, name),
                 type = COALESCE(?2, type),
                 features = COALESCE(?3, features),
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = ?4
             RETURNING id, name, type, features",
        )?
        .query_row((name, update.context_type, features, id), map_context_row)
        .optional()?
        .ok_or(Error::UpdateMissingContext)
}

/// Delete a context and everything it owns.
///
/// Transactions, recurring expenses, budgets, accounts, categories and
/// memberships are deleted before the context itself, all in one SQL
/// transaction. If any step fails nothing is deleted.
///
/// # Errors
/// Returns [Error::DeleteMissingContext] if the context does not exist.
pub fn delete_context(id: ContextId, connection: &Connection) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    for table in [
        "\"transaction\"",
        "recurring_expense",
        "budget",
        "account",
        "category",
        "membership",
    ] {
        let rows_deleted = transaction.execute(
            &format!("DELETE FROM {table} WHERE context_id = ?1"),
            [id],
        )?;
        tracing::debug!("deleted {rows_deleted} rows from {table} for context {id}");
    }

    let rows_affected = transaction.execute("DELETE FROM context WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingContext);
    }

    transaction.commit()?;

    tracing::info!("deleted context {id}");

    Ok(())
}

/// Feature flags are compared case-insensitively, so store them upper-case.
fn normalize_features(features: BTreeSet<String>) -> BTreeSet<String> {
    features
        .into_iter()
        .map(|feature| feature.trim().to_uppercase())
        .filter(|feature| !feature.is_empty())
        .collect()
}

fn map_context_row(row: &Row) -> Result<Context, rusqlite::Error> {
    let raw_features: String = row.get(3)?;
    let features = serde_json::from_str(&raw_features).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(error))
    })?;

    Ok(Context {
        id: row.get(0)?,
        name: row.get(1)?,
        context_type: row.get(2)?,
        features,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use time::macros::datetime;

    use crate::{
        Error, UserID,
        budget::{NewBudget, set_budget},
        category::CategoryType,
        context::{
            ContextType, ContextUpdate, NewContext, Role, add_member, create_context,
            delete_context, get_context, get_contexts_for_user, get_role, update_context,
        },
        recurring_expense::{NewRecurringExpense, RecurrenceType, create_recurring_expense},
        test_utils::{
            get_test_connection, insert_test_account, insert_test_category, insert_test_context,
            insert_test_user,
        },
        transaction::{Transaction, TransactionType, create_transaction},
    };

    fn new_context(name: &str) -> NewContext {
        NewContext {
            name: name.to_owned(),
            context_type: ContextType::Shared,
            features: BTreeSet::from(["investments".to_owned(), " ".to_owned()]),
        }
    }

    #[test]
    fn create_context_makes_creator_admin() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn, "ana@example.com");

        let context = create_context(new_context("Home"), user.id, &conn).unwrap();

        assert_eq!(context.name, "Home");
        assert_eq!(context.context_type, ContextType::Shared);
        assert_eq!(context.features, BTreeSet::from(["INVESTMENTS".to_owned()]));
        assert_eq!(get_role(context.id, user.id, &conn), Ok(Some(Role::Admin)));
    }

    #[test]
    fn create_context_rolls_back_when_creator_is_unknown() {
        let conn = get_test_connection();

        let result = create_context(new_context("Home"), UserID::new(999), &conn);

        assert_eq!(result, Err(Error::ForeignKeyViolation));
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM context", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0, "the context row should have been rolled back");
    }

    #[test]
    fn get_context_returns_none_for_missing_id() {
        let conn = get_test_connection();

        assert_eq!(get_context(42, &conn), Ok(None));
    }

    #[test]
    fn lists_only_contexts_the_user_belongs_to() {
        let conn = get_test_connection();
        let ana = insert_test_user(&conn, "ana@example.com");
        let bruno = insert_test_user(&conn, "bruno@example.com");
        let home = create_context(new_context("Home"), ana.id, &conn).unwrap();
        let _other = create_context(new_context("Work"), bruno.id, &conn).unwrap();

        let contexts = get_contexts_for_user(ana.id, &conn).unwrap();

        assert_eq!(contexts, vec![home]);
    }

    #[test]
    fn update_context_changes_only_given_fields() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn, "ana@example.com");
        let context = create_context(new_context("Home"), user.id, &conn).unwrap();

        let updated = update_context(
            context.id,
            ContextUpdate {
                name: Some("Casa".to_owned()),
                ..Default::default()
            },
            &conn,
        )
        .unwrap();

        assert_eq!(updated.name, "Casa");
        assert_eq!(updated.context_type, context.context_type);
        assert_eq!(updated.features, context.features);
    }

    #[test]
    fn update_missing_context_fails() {
        let conn = get_test_connection();

        let result = update_context(7, ContextUpdate::default(), &conn);

        assert_eq!(result, Err(Error::UpdateMissingContext));
    }

    #[test]
    fn delete_missing_context_fails() {
        let conn = get_test_connection();

        assert_eq!(delete_context(7, &conn), Err(Error::DeleteMissingContext));
    }

    #[test]
    fn delete_context_removes_everything_it_owns() {
        let conn = get_test_connection();
        let admin = insert_test_user(&conn, "ana@example.com");
        insert_test_user(&conn, "bruno@example.com");
        let context = insert_test_context(&conn, admin.id);
        let kept = insert_test_context(&conn, admin.id);
        add_member(context.id, "bruno@example.com", "VIEWER", admin.id, &conn).unwrap();
        let category = insert_test_category(&conn, context.id, "Mercado", CategoryType::Expense);
        let account = insert_test_account(&conn, context.id, "Conta", 0.0);
        create_transaction(
            Transaction::build(
                context.id,
                TransactionType::Expense,
                25.0,
                datetime!(2025-03-03 12:00 UTC),
                "Feira",
            )
            .source_account(Some(account.id))
            .category(Some(category.id))
            .paid(true),
            &conn,
        )
        .unwrap();
        set_budget(
            context.id,
            NewBudget {
                category_id: category.id,
                amount: 400.0,
                month: 3,
                year: 2025,
            },
            &conn,
        )
        .unwrap();
        create_recurring_expense(
            NewRecurringExpense {
                context_id: context.id,
                description: "Internet".to_owned(),
                amount: Some(99.9),
                recurrence_type: RecurrenceType::Fixed,
                day_of_month: 10,
                notification_days_before: None,
                active: true,
                category_id: Some(category.id),
                source_account_id: Some(account.id),
            },
            &conn,
        )
        .unwrap();

        delete_context(context.id, &conn).unwrap();

        for table in [
            "\"transaction\"",
            "recurring_expense",
            "budget",
            "account",
            "category",
            "membership",
        ] {
            let count: i64 = conn
                .query_row(
                    &format!("SELECT COUNT(*) FROM {table} WHERE context_id = ?1"),
                    [context.id],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 0, "{table} still has rows for the deleted context");
        }
        assert_eq!(get_context(context.id, &conn), Ok(None));
        assert_eq!(get_role(kept.id, admin.id, &conn), Ok(Some(Role::Admin)));
    }

    #[test]
    fn failed_delete_context_keeps_every_row() {
        let conn = get_test_connection();
        let admin = insert_test_user(&conn, "ana@example.com");
        insert_test_user(&conn, "bruno@example.com");
        let context = insert_test_context(&conn, admin.id);
        let other = insert_test_context(&conn, admin.id);
        add_member(context.id, "bruno@example.com", "VIEWER", admin.id, &conn).unwrap();
        let category = insert_test_category(&conn, context.id, "Mercado", CategoryType::Expense);
        let account = insert_test_account(&conn, context.id, "Conta", 0.0);
        create_transaction(
            Transaction::build(
                context.id,
                TransactionType::Expense,
                25.0,
                datetime!(2025-03-03 12:00 UTC),
                "Feira",
            )
            .source_account(Some(account.id))
            .category(Some(category.id))
            .paid(true),
            &conn,
        )
        .unwrap();
        set_budget(
            context.id,
            NewBudget {
                category_id: category.id,
                amount: 400.0,
                month: 3,
                year: 2025,
            },
            &conn,
        )
        .unwrap();
        create_recurring_expense(
            NewRecurringExpense {
                context_id: context.id,
                description: "Internet".to_owned(),
                amount: Some(99.9),
                recurrence_type: RecurrenceType::Fixed,
                day_of_month: 10,
                notification_days_before: None,
                active: true,
                category_id: Some(category.id),
                source_account_id: Some(account.id),
            },
            &conn,
        )
        .unwrap();
        // A transaction in another context that still points at this context's account.
        create_transaction(
            Transaction::build(
                other.id,
                TransactionType::Income,
                10.0,
                datetime!(2025-03-04 12:00 UTC),
                "Reembolso",
            )
            .destination_account(Some(account.id))
            .paid(true),
            &conn,
        )
        .unwrap();

        assert_eq!(delete_context(context.id, &conn), Err(Error::ForeignKeyViolation));

        for table in [
            "\"transaction\"",
            "recurring_expense",
            "budget",
            "account",
            "category",
        ] {
            let count: i64 = conn
                .query_row(
                    &format!("SELECT COUNT(*) FROM {table} WHERE context_id = ?1"),
                    [context.id],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "{table} lost rows after the failed delete");
        }
        let members: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM membership WHERE context_id = ?1",
                [context.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(members, 2);
        assert_eq!(get_context(context.id, &conn), Ok(Some(context)));
    }
}

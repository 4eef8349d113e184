//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Serialize, Serializer, ser::SerializeStruct};
use time::{OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339};

use crate::{
    Error,
    database_id::{AccountId, CategoryId, ContextId, TransactionId},
    sql_enum::text_enum,
    validation::{non_empty, positive_amount},
};

// ============================================================================
// MODELS
// ============================================================================

text_enum! {
    /// The direction of a money movement.
    ///
    /// EXPENSE leaves a source account, INCOME enters a destination account,
    /// TRANSFER and INVESTMENT move money from a source to a destination.
    pub enum TransactionType {
        Income => "INCOME",
        Expense => "EXPENSE",
        Transfer => "TRANSFER",
        Investment => "INVESTMENT",
    }
}

/// Whether a transaction has actually happened yet.
///
/// Only settled transactions affect account balances and monthly reports.
/// A settled transaction's date is always its payment date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Settlement {
    /// Expected to happen on the transaction's date, e.g. a bill that is not paid yet.
    Scheduled,
    /// Happened on `payment_date`.
    Settled {
        /// When the transaction was paid.
        payment_date: OffsetDateTime,
    },
}

impl Settlement {
    /// Whether the transaction has been settled.
    pub fn is_paid(&self) -> bool {
        matches!(self, Settlement::Settled { .. })
    }

    /// The payment date of a settled transaction.
    pub fn payment_date(&self) -> Option<OffsetDateTime> {
        match self {
            Settlement::Scheduled => None,
            Settlement::Settled { payment_date } => Some(*payment_date),
        }
    }
}

/// Written as the `isPaid` and `paymentDate` fields of the enclosing transaction.
impl Serialize for Settlement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let payment_date = self
            .payment_date()
            .map(|date| date.format(&Rfc3339))
            .transpose()
            .map_err(<S::Error as serde::ser::Error>::custom)?;

        let mut state = serializer.serialize_struct("Settlement", 2)?;
        state.serialize_field("isPaid", &self.is_paid())?;
        state.serialize_field("paymentDate", &payment_date)?;
        state.end()
    }
}

/// A movement of money within a context.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The context that owns the transaction.
    pub context_id: ContextId,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money moved, always greater than zero.
    pub amount: f64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The date the transaction affects balances: the expected date while
    /// scheduled, the payment date once settled.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// When payment is expected.
    #[serde(with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    #[serde(flatten)]
    pub settlement: Settlement,
    pub source_account_id: Option<AccountId>,
    pub destination_account_id: Option<AccountId>,
    pub category_id: Option<CategoryId>,
    /// The position of this transaction in its installment group, starting at 1.
    pub installment_number: Option<u32>,
    /// The number of transactions in the installment group.
    pub installments_total: Option<u32>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        context_id: ContextId,
        transaction_type: TransactionType,
        amount: f64,
        date: OffsetDateTime,
        description: &str,
    ) -> TransactionBuilder {
        TransactionBuilder {
            context_id,
            transaction_type,
            amount,
            date,
            description: description.to_owned(),
            due_date: None,
            is_paid: false,
            source_account_id: None,
            destination_account_id: None,
            category_id: None,
            installment: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// Pass the builder to [create_transaction] to insert a single transaction, or
/// to [crate::transaction::create_installments] to split it over several months.
///
/// # Examples
///
/// ```ignore
/// use time::macros::datetime;
///
/// use crate::transaction::{Transaction, TransactionType};
///
/// let builder = Transaction::build(
///         context_id,
///         TransactionType::Expense,
///         45.99,
///         datetime!(2025-01-15 12:00 UTC),
///         "Padaria",
///     )
///     .source_account(Some(account_id))
///     .paid(true);
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    pub context_id: ContextId,
    pub transaction_type: TransactionType,
    /// The amount of money moved, must be greater than zero.
    pub amount: f64,
    /// The expected date of the transaction, or the date it happened if it is paid.
    pub date: OffsetDateTime,
    pub description: String,
    pub due_date: Option<OffsetDateTime>,
    /// A paid transaction is created settled, with its date as the payment date.
    pub is_paid: bool,
    pub source_account_id: Option<AccountId>,
    pub destination_account_id: Option<AccountId>,
    pub category_id: Option<CategoryId>,
    /// The installment number and the installment count, set by the installment split.
    pub installment: Option<(u32, u32)>,
}

impl TransactionBuilder {
    pub fn due_date(mut self, due_date: Option<OffsetDateTime>) -> Self {
        self.due_date = due_date;
        self
    }

    pub fn paid(mut self, is_paid: bool) -> Self {
        self.is_paid = is_paid;
        self
    }

    pub fn source_account(mut self, account_id: Option<AccountId>) -> Self {
        self.source_account_id = account_id;
        self
    }

    pub fn destination_account(mut self, account_id: Option<AccountId>) -> Self {
        self.destination_account_id = account_id;
        self
    }

    pub fn category(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// The columns read by [map_transaction_row], in order.
pub(crate) const TRANSACTION_COLUMNS: &str = "id, context_id, description, amount, type, date, \
    due_date, is_paid, payment_date, source_account_id, destination_account_id, category_id, \
    installment_number, installments_total";

/// Create a new transaction in the database from a builder.
///
/// Timestamps are stored in UTC.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyField] if the description is blank,
/// - [Error::InvalidAmount] if the amount is not greater than zero,
/// - [Error::ForeignKeyViolation] if the context, an account or the category does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let description = non_empty(&builder.description, "description")?;
    let amount = positive_amount(builder.amount)?;
    let date = builder.date.to_offset(UtcOffset::UTC);
    let due_date = builder
        .due_date
        .map(|due_date| due_date.to_offset(UtcOffset::UTC));
    let payment_date = builder.is_paid.then_some(date);
    let (installment_number, installments_total) = builder.installment.unzip();

    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (context_id, description, amount, type, date, due_date,
                is_paid, payment_date, source_account_id, destination_account_id, category_id,
                installment_number, installments_total)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                builder.context_id,
                description,
                amount,
                builder.transaction_type,
                date,
                due_date,
                builder.is_paid,
                payment_date,
                builder.source_account_id,
                builder.destination_account_id,
                builder.category_id,
                installment_number,
                installments_total,
            ),
            map_transaction_row,
        )
        .map_err(Error::from)
}

/// Retrieve a transaction by its `id`, `None` if it does not exist.
pub fn get_transaction(
    id: TransactionId,
    connection: &Connection,
) -> Result<Option<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id"
        ))?
        .query_row(&[(":id", &id)], map_transaction_row)
        .optional()
        .map_err(Error::from)
}

/// Mark a transaction as paid on `payment_date`.
///
/// The transaction's date is overwritten with `payment_date`. Settling an
/// already settled transaction re-dates it again.
///
/// Returns `None` if the transaction does not exist.
pub fn settle_transaction(
    id: TransactionId,
    payment_date: OffsetDateTime,
    connection: &Connection,
) -> Result<Option<Transaction>, Error> {
    let payment_date = payment_date.to_offset(UtcOffset::UTC);

    let transaction = connection
        .prepare(&format!(
            "UPDATE \"transaction\"
             SET is_paid = 1, payment_date = ?1, date = ?1, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?2
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row((payment_date, id), map_transaction_row)
        .optional()?;

    if transaction.is_some() {
        tracing::info!("settled transaction {id} on {payment_date}");
    }

    Ok(transaction)
}

/// Initialize the transaction table and indexes.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    // Tables named "transaction" need double quotes since TRANSACTION is an SQL keyword.
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            context_id INTEGER NOT NULL,
            description TEXT NOT NULL,
            amount REAL NOT NULL,
            type TEXT NOT NULL,
            date TEXT NOT NULL,
            due_date TEXT,
            is_paid INTEGER NOT NULL DEFAULT 0,
            payment_date TEXT,
            source_account_id INTEGER,
            destination_account_id INTEGER,
            category_id INTEGER,
            installment_number INTEGER,
            installments_total INTEGER,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY(context_id) REFERENCES context(id),
            FOREIGN KEY(source_account_id) REFERENCES account(id),
            FOREIGN KEY(destination_account_id) REFERENCES account(id),
            FOREIGN KEY(category_id) REFERENCES category(id)
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_context_date ON \"transaction\"(context_id, date);
        CREATE INDEX IF NOT EXISTS idx_transaction_source ON \"transaction\"(source_account_id);
        CREATE INDEX IF NOT EXISTS idx_transaction_destination ON \"transaction\"(destination_account_id);",
    )?;

    Ok(())
}

/// Map a database row to a [Transaction]. Expects the columns in [TRANSACTION_COLUMNS] order.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let date: OffsetDateTime = row.get(5)?;
    let is_paid: bool = row.get(7)?;
    let payment_date: Option<OffsetDateTime> = row.get(8)?;

    let settlement = if is_paid {
        Settlement::Settled {
            payment_date: payment_date.unwrap_or(date),
        }
    } else {
        Settlement::Scheduled
    };

    Ok(Transaction {
        id: row.get(0)?,
        context_id: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        transaction_type: row.get(4)?,
        date,
        due_date: row.get(6)?,
        settlement,
        source_account_id: row.get(9)?,
        destination_account_id: row.get(10)?,
        category_id: row.get(11)?,
        installment_number: row.get(12)?,
        installments_total: row.get(13)?,
    })
}

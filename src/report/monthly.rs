use std::collections::HashMap;

use rusqlite::Connection;
use serde::Serialize;
use time::{Date, Month, OffsetDateTime, UtcOffset};
use time_tz::Tz;

use crate::{
    Error,
    category::CategoryType,
    database_id::{CategoryId, ContextId},
    timezone::assume_local,
    transaction::TransactionType,
    validation::month_number,
};

/// The name of the bucket for transactions without a category.
pub const UNCATEGORIZED_NAME: &str = "Sem Categoria";
/// The icon of the bucket for transactions without a category.
pub const UNCATEGORIZED_ICON: &str = "❓";

/// The month a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Period {
    pub month: u8,
    pub year: i32,
}

/// The total amount of a month's transactions in one category.
///
/// Transactions without a category are grouped by transaction type into
/// buckets with no `id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub id: Option<CategoryId>,
    pub name: String,
    pub icon: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
}

/// Income, expenses and the per category breakdown of settled transactions in a month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub period: Period,
    pub total_income: f64,
    pub total_expense: f64,
    /// `total_income - total_expense`
    pub balance: f64,
    /// Sorted by amount, largest first.
    pub by_category: Vec<CategoryTotal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum BucketKey {
    Category(CategoryId),
    Uncategorized(TransactionType),
}

struct ReportRow {
    amount: f64,
    transaction_type: TransactionType,
    category: Option<(CategoryId, String, Option<String>, CategoryType)>,
}

/// The first instant of `month` and the first instant of the following month,
/// at local midnight in `timezone`, converted to UTC.
///
/// Each bound uses the offset in effect at its own midnight, so a month that
/// starts or ends across a daylight saving change is still a local calendar month.
///
/// # Errors
/// Returns [Error::InvalidMonth] or [Error::InvalidDate] if the month does not exist.
pub fn month_bounds(
    month: u8,
    year: i32,
    timezone: &Tz,
) -> Result<(OffsetDateTime, OffsetDateTime), Error> {
    let month = Month::try_from(month_number(month)?)
        .map_err(|error| Error::InvalidDate(error.to_string()))?;
    let (next_year, next_month) = match month {
        Month::December => (year + 1, Month::January),
        month => (year, month.next()),
    };

    let first_instant = |year: i32, month: Month| -> Result<OffsetDateTime, Error> {
        Date::from_calendar_date(year, month, 1)
            .map(|date| assume_local(date.midnight(), timezone).to_offset(UtcOffset::UTC))
            .map_err(|error| Error::InvalidDate(error.to_string()))
    };

    Ok((first_instant(year, month)?, first_instant(next_year, next_month)?))
}

/// Summarize the settled transactions of a context dated within a month.
///
/// Scheduled transactions are left out, even when they are due in the month.
/// Only INCOME and EXPENSE transactions count towards the totals, but every
/// settled transaction is included in the category breakdown.
///
/// # Errors
/// Returns [Error::InvalidMonth] if `month` is not 1 to 12, or [Error::SqlError]
/// if the transactions could not be read.
pub fn get_monthly_report(
    context_id: ContextId,
    month: u8,
    year: i32,
    timezone: &Tz,
    connection: &Connection,
) -> Result<MonthlyReport, Error> {
    let (start, end) = month_bounds(month, year, timezone)?;

    let rows = connection
        .prepare(
            "SELECT t.amount, t.type, c.id, c.name, c.icon, c.type
             FROM \"transaction\" t
             LEFT JOIN category c ON c.id = t.category_id
             WHERE t.context_id = ?1 AND t.is_paid = 1 AND t.date >= ?2 AND t.date < ?3
             ORDER BY t.date ASC, t.id ASC",
        )?
        .query_map((context_id, start, end), |row| {
            let category = match row.get::<_, Option<CategoryId>>(2)? {
                Some(id) => Some((id, row.get(3)?, row.get(4)?, row.get(5)?)),
                None => None,
            };

            Ok(ReportRow {
                amount: row.get(0)?,
                transaction_type: row.get(1)?,
                category,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut total_income = 0.0;
    let mut total_expense = 0.0;
    let mut by_category: Vec<CategoryTotal> = Vec::new();
    let mut bucket_indices: HashMap<BucketKey, usize> = HashMap::new();

    for row in rows {
        match row.transaction_type {
            TransactionType::Income => total_income += row.amount,
            TransactionType::Expense => total_expense += row.amount,
            TransactionType::Transfer | TransactionType::Investment => {}
        }

        let key = match &row.category {
            Some((id, ..)) => BucketKey::Category(*id),
            None => BucketKey::Uncategorized(row.transaction_type),
        };

        let index = *bucket_indices.entry(key).or_insert_with(|| {
            by_category.push(new_bucket(&row));
            by_category.len() - 1
        });
        by_category[index].amount += row.amount;
    }

    // Stable, so ties keep the order the buckets were first seen in.
    by_category.sort_by(|a, b| b.amount.total_cmp(&a.amount));

    Ok(MonthlyReport {
        period: Period { month, year },
        total_income,
        total_expense,
        balance: total_income - total_expense,
        by_category,
    })
}

fn new_bucket(row: &ReportRow) -> CategoryTotal {
    match &row.category {
        Some((id, name, icon, category_type)) => CategoryTotal {
            id: Some(*id),
            name: name.clone(),
            icon: icon.clone().unwrap_or_default(),
            amount: 0.0,
            category_type: *category_type,
        },
        None => CategoryTotal {
            id: None,
            name: UNCATEGORIZED_NAME.to_owned(),
            icon: UNCATEGORIZED_ICON.to_owned(),
            amount: 0.0,
            category_type: match row.transaction_type {
                TransactionType::Income => CategoryType::Income,
                _ => CategoryType::Expense,
            },
        },
    }
}


#[cfg(test)]
mod report_tests {
    use rusqlite::Connection;
    use time::{OffsetDateTime, macros::datetime};
    use time_tz::Tz;

    use crate::{
        category::CategoryType,
        database_id::{AccountId, ContextId},
        test_utils::{
            get_test_connection, insert_test_account, insert_test_category, insert_test_context,
            insert_test_user,
        },
        timezone::get_timezone,
        transaction::{Transaction, TransactionBuilder, TransactionType, create_transaction},
    };

    use super::{UNCATEGORIZED_NAME, get_monthly_report};

    struct Fixture {
        connection: Connection,
        context_id: ContextId,
        account_id: AccountId,
    }

    fn utc() -> &'static Tz {
        get_timezone("Etc/UTC").unwrap()
    }

    fn fixture() -> Fixture {
        let connection = get_test_connection();
        let user = insert_test_user(&connection, "ana@example.com");
        let context = insert_test_context(&connection, user.id);
        let account = insert_test_account(&connection, context.id, "Corrente", 0.0);

        Fixture {
            connection,
            context_id: context.id,
            account_id: account.id,
        }
    }

    impl Fixture {
        fn build(
            &self,
            transaction_type: TransactionType,
            amount: f64,
            date: OffsetDateTime,
        ) -> TransactionBuilder {
            let builder =
                Transaction::build(self.context_id, transaction_type, amount, date, "Teste");

            match transaction_type {
                TransactionType::Income => builder.destination_account(Some(self.account_id)),
                _ => builder.source_account(Some(self.account_id)),
            }
        }

        fn insert(&self, builder: TransactionBuilder) {
            create_transaction(builder, &self.connection).unwrap();
        }
    }

    #[test]
    fn empty_month_has_zero_totals() {
        let fixture = fixture();

        let report =
            get_monthly_report(fixture.context_id, 5, 2025, utc(), &fixture.connection)
                .unwrap();

        assert_eq!(report.total_income, 0.0);
        assert_eq!(report.total_expense, 0.0);
        assert_eq!(report.balance, 0.0);
        assert!(report.by_category.is_empty());
    }

    #[test]
    fn unsettled_transactions_are_excluded() {
        let fixture = fixture();
        fixture.insert(
            fixture
                .build(TransactionType::Expense, 500.0, datetime!(2025-05-10 12:00 UTC))
                .due_date(Some(datetime!(2025-05-15 00:00 UTC))),
        );

        let report =
            get_monthly_report(fixture.context_id, 5, 2025, utc(), &fixture.connection)
                .unwrap();

        assert_eq!(report.total_expense, 0.0);
        assert!(report.by_category.is_empty());
    }

    #[test]
    fn only_transactions_within_the_month_count() {
        let fixture = fixture();
        for date in [
            datetime!(2025-04-30 23:59:59 UTC),
            datetime!(2025-05-01 00:00 UTC),
            datetime!(2025-05-31 23:59:59 UTC),
            datetime!(2025-06-01 00:00 UTC),
        ] {
            fixture.insert(fixture.build(TransactionType::Income, 10.0, date).paid(true));
        }

        let report =
            get_monthly_report(fixture.context_id, 5, 2025, utc(), &fixture.connection)
                .unwrap();

        assert_eq!(report.total_income, 20.0);
    }

    #[test]
    fn same_category_is_one_bucket_and_uncategorized_split_by_type() {
        let fixture = fixture();
        let market = insert_test_category(
            &fixture.connection,
            fixture.context_id,
            "Mercado",
            CategoryType::Expense,
        );
        let date = datetime!(2025-05-10 12:00 UTC);
        for amount in [30.0, 70.0] {
            fixture.insert(
                fixture
                    .build(TransactionType::Expense, amount, date)
                    .category(Some(market.id))
                    .paid(true),
            );
        }
        fixture.insert(fixture.build(TransactionType::Expense, 40.0, date).paid(true));
        fixture.insert(fixture.build(TransactionType::Income, 1000.0, date).paid(true));

        let report =
            get_monthly_report(fixture.context_id, 5, 2025, utc(), &fixture.connection)
                .unwrap();

        assert_eq!(report.total_income, 1000.0);
        assert_eq!(report.total_expense, 140.0);
        assert_eq!(report.balance, 860.0);
        assert_eq!(
            report
                .by_category
                .iter()
                .map(|bucket| (bucket.id, bucket.name.as_str(), bucket.amount, bucket.category_type))
                .collect::<Vec<_>>(),
            [
                (None, UNCATEGORIZED_NAME, 1000.0, CategoryType::Income),
                (Some(market.id), "Mercado", 100.0, CategoryType::Expense),
                (None, UNCATEGORIZED_NAME, 40.0, CategoryType::Expense),
            ]
        );
        assert_eq!(report.by_category[1].icon, "🏷️");
    }

    #[test]
    fn transfers_are_bucketed_but_not_totalled() {
        let fixture = fixture();
        let date = datetime!(2025-05-10 12:00 UTC);
        fixture.insert(fixture.build(TransactionType::Transfer, 250.0, date).paid(true));

        let report =
            get_monthly_report(fixture.context_id, 5, 2025, utc(), &fixture.connection)
                .unwrap();

        assert_eq!(report.total_income, 0.0);
        assert_eq!(report.total_expense, 0.0);
        assert_eq!(report.by_category.len(), 1);
        assert_eq!(report.by_category[0].category_type, CategoryType::Expense);
    }

    #[test]
    fn month_bounds_follow_local_timezone() {
        let fixture = fixture();
        // 1 June 01:00 UTC is still 31 May in São Paulo (UTC-3).
        fixture.insert(
            fixture
                .build(TransactionType::Income, 10.0, datetime!(2025-06-01 01:00 UTC))
                .paid(true),
        );
        let sao_paulo = get_timezone("America/Sao_Paulo").unwrap();

        let may = get_monthly_report(fixture.context_id, 5, 2025, sao_paulo, &fixture.connection)
            .unwrap();
        let june = get_monthly_report(fixture.context_id, 6, 2025, sao_paulo, &fixture.connection)
            .unwrap();

        assert_eq!(may.total_income, 10.0);
        assert_eq!(june.total_income, 0.0);
    }

    #[test]
    fn last_local_hour_counts_in_summer_and_winter_months() {
        let fixture = fixture();
        // Auckland is UTC+13 in January and UTC+12 in June.
        for date in [
            datetime!(2025-01-31 23:30 +13),
            datetime!(2025-06-30 23:30 +12),
        ] {
            fixture.insert(fixture.build(TransactionType::Income, 10.0, date).paid(true));
        }
        let auckland = get_timezone("Pacific/Auckland").unwrap();

        let totals = [(1, 2025), (2, 2025), (6, 2025), (7, 2025)].map(|(month, year)| {
            get_monthly_report(fixture.context_id, month, year, auckland, &fixture.connection)
                .unwrap()
                .total_income
        });

        assert_eq!(totals, [10.0, 0.0, 10.0, 0.0]);
    }
}

//! Splitting a purchase into monthly installments.

use rusqlite::Connection;
use serde::Serialize;
use time::{Date, Month, OffsetDateTime};

use crate::{
    Error,
    transaction::{Transaction, TransactionBuilder, create_transaction},
    validation::non_empty,
};

/// The result of creating a transaction, a single row or a whole installment group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CreatedTransactions {
    Single(Transaction),
    Installments(Vec<Transaction>),
}

/// Advance `date_time` by a number of calendar months, keeping the time of day.
///
/// The day of the month is clamped to the length of the target month, e.g.
/// 31 January plus one month is 28 February (29 in leap years).
///
/// # Errors
/// Returns [Error::InvalidDate] if the resulting year is out of range.
pub fn add_months(date_time: OffsetDateTime, months: u32) -> Result<OffsetDateTime, Error> {
    let date = date_time.date();
    let month_index = i64::from(u8::from(date.month()) - 1) + i64::from(months);
    let year = i64::from(date.year()) + month_index.div_euclid(12);
    let year = i32::try_from(year).map_err(|error| Error::InvalidDate(error.to_string()))?;
    // rem_euclid(12) is in 0..12, so the month number is in 1..=12.
    let month = Month::try_from(month_index.rem_euclid(12) as u8 + 1)
        .map_err(|error| Error::InvalidDate(error.to_string()))?;
    let day = date.day().min(time::util::days_in_month(month, year));

    let date = Date::from_calendar_date(year, month, day)
        .map_err(|error| Error::InvalidDate(error.to_string()))?;

    Ok(date_time.replace_date(date))
}

/// Split `builder` into `count` monthly installments.
///
/// Each installment gets `amount / count`, the description suffix " (k/count)",
/// and the date (and due date, if any) advanced by k - 1 months. Only the
/// first installment keeps the paid flag. With `count` of one or less the
/// builder is returned unchanged.
///
/// # Errors
/// Returns [Error::EmptyField] if the description is blank, or
/// [Error::InvalidDate] if an installment date is out of range.
pub fn split_into_installments(
    builder: TransactionBuilder,
    count: u32,
) -> Result<Vec<TransactionBuilder>, Error> {
    if count <= 1 {
        return Ok(vec![builder]);
    }

    let description = non_empty(&builder.description, "description")?;
    let amount = builder.amount / f64::from(count);

    (0..count)
        .map(|offset| -> Result<TransactionBuilder, Error> {
            let number = offset + 1;
            let due_date = builder
                .due_date
                .map(|due_date| add_months(due_date, offset))
                .transpose()?;

            Ok(TransactionBuilder {
                amount,
                description: format!("{description} ({number}/{count})"),
                date: add_months(builder.date, offset)?,
                due_date,
                is_paid: offset == 0 && builder.is_paid,
                installment: Some((number, count)),
                ..builder.clone()
            })
        })
        .collect()
}

/// Create one transaction, or `installments` transactions if more than one is requested.
///
/// Installment groups are inserted in one SQL transaction, so either every
/// installment is stored or none are.
///
/// # Errors
/// Returns the first error from [create_transaction] or [split_into_installments].
pub fn create_installments(
    builder: TransactionBuilder,
    installments: Option<u32>,
    connection: &Connection,
) -> Result<CreatedTransactions, Error> {
    let count = installments.unwrap_or(1);

    if count <= 1 {
        return create_transaction(builder, connection).map(CreatedTransactions::Single);
    }

    let builders = split_into_installments(builder, count)?;
    let sql_transaction = connection.unchecked_transaction()?;

    let transactions = builders
        .into_iter()
        .map(|builder| create_transaction(builder, &sql_transaction))
        .collect::<Result<Vec<_>, _>>()?;

    sql_transaction.commit()?;

    tracing::info!("created {count} installments in context {}", transactions[0].context_id);

    Ok(CreatedTransactions::Installments(transactions))
}

#[cfg(test)]
mod add_months_tests {
    use time::macros::datetime;

    use super::add_months;

    #[test]
    fn keeps_day_when_target_month_has_it() {
        assert_eq!(
            add_months(datetime!(2025-01-15 10:30 -3), 1),
            Ok(datetime!(2025-02-15 10:30 -3))
        );
    }

    #[test]
    fn clamps_to_end_of_short_month() {
        assert_eq!(
            add_months(datetime!(2025-01-31 00:00 UTC), 1),
            Ok(datetime!(2025-02-28 00:00 UTC))
        );
        assert_eq!(
            add_months(datetime!(2024-01-31 00:00 UTC), 1),
            Ok(datetime!(2024-02-29 00:00 UTC))
        );
        assert_eq!(
            add_months(datetime!(2025-03-31 00:00 UTC), 1),
            Ok(datetime!(2025-04-30 00:00 UTC))
        );
    }

    #[test]
    fn rolls_over_years() {
        assert_eq!(
            add_months(datetime!(2025-11-05 00:00 UTC), 3),
            Ok(datetime!(2026-02-05 00:00 UTC))
        );
        assert_eq!(
            add_months(datetime!(2025-12-31 00:00 UTC), 14),
            Ok(datetime!(2027-02-28 00:00 UTC))
        );
    }

    #[test]
    fn zero_months_is_identity() {
        let date = datetime!(2025-06-30 23:59 UTC);

        assert_eq!(add_months(date, 0), Ok(date));
    }
}

//! Field validation shared by the stores.

use crate::Error;

/// Trim `value` and reject it if nothing is left.
pub fn non_empty(value: &str, field: &'static str) -> Result<String, Error> {
    let value = value.trim();

    if value.is_empty() {
        Err(Error::EmptyField(field))
    } else {
        Ok(value.to_owned())
    }
}

/// Money amounts for transactions and recurring expenses must be finite and strictly positive.
pub fn positive_amount(amount: f64) -> Result<f64, Error> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(Error::InvalidAmount(amount))
    }
}

/// Budget targets may be zero, but not negative.
pub fn non_negative_amount(amount: f64) -> Result<f64, Error> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(amount)
    } else {
        Err(Error::InvalidAmount(amount))
    }
}

/// Months are numbered 1 through 12.
pub fn month_number(month: u8) -> Result<u8, Error> {
    if (1..=12).contains(&month) {
        Ok(month)
    } else {
        Err(Error::InvalidMonth(month))
    }
}

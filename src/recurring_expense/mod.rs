//! Recurring expense templates, e.g. rent due on the 5th of every month.
//!
//! Templates are a catalog only, nothing turns them into transactions.

mod core;
mod endpoints;

pub use core::{
    NewRecurringExpense, RecurrenceType, RecurringExpense, create_recurring_expense,
    create_recurring_expense_table, get_recurring_expenses,
};
pub use endpoints::{create_recurring_expense_endpoint, get_recurring_expenses_endpoint};

//! Budgets: monthly spending targets per category.

mod core;
mod endpoints;

pub use core::{
    Budget, BudgetUpdate, BudgetWithCategory, NewBudget, create_budget_table, delete_budget,
    get_budget, get_budgets, set_budget, update_budget,
};
pub use endpoints::{
    delete_budget_endpoint, get_budget_endpoint, get_budgets_endpoint, set_budget_endpoint,
    update_budget_endpoint,
};

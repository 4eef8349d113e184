//! The REST API endpoint URIs.
//!
//! Parameters use axum's brace syntax, e.g. '/api/accounts/{account_id}'.

#[cfg(test)]
use std::fmt::Display;

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for registering users.
pub const USERS: &str = "/api/users";
/// The route for looking up a user by email.
pub const USER: &str = "/api/users/{email}";

/// The route for creating contexts and listing the requester's contexts.
pub const CONTEXTS: &str = "/api/contexts";
/// The route to access a single context.
pub const CONTEXT: &str = "/api/contexts/{context_id}";
/// The route for listing and adding the members of a context.
pub const CONTEXT_MEMBERS: &str = "/api/contexts/{context_id}/members";
/// The route for removing a member from a context.
pub const CONTEXT_MEMBER: &str = "/api/contexts/{context_id}/members/{user_id}";

/// The route for creating categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to access a single category.
pub const CATEGORY: &str = "/api/categories/{category_id}";
/// The route for listing the categories of a context.
pub const CONTEXT_CATEGORIES: &str = "/api/contexts/{context_id}/categories";
/// The route for adding the default categories to a context.
pub const DEFAULT_CATEGORIES: &str = "/api/contexts/{context_id}/categories/defaults";

/// The route for creating accounts.
pub const ACCOUNTS: &str = "/api/accounts";
/// The route to access a single account.
pub const ACCOUNT: &str = "/api/accounts/{account_id}";
/// The route for listing the accounts of a context with their balances.
pub const CONTEXT_ACCOUNTS: &str = "/api/contexts/{context_id}/accounts";

/// The route for creating transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route for settling a transaction.
pub const PAY_TRANSACTION: &str = "/api/transactions/{transaction_id}/pay";
/// The route for listing the transactions of a context.
pub const CONTEXT_TRANSACTIONS: &str = "/api/contexts/{context_id}/transactions";
/// The route for listing the transactions to or from an account.
pub const ACCOUNT_TRANSACTIONS: &str = "/api/accounts/{account_id}/transactions";

/// The route for setting and listing the budgets of a context.
pub const CONTEXT_BUDGETS: &str = "/api/contexts/{context_id}/budgets";
/// The route to access a single budget.
pub const BUDGET: &str = "/api/budgets/{budget_id}";

/// The route for creating recurring expenses.
pub const RECURRING_EXPENSES: &str = "/api/recurring_expenses";
/// The route for listing the recurring expenses of a context.
pub const CONTEXT_RECURRING_EXPENSES: &str = "/api/contexts/{context_id}/recurring_expenses";

/// The route for the monthly report of a context.
pub const MONTHLY_REPORT: &str = "/api/contexts/{context_id}/reports/monthly";

/// Replace the first parameter in `endpoint_path` with `value`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters.
/// For paths with two parameters, call it twice.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, value: impl Display) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        value,
        &endpoint_path[param_end..]
    )
}

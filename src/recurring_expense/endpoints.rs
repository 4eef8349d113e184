use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    database_id::ContextId,
    recurring_expense::{
        NewRecurringExpense, RecurringExpense, create_recurring_expense, get_recurring_expenses,
    },
};

/// The state needed to manage recurring expenses.
#[derive(Debug, Clone)]
pub struct RecurringExpenseState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RecurringExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub async fn create_recurring_expense_endpoint(
    State(state): State<RecurringExpenseState>,
    Json(new_expense): Json<NewRecurringExpense>,
) -> Result<(StatusCode, Json<RecurringExpense>), Error> {
    let connection = lock_connection(&state.db_connection)?;
    let expense = create_recurring_expense(new_expense, &connection)?;

    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn get_recurring_expenses_endpoint(
    State(state): State<RecurringExpenseState>,
    Path(context_id): Path<ContextId>,
) -> Result<Json<Vec<RecurringExpense>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_recurring_expenses(context_id, &connection).map(Json)
}

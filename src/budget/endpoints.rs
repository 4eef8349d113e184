//! The HTTP handlers for budgets.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    budget::{
        Budget, BudgetUpdate, BudgetWithCategory, NewBudget, delete_budget, get_budget,
        get_budgets, set_budget, update_budget,
    },
    database_id::{BudgetId, ContextId},
};

/// The state needed to manage budgets.
#[derive(Debug, Clone)]
pub struct BudgetState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Optional month and year filters for listing budgets.
#[derive(Debug, Default, Deserialize)]
pub struct BudgetQuery {
    pub month: Option<u8>,
    pub year: Option<i32>,
}

pub async fn get_budgets_endpoint(
    State(state): State<BudgetState>,
    Path(context_id): Path<ContextId>,
    Query(query): Query<BudgetQuery>,
) -> Result<Json<Vec<BudgetWithCategory>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_budgets(context_id, query.month, query.year, &connection).map(Json)
}

/// A route handler for setting a budget, replacing the amount of an existing
/// budget for the same category and month.
pub async fn set_budget_endpoint(
    State(state): State<BudgetState>,
    Path(context_id): Path<ContextId>,
    Json(new_budget): Json<NewBudget>,
) -> Result<(StatusCode, Json<Budget>), Error> {
    let connection = lock_connection(&state.db_connection)?;
    let budget = set_budget(context_id, new_budget, &connection)?;

    Ok((StatusCode::CREATED, Json(budget)))
}

pub async fn get_budget_endpoint(
    State(state): State<BudgetState>,
    Path(budget_id): Path<BudgetId>,
) -> Result<Json<Budget>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_budget(budget_id, &connection)?
        .map(Json)
        .ok_or(Error::NotFound)
}

pub async fn update_budget_endpoint(
    State(state): State<BudgetState>,
    Path(budget_id): Path<BudgetId>,
    Json(update): Json<BudgetUpdate>,
) -> Result<Json<Budget>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    update_budget(budget_id, update, &connection).map(Json)
}

pub async fn delete_budget_endpoint(
    State(state): State<BudgetState>,
    Path(budget_id): Path<BudgetId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_budget(budget_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

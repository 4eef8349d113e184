//! The HTTP handlers for categories.

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
    category::{
        Category, CategoryType, CategoryUpdate, NewCategory, create_category, delete_category,
        get_categories, get_category, seed_default_categories, update_category,
    },
    database_id::{CategoryId, ContextId},
};

/// The state needed to manage categories.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The optional filter for listing categories.
#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    #[serde(rename = "type")]
    pub category_type: Option<CategoryType>,
}

pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Json(new_category): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>), Error> {
    let connection = lock_connection(&state.db_connection)?;
    let category = create_category(new_category, &connection)?;

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn get_category_endpoint(
    State(state): State<CategoryState>,
    Path(category_id): Path<CategoryId>,
) -> Result<Json<Category>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_category(category_id, &connection)?
        .map(Json)
        .ok_or(Error::NotFound)
}

/// A route handler for listing a context's categories, optionally filtered with `?type=`.
pub async fn get_categories_endpoint(
    State(state): State<CategoryState>,
    Path(context_id): Path<ContextId>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_categories(context_id, query.category_type, &connection).map(Json)
}

pub async fn update_category_endpoint(
    State(state): State<CategoryState>,
    Path(category_id): Path<CategoryId>,
    Json(update): Json<CategoryUpdate>,
) -> Result<Json<Category>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    update_category(category_id, update, &connection).map(Json)
}

/// A route handler for deleting a category.
///
/// Categories still used by transactions or budgets cannot be deleted and
/// result in a 409 Conflict.
pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    Path(category_id): Path<CategoryId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_category(category_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

/// A route handler for adding the default categories to a context.
pub async fn seed_default_categories_endpoint(
    State(state): State<CategoryState>,
    Path(context_id): Path<ContextId>,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    seed_default_categories(context_id, &connection).map(Json)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        category::core::DEFAULT_CATEGORIES,
        endpoints::{self, format_endpoint},
        test_utils::{get_test_server, insert_test_context, insert_test_user},
    };

    fn create_context(state: &crate::AppState) -> i64 {
        let connection = state.db_connection.lock().unwrap();
        let user = insert_test_user(&connection, "ana@example.com");
        insert_test_context(&connection, user.id).id
    }

    #[tokio::test]
    async fn create_and_list_categories_by_type() {
        let (server, state) = get_test_server();
        let context_id = create_context(&state);

        for (name, category_type) in [("Salário", "INCOME"), ("Lazer", "EXPENSE")] {
            server
                .post(endpoints::CATEGORIES)
                .json(&json!({
                    "contextId": context_id,
                    "name": name,
                    "icon": "⭐",
                    "type": category_type,
                }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = server
            .get(&format_endpoint(endpoints::CONTEXT_CATEGORIES, context_id))
            .add_query_param("type", "INCOME")
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["name"], "Salário");
        assert_eq!(body[0]["type"], "INCOME");
    }

    #[tokio::test]
    async fn seed_defaults_returns_catalog() {
        let (server, state) = get_test_server();
        let context_id = create_context(&state);

        let response = server
            .post(&format_endpoint(endpoints::DEFAULT_CATEGORIES, context_id))
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>().as_array().map(Vec::len),
            Some(DEFAULT_CATEGORIES.len())
        );
    }

    #[tokio::test]
    async fn get_missing_category_is_not_found() {
        let (server, _) = get_test_server();

        server
            .get(&format_endpoint(endpoints::CATEGORY, 12))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_category_rejects_unknown_type() {
        let (server, state) = get_test_server();
        let context_id = create_context(&state);

        let response = server
            .post(endpoints::CATEGORIES)
            .json(&json!({"contextId": context_id, "name": "Pets", "type": "HOBBY"}))
            .await;

        assert!(response.status_code().is_client_error());
    }
}

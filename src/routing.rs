//! Application router configuration.

use axum::{
    Router,
    extract::{MatchedPath, Request},
    http::{HeaderName, HeaderValue, Method, StatusCode, header::CONTENT_TYPE},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    AppState,
    account::{
        create_account_endpoint, delete_account_endpoint, edit_account_endpoint,
        get_account_endpoint, get_accounts_endpoint,
    },
    budget::{
        delete_budget_endpoint, get_budget_endpoint, get_budgets_endpoint, set_budget_endpoint,
        update_budget_endpoint,
    },
    category::{
        create_category_endpoint, delete_category_endpoint, get_categories_endpoint,
        get_category_endpoint, seed_default_categories_endpoint, update_category_endpoint,
    },
    context::{
        add_member_endpoint, create_context_endpoint, delete_context_endpoint,
        get_context_endpoint, get_contexts_endpoint, get_members_endpoint,
        remove_member_endpoint, update_context_endpoint,
    },
    endpoints,
    log_in::post_log_in,
    logging::logging_middleware,
    recurring_expense::{create_recurring_expense_endpoint, get_recurring_expenses_endpoint},
    register_user::register_user,
    report::get_monthly_report_endpoint,
    requester::USER_ID_HEADER,
    transaction::{
        create_transaction_endpoint, get_account_transactions_endpoint,
        get_context_transactions_endpoint, get_transaction_endpoint, pay_transaction_endpoint,
    },
    user_profile::get_user_endpoint,
};

/// Return a router with all the app's routes.
///
/// `allowed_origin` restricts cross-origin requests to a single origin, e.g.
/// the web frontend. When it is `None` any origin is allowed.
pub fn build_router(state: AppState, allowed_origin: Option<String>) -> Router {
    let user_routes = Router::new()
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::USERS, post(register_user))
        .route(endpoints::USER, get(get_user_endpoint));

    let context_routes = Router::new()
        .route(
            endpoints::CONTEXTS,
            get(get_contexts_endpoint).post(create_context_endpoint),
        )
        .route(
            endpoints::CONTEXT,
            get(get_context_endpoint)
                .patch(update_context_endpoint)
                .delete(delete_context_endpoint),
        )
        .route(
            endpoints::CONTEXT_MEMBERS,
            get(get_members_endpoint).post(add_member_endpoint),
        )
        .route(
            endpoints::CONTEXT_MEMBER,
            delete(remove_member_endpoint),
        );

    let category_routes = Router::new()
        .route(endpoints::CATEGORIES, post(create_category_endpoint))
        .route(
            endpoints::CATEGORY,
            get(get_category_endpoint)
                .patch(update_category_endpoint)
                .delete(delete_category_endpoint),
        )
        .route(endpoints::CONTEXT_CATEGORIES, get(get_categories_endpoint))
        .route(
            endpoints::DEFAULT_CATEGORIES,
            post(seed_default_categories_endpoint),
        );

    let account_routes = Router::new()
        .route(endpoints::ACCOUNTS, post(create_account_endpoint))
        .route(
            endpoints::ACCOUNT,
            get(get_account_endpoint)
                .patch(edit_account_endpoint)
                .delete(delete_account_endpoint),
        )
        .route(endpoints::CONTEXT_ACCOUNTS, get(get_accounts_endpoint));

    let transaction_routes = Router::new()
        .route(endpoints::TRANSACTIONS, post(create_transaction_endpoint))
        .route(endpoints::TRANSACTION, get(get_transaction_endpoint))
        .route(endpoints::PAY_TRANSACTION, patch(pay_transaction_endpoint))
        .route(
            endpoints::CONTEXT_TRANSACTIONS,
            get(get_context_transactions_endpoint),
        )
        .route(
            endpoints::ACCOUNT_TRANSACTIONS,
            get(get_account_transactions_endpoint),
        );

    let planning_routes = Router::new()
        .route(
            endpoints::CONTEXT_BUDGETS,
            get(get_budgets_endpoint).post(set_budget_endpoint),
        )
        .route(
            endpoints::BUDGET,
            get(get_budget_endpoint)
                .patch(update_budget_endpoint)
                .delete(delete_budget_endpoint),
        )
        .route(
            endpoints::RECURRING_EXPENSES,
            post(create_recurring_expense_endpoint),
        )
        .route(
            endpoints::CONTEXT_RECURRING_EXPENSES,
            get(get_recurring_expenses_endpoint),
        )
        .route(endpoints::MONTHLY_REPORT, get(get_monthly_report_endpoint));

    let router = Router::new()
        .merge(user_routes)
        .merge(context_routes)
        .merge(category_routes)
        .merge(account_routes)
        .merge(transaction_routes)
        .merge(planning_routes)
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .layer(cors_layer(allowed_origin));

    add_tracing_layer(router.with_state(state))
}

/// The JSON response for routes that do not exist.
async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        axum::Json(json!({
            "error": "the requested resource could not be found",
            "status": StatusCode::NOT_FOUND.as_u16(),
        })),
    )
        .into_response()
}

fn cors_layer(allowed_origin: Option<String>) -> CorsLayer {
    let origin = match allowed_origin.map(|origin| HeaderValue::from_str(&origin)) {
        Some(Ok(origin)) => AllowOrigin::exact(origin),
        Some(Err(error)) => {
            tracing::warn!("ignoring invalid allowed origin: {error}");
            AllowOrigin::from(Any)
        }
        None => AllowOrigin::from(Any),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(USER_ID_HEADER)])
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request| {
            let method = request.method();
            let uri = request.uri();

            let matched_path = request
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but errors are
        // logged where they are converted to responses.
        .on_failure(());

    router.layer(tracing_layer)
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use serde_json::Value;

    use crate::test_utils::get_test_server;

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let (server, _) = get_test_server();

        let response = server.get("/api/nope").await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["status"], 404);
    }

    #[tokio::test]
    async fn allows_cross_origin_requests() {
        let (server, _) = get_test_server();

        let response = server
            .get("/api/contexts")
            .add_header(
                HeaderName::from_static("origin"),
                HeaderValue::from_static("http://localhost:5173"),
            )
            .await;

        assert_eq!(
            response.header("access-control-allow-origin"),
            HeaderValue::from_static("*")
        );
    }
}

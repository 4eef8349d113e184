use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::OffsetDateTime;
use time_tz::OffsetDateTimeExt;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    database_id::ContextId,
    report::{MonthlyReport, get_monthly_report},
    timezone::timezone_or_error,
};

/// The state needed to build reports.
#[derive(Debug, Clone)]
pub struct ReportState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The canonical name of the timezone months are measured in.
    pub local_timezone: String,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The month to report on, defaults to the current month.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub month: Option<u8>,
    pub year: Option<i32>,
}

/// A route handler for the income and expense summary of a context for one month.
pub async fn get_monthly_report_endpoint(
    State(state): State<ReportState>,
    Path(context_id): Path<ContextId>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<MonthlyReport>, Error> {
    let timezone = timezone_or_error(&state.local_timezone)?;
    let today = OffsetDateTime::now_utc().to_timezone(timezone).date();
    let month = query.month.unwrap_or_else(|| u8::from(today.month()));
    let year = query.year.unwrap_or_else(|| today.year());

    let connection = lock_connection(&state.db_connection)?;

    get_monthly_report(context_id, month, year, timezone, &connection).map(Json)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use time::{OffsetDateTime, macros::datetime};

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{get_test_server, insert_test_account, insert_test_context, insert_test_user},
        transaction::{Transaction, TransactionType, create_transaction},
    };

    #[tokio::test]
    async fn report_for_given_month() {
        let (server, state) = get_test_server();
        let context_id = {
            let connection = state.db_connection.lock().unwrap();
            let user = insert_test_user(&connection, "ana@example.com");
            let context = insert_test_context(&connection, user.id);
            let account = insert_test_account(&connection, context.id, "Corrente", 0.0);
            create_transaction(
                Transaction::build(
                    context.id,
                    TransactionType::Income,
                    3000.0,
                    datetime!(2025-02-05 09:00 UTC),
                    "Salário",
                )
                .destination_account(Some(account.id))
                .paid(true),
                &connection,
            )
            .unwrap();
            context.id
        };

        let response = server
            .get(&format_endpoint(endpoints::MONTHLY_REPORT, context_id))
            .add_query_param("month", 2)
            .add_query_param("year", 2025)
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({
                "period": {"month": 2, "year": 2025},
                "totalIncome": 3000.0,
                "totalExpense": 0.0,
                "balance": 3000.0,
                "byCategory": [{
                    "id": null,
                    "name": "Sem Categoria",
                    "icon": "❓",
                    "amount": 3000.0,
                    "type": "INCOME",
                }],
            })
        );
    }

    #[tokio::test]
    async fn defaults_to_current_month() {
        let (server, state) = get_test_server();
        let context_id = {
            let connection = state.db_connection.lock().unwrap();
            let user = insert_test_user(&connection, "ana@example.com");
            insert_test_context(&connection, user.id).id
        };
        let today = OffsetDateTime::now_utc().date();

        let report = server
            .get(&format_endpoint(endpoints::MONTHLY_REPORT, context_id))
            .await
            .json::<Value>();

        assert_eq!(report["period"]["month"], u8::from(today.month()));
        assert_eq!(report["period"]["year"], today.year());
    }

    #[tokio::test]
    async fn invalid_month_is_bad_request() {
        let (server, _) = get_test_server();

        server
            .get(&format_endpoint(endpoints::MONTHLY_REPORT, 1))
            .add_query_param("month", 13)
            .add_query_param("year", 2025)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}

//! Defines the endpoint for updating an account.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    Error,
    account::{Account, AccountState, AccountUpdate, update_account},
    app_state::lock_connection,
    database_id::AccountId,
};

pub async fn edit_account_endpoint(
    State(state): State<AccountState>,
    Path(account_id): Path<AccountId>,
    Json(update): Json<AccountUpdate>,
) -> Result<Json<Account>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    update_account(account_id, update, &connection).map(Json)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{get_test_server, insert_test_account, insert_test_context, insert_test_user},
    };

    #[tokio::test]
    async fn can_rename_account() {
        let (server, state) = get_test_server();
        let account = {
            let connection = state.db_connection.lock().unwrap();
            let user = insert_test_user(&connection, "ana@example.com");
            let context = insert_test_context(&connection, user.id);
            insert_test_account(&connection, context.id, "Conta", 10.0)
        };

        let response = server
            .patch(&format_endpoint(endpoints::ACCOUNT, account.id))
            .json(&json!({"name": "Conta Conjunta"}))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["name"], "Conta Conjunta");
        assert_eq!(body["initialBalance"], 10.0);
    }

    #[tokio::test]
    async fn editing_missing_account_is_not_found() {
        let (server, _) = get_test_server();

        server
            .patch(&format_endpoint(endpoints::ACCOUNT, 5))
            .json(&json!({"name": "Conta"}))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

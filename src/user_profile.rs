//! Looking up other users by email, e.g. before inviting them to a context.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    Error,
    app_state::lock_connection,
    log_in::LoginState,
    user::{PublicUser, get_user_by_email},
};

/// A route handler for getting the public profile of the user registered with an email.
pub async fn get_user_endpoint(
    State(state): State<LoginState>,
    Path(email): Path<String>,
) -> Result<Json<PublicUser>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_user_by_email(&email, &connection)?
        .map(|user| Json(PublicUser::from(user)))
        .ok_or(Error::NotFound)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{get_test_server, insert_test_user},
    };

    #[tokio::test]
    async fn finds_user_by_email() {
        let (server, state) = get_test_server();
        let user = {
            let connection = state.db_connection.lock().unwrap();
            insert_test_user(&connection, "rosa@example.com")
        };

        let response = server
            .get(&format_endpoint(endpoints::USER, "rosa@example.com"))
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({"id": user.id, "name": "rosa", "email": "rosa@example.com"})
        );
    }

    #[tokio::test]
    async fn unknown_email_is_not_found() {
        let (server, _) = get_test_server();

        server
            .get(&format_endpoint(endpoints::USER, "nobody@example.com"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

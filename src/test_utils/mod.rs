#![allow(missing_docs)]

use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use rusqlite::Connection;

use crate::{
    AppState, PasswordHash, UserID,
    account::{Account, AccountType, NewAccount, create_account},
    category::{Category, CategoryType, NewCategory, create_category},
    context::{Context, ContextType, NewContext, create_context},
    database_id::ContextId,
    db::initialize,
    requester::USER_ID_HEADER,
    routing::build_router,
    user::{NewUser, User, create_user},
};

/// An in-memory database with every table created.
#[track_caller]
pub(crate) fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("could not open in-memory database");
    initialize(&connection).expect("could not initialize test database");
    connection
}

/// A server for the full router backed by an in-memory database.
#[track_caller]
pub(crate) fn get_test_server() -> (TestServer, AppState) {
    let connection = Connection::open_in_memory().expect("could not open in-memory database");
    let state = AppState::new(connection, "Etc/UTC")
        .expect("could not create app state")
        .with_password_hash_cost(4);
    let server = TestServer::try_new(build_router(state.clone(), None))
        .expect("could not create test server");

    (server, state)
}

/// The header that identifies `user_id` as the requester.
pub(crate) fn requester_header(user_id: UserID) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static(USER_ID_HEADER),
        HeaderValue::from(user_id.as_i64()),
    )
}

#[track_caller]
pub(crate) fn insert_test_user(connection: &Connection, email: &str) -> User {
    let name = email.split('@').next().unwrap_or(email);

    create_user(
        NewUser {
            name: name.to_owned(),
            email: email.to_owned(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
        },
        connection,
    )
    .expect("could not create test user")
}

#[track_caller]
pub(crate) fn insert_test_context(connection: &Connection, admin: UserID) -> Context {
    create_context(
        NewContext {
            name: "Casa".to_owned(),
            context_type: ContextType::Personal,
            features: Default::default(),
        },
        admin,
        connection,
    )
    .expect("could not create test context")
}

#[track_caller]
pub(crate) fn insert_test_category(
    connection: &Connection,
    context_id: ContextId,
    name: &str,
    category_type: CategoryType,
) -> Category {
    create_category(
        NewCategory {
            context_id,
            name: name.to_owned(),
            icon: Some("🏷️".to_owned()),
            category_type,
        },
        connection,
    )
    .expect("could not create test category")
}

#[track_caller]
pub(crate) fn insert_test_account(
    connection: &Connection,
    context_id: ContextId,
    name: &str,
    initial_balance: f64,
) -> Account {
    create_account(
        NewAccount {
            context_id,
            name: name.to_owned(),
            account_type: AccountType::Cash,
            initial_balance,
        },
        connection,
    )
    .expect("could not create test account")
}

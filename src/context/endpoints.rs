//! The HTTP handlers for contexts and their members.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, UserID,
    app_state::lock_connection,
    context::{
        Context, ContextUpdate, Member, Membership, NewContext, add_member, create_context,
        delete_context, get_context, get_contexts_for_user, get_members, remove_member,
        update_context,
    },
    database_id::ContextId,
    requester::Requester,
};

/// The state needed to manage contexts.
#[derive(Debug, Clone)]
pub struct ContextState {
    /// The database connection for managing contexts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ContextState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for creating a context owned by the requester.
pub async fn create_context_endpoint(
    State(state): State<ContextState>,
    Requester(user_id): Requester,
    Json(new_context): Json<NewContext>,
) -> Result<(StatusCode, Json<Context>), Error> {
    let connection = lock_connection(&state.db_connection)?;
    let context = create_context(new_context, user_id, &connection)?;

    Ok((StatusCode::CREATED, Json(context)))
}

/// A route handler for listing the contexts the requester is a member of.
pub async fn get_contexts_endpoint(
    State(state): State<ContextState>,
    Requester(user_id): Requester,
) -> Result<Json<Vec<Context>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_contexts_for_user(user_id, &connection).map(Json)
}

pub async fn get_context_endpoint(
    State(state): State<ContextState>,
    Path(context_id): Path<ContextId>,
) -> Result<Json<Context>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_context(context_id, &connection)?
        .map(Json)
        .ok_or(Error::NotFound)
}

pub async fn update_context_endpoint(
    State(state): State<ContextState>,
    Path(context_id): Path<ContextId>,
    Json(update): Json<ContextUpdate>,
) -> Result<Json<Context>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    update_context(context_id, update, &connection).map(Json)
}

/// A route handler for deleting a context and everything it owns.
pub async fn delete_context_endpoint(
    State(state): State<ContextState>,
    Path(context_id): Path<ContextId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_context(context_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_members_endpoint(
    State(state): State<ContextState>,
    Path(context_id): Path<ContextId>,
) -> Result<Json<Vec<Member>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_members(context_id, &connection).map(Json)
}

/// The request body for adding a member to a context.
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub email: String,
    pub role: String,
}

/// A route handler for adding a user to a context, only admins of the context may do this.
pub async fn add_member_endpoint(
    State(state): State<ContextState>,
    Path(context_id): Path<ContextId>,
    Requester(requester): Requester,
    Json(request): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<Membership>), Error> {
    let connection = lock_connection(&state.db_connection)?;
    let membership = add_member(
        context_id,
        &request.email,
        &request.role,
        requester,
        &connection,
    )?;

    Ok((StatusCode::CREATED, Json(membership)))
}

/// A route handler for removing a user from a context, only admins of the context may do this.
pub async fn remove_member_endpoint(
    State(state): State<ContextState>,
    Path((context_id, user_id)): Path<(ContextId, i64)>,
    Requester(requester): Requester,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;
    remove_member(context_id, UserID::new(user_id), requester, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

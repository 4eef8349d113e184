//! Membership of users in contexts and the policy that guards changes to it.

use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

use crate::{
    Error, UserID,
    database_id::ContextId,
    sql_enum::text_enum,
    user::{PublicUser, get_user_by_email},
};

text_enum! {
    /// What a member may do in a context.
    pub enum Role {
        /// Manages the context and its members.
        Admin => "ADMIN",
        /// Records and edits the context's finances.
        Collaborator => "COLLABORATOR",
        /// Reads the context's finances.
        Viewer => "VIEWER",
    }
}

/// The privileged operations on a context's membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipAction {
    AddMember,
    RemoveMember,
}

/// Decide whether a requester with `requester_role` may perform `action`.
///
/// `requester_role` is `None` when the requester is not a member of the context.
/// Every mutating membership operation goes through this function.
///
/// # Errors
/// Returns [Error::Forbidden] if the action is not allowed.
pub fn authorize(requester_role: Option<Role>, action: MembershipAction) -> Result<(), Error> {
    let allowed = match action {
        MembershipAction::AddMember | MembershipAction::RemoveMember => {
            requester_role == Some(Role::Admin)
        }
    };

    if allowed {
        Ok(())
    } else {
        tracing::debug!("denied {action:?} for role {requester_role:?}");
        Err(Error::Forbidden)
    }
}

/// A user's role in a context.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub user_id: UserID,
    pub context_id: ContextId,
    pub role: Role,
}

/// A membership together with the member's public profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub user_id: UserID,
    pub context_id: ContextId,
    pub role: Role,
    pub user: PublicUser,
}

pub fn create_membership_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS membership (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            context_id INTEGER NOT NULL,
            role TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(user_id, context_id),
            FOREIGN KEY(user_id) REFERENCES user(id),
            FOREIGN KEY(context_id) REFERENCES context(id)
        );

        CREATE INDEX IF NOT EXISTS idx_membership_context ON membership(context_id);",
    )?;

    Ok(())
}

pub(crate) fn insert_membership(
    context_id: ContextId,
    user_id: UserID,
    role: Role,
    connection: &Connection,
) -> Result<Membership, Error> {
    connection.execute(
        "INSERT INTO membership (user_id, context_id, role) VALUES (?1, ?2, ?3)",
        (user_id.as_i64(), context_id, role),
    )?;

    Ok(Membership {
        user_id,
        context_id,
        role,
    })
}

/// Get the role of `user_id` in `context_id`, `None` if they are not a member.
pub fn get_role(
    context_id: ContextId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Option<Role>, Error> {
    connection
        .query_row(
            "SELECT role FROM membership WHERE context_id = ?1 AND user_id = ?2",
            (context_id, user_id.as_i64()),
            |row| row.get(0),
        )
        .optional()
        .map_err(Error::from)
}

/// List the members of a context with their public profiles.
pub fn get_members(context_id: ContextId, connection: &Connection) -> Result<Vec<Member>, Error> {
    connection
        .prepare(
            "SELECT m.user_id, m.context_id, m.role, u.name, u.email
             FROM membership m
             INNER JOIN user u ON u.id = m.user_id
             WHERE m.context_id = :context_id
             ORDER BY m.id ASC",
        )?
        .query_map(&[(":context_id", &context_id)], |row| {
            let user_id = UserID::new(row.get(0)?);

            Ok(Member {
                user_id,
                context_id: row.get(1)?,
                role: row.get(2)?,
                user: PublicUser {
                    id: user_id,
                    name: row.get(3)?,
                    email: row.get(4)?,
                },
            })
        })?
        .map(|maybe_member| maybe_member.map_err(Error::from))
        .collect()
}

/// Add the user registered with `email` to a context with the given role.
///
/// # Errors
/// This function will return a:
/// - [Error::Forbidden] if `requester` is not an ADMIN of the context,
/// - [Error::UnknownUser] if no user is registered with `email`,
/// - [Error::InvalidRole] if `role` is not ADMIN, COLLABORATOR or VIEWER,
/// - [Error::DuplicateMembership] if the user is already a member,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn add_member(
    context_id: ContextId,
    email: &str,
    role: &str,
    requester: UserID,
    connection: &Connection,
) -> Result<Membership, Error> {
    authorize(
        get_role(context_id, requester, connection)?,
        MembershipAction::AddMember,
    )?;

    let user = get_user_by_email(email, connection)?
        .ok_or_else(|| Error::UnknownUser(email.trim().to_owned()))?;

    let role = role.trim().parse::<Role>().map_err(Error::InvalidRole)?;

    let membership = insert_membership(context_id, user.id, role, connection)?;

    tracing::info!(
        "user {requester} added user {} to context {context_id} as {role}",
        user.id
    );

    Ok(membership)
}

/// Remove `user_id` from a context.
///
/// # Errors
/// This function will return a:
/// - [Error::Forbidden] if `requester` is not an ADMIN of the context,
/// - [Error::DeleteMissingMembership] if `user_id` is not a member,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn remove_member(
    context_id: ContextId,
    user_id: UserID,
    requester: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    authorize(
        get_role(context_id, requester, connection)?,
        MembershipAction::RemoveMember,
    )?;

    let rows_affected = connection.execute(
        "DELETE FROM membership WHERE context_id = ?1 AND user_id = ?2",
        (context_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingMembership);
    }

    tracing::info!("user {requester} removed user {user_id} from context {context_id}");

    Ok(())
}


#[cfg(test)]
mod membership_tests {
    use crate::{
        Error,
        context::{Role, add_member, get_members, get_role, remove_member},
        test_utils::{get_test_connection, insert_test_context, insert_test_user},
    };

    #[test]
    fn admin_can_add_member() {
        let conn = get_test_connection();
        let admin = insert_test_user(&conn, "ana@example.com");
        let guest = insert_test_user(&conn, "bruno@example.com");
        let context = insert_test_context(&conn, admin.id);

        let membership =
            add_member(context.id, "bruno@example.com", "VIEWER", admin.id, &conn).unwrap();

        assert_eq!(membership.user_id, guest.id);
        assert_eq!(membership.role, Role::Viewer);
        assert_eq!(get_role(context.id, guest.id, &conn), Ok(Some(Role::Viewer)));
    }

    #[test]
    fn non_admin_cannot_add_member() {
        let conn = get_test_connection();
        let admin = insert_test_user(&conn, "ana@example.com");
        let collaborator = insert_test_user(&conn, "bruno@example.com");
        insert_test_user(&conn, "carla@example.com");
        let context = insert_test_context(&conn, admin.id);
        add_member(
            context.id,
            "bruno@example.com",
            "COLLABORATOR",
            admin.id,
            &conn,
        )
        .unwrap();

        let result = add_member(
            context.id,
            "carla@example.com",
            "VIEWER",
            collaborator.id,
            &conn,
        );

        assert_eq!(result, Err(Error::Forbidden));
    }

    #[test]
    fn outsider_cannot_add_member() {
        let conn = get_test_connection();
        let admin = insert_test_user(&conn, "ana@example.com");
        let outsider = insert_test_user(&conn, "bruno@example.com");
        let context = insert_test_context(&conn, admin.id);

        let result = add_member(context.id, "bruno@example.com", "ADMIN", outsider.id, &conn);

        assert_eq!(result, Err(Error::Forbidden));
    }

    #[test]
    fn add_member_fails_for_unknown_email() {
        let conn = get_test_connection();
        let admin = insert_test_user(&conn, "ana@example.com");
        let context = insert_test_context(&conn, admin.id);

        let result = add_member(context.id, "ghost@example.com", "VIEWER", admin.id, &conn);

        assert_eq!(
            result,
            Err(Error::UnknownUser("ghost@example.com".to_owned()))
        );
    }

    #[test]
    fn add_member_fails_for_invalid_role() {
        let conn = get_test_connection();
        let admin = insert_test_user(&conn, "ana@example.com");
        insert_test_user(&conn, "bruno@example.com");
        let context = insert_test_context(&conn, admin.id);

        let result = add_member(context.id, "bruno@example.com", "OWNER", admin.id, &conn);

        assert_eq!(result, Err(Error::InvalidRole("OWNER".to_owned())));
    }

    #[test]
    fn add_member_fails_for_existing_member() {
        let conn = get_test_connection();
        let admin = insert_test_user(&conn, "ana@example.com");
        let context = insert_test_context(&conn, admin.id);

        let result = add_member(context.id, "ana@example.com", "VIEWER", admin.id, &conn);

        assert_eq!(result, Err(Error::DuplicateMembership));
    }

    #[test]
    fn admin_can_remove_member() {
        let conn = get_test_connection();
        let admin = insert_test_user(&conn, "ana@example.com");
        let guest = insert_test_user(&conn, "bruno@example.com");
        let context = insert_test_context(&conn, admin.id);
        add_member(context.id, "bruno@example.com", "VIEWER", admin.id, &conn).unwrap();

        remove_member(context.id, guest.id, admin.id, &conn).unwrap();

        assert_eq!(get_role(context.id, guest.id, &conn), Ok(None));
        let members = get_members(context.id, &conn).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].user.email, "ana@example.com");
    }

    #[test]
    fn viewer_cannot_remove_member() {
        let conn = get_test_connection();
        let admin = insert_test_user(&conn, "ana@example.com");
        let viewer = insert_test_user(&conn, "bruno@example.com");
        let context = insert_test_context(&conn, admin.id);
        add_member(context.id, "bruno@example.com", "VIEWER", admin.id, &conn).unwrap();

        let result = remove_member(context.id, admin.id, viewer.id, &conn);

        assert_eq!(result, Err(Error::Forbidden));
        assert_eq!(get_role(context.id, admin.id, &conn), Ok(Some(Role::Admin)));
    }

    #[test]
    fn removing_non_member_fails() {
        let conn = get_test_connection();
        let admin = insert_test_user(&conn, "ana@example.com");
        let outsider = insert_test_user(&conn, "bruno@example.com");
        let context = insert_test_context(&conn, admin.id);

        let result = remove_member(context.id, outsider.id, admin.id, &conn);

        assert_eq!(result, Err(Error::DeleteMissingMembership));
    }
}

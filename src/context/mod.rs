//! Contexts, the tenancy boundary of the ledger, and their memberships.

mod core;
mod endpoints;
mod membership;

pub use core::{
    Context, ContextType, ContextUpdate, NewContext, create_context, create_context_table,
    delete_context, get_context, get_contexts_for_user, update_context,
};
pub use endpoints::{
    add_member_endpoint, create_context_endpoint, delete_context_endpoint,
    get_context_endpoint, get_contexts_endpoint, get_members_endpoint, remove_member_endpoint,
    update_context_endpoint,
};
pub use membership::{
    Member, Membership, Role, add_member, create_membership_table, get_members, get_role,
    remove_member,
};

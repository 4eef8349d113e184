//! Household Ledger is a REST API for tracking personal and shared household finances.
//!
//! Users group their accounts, categories, transactions, budgets and recurring
//! expenses into contexts, e.g. a personal context and one shared with a partner.
//! Account balances and monthly reports are computed from settled transactions.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod account;
mod app_state;
mod budget;
mod category;
mod context;
mod database_id;
mod db;
mod endpoints;
mod error;
mod log_in;
mod logging;
mod password;
mod recurring_expense;
mod register_user;
mod report;
mod requester;
mod routing;
mod sql_enum;
mod timezone;
mod transaction;
mod user;
mod user_profile;
mod validation;

#[cfg(test)]
mod test_utils;

pub use account::{AccountType, NewAccount, create_account};
pub use app_state::AppState;
pub use category::seed_default_categories;
pub use context::{ContextType, NewContext, Role, create_context, get_role};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::{PasswordHash, ValidatedPassword};
pub use recurring_expense::RecurrenceType;
pub use routing::build_router;
pub use transaction::Settlement;
pub use user::{NewUser, User, UserID, create_user, get_user_by_id};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

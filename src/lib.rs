//! Ledgerline is a JSON API for tracking personal income and expenses.
//!
//! Users register with a username and password and exchange them for a
//! bearer token. With the token they can manage their own categories and
//! transactions and ask for their balance, either all-time or within a window
//! of days.
//!
//! The library exposes [build_router] for serving the API, the [AppState] it
//! runs on, and the database setup used by the bundled binaries.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
pub mod auth;
pub mod category;
pub mod db;
pub mod endpoints;
mod error;
mod extract;
mod logging;
mod password;
mod routing;
pub mod summary;
#[cfg(test)]
mod test_utils;
mod timezone;
pub mod transaction;
pub mod user;

pub use app_state::{AppState, DEFAULT_TOKEN_DURATION, TokenKeys};
pub use db::{DbPool, create_pool, initialize as initialize_db};
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use user::{User, UserID};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
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

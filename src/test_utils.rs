#![allow(missing_docs)]

use axum_test::TestServer;
use r2d2_sqlite::SqliteConnectionManager;
use serde_json::json;

use crate::{
    AppState, auth::LogInResponse, auth::RegisteredUser, build_router, db::create_pool, endpoints,
};

/// A password that passes the strength check.
pub(crate) const TEST_PASSWORD: &str = "averysafeandsecurepassword";

/// App state backed by a fresh in-memory database.
///
/// The pool holds a single connection because every in-memory SQLite
/// connection is its own database.
pub(crate) fn get_test_state() -> AppState {
    let db_pool = create_pool(SqliteConnectionManager::memory(), 1)
        .expect("Could not create test database pool.");

    AppState::new(db_pool, "foobar", "Etc/UTC")
        .expect("Could not create test app state.")
        .with_password_cost(4)
}

pub(crate) fn get_test_server(state: AppState) -> TestServer {
    TestServer::try_new(build_router(state)).expect("Could not create test server.")
}

/// Register `username` with [TEST_PASSWORD].
pub(crate) async fn register(server: &TestServer, username: &str) -> RegisteredUser {
    let response = server
        .post(endpoints::REGISTER)
        .json(&json!({ "username": username, "password": TEST_PASSWORD }))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<RegisteredUser>()
}

/// Register `username` and return a bearer token for them.
pub(crate) async fn register_and_log_in(server: &TestServer, username: &str) -> String {
    register(server, username).await;

    let response = server
        .post(endpoints::LOG_IN)
        .json(&json!({ "username": username, "password": TEST_PASSWORD }))
        .await;

    response.assert_status_ok();
    response.json::<LogInResponse>().token
}

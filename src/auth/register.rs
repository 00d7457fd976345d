//! Handles requests to register a new user.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, PasswordHash, UserID, auth::log_in::Credentials, extract::ApiJson,
    user::create_user,
};

/// The public details of a newly registered user.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RegisteredUser {
    /// The ID the store assigned to the user.
    pub id: UserID,
    /// The username, with surrounding whitespace removed.
    pub username: String,
}

/// Register a new user with the username and password in the request body.
///
/// # Errors
///
/// Responds with:
/// - 400 if the username is empty or the password is too weak,
/// - 409 if the username is already taken,
/// - 500 if the password could not be hashed or the user could not be stored.
pub async fn register_user(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<(StatusCode, Json<RegisteredUser>), Error> {
    let username = credentials.username.trim();

    if username.is_empty() {
        return Err(Error::EmptyUsername);
    }

    let password_hash =
        PasswordHash::from_raw_password(&credentials.password, &[username], state.password_cost)?;

    let connection = state.connection()?;
    let user = create_user(username, password_hash, &connection)?;

    tracing::info!("Registered user {} with ID {}", user.username, user.id);

    Ok((
        StatusCode::CREATED,
        Json(RegisteredUser {
            id: user.id,
            username: user.username,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{
        endpoints,
        test_utils::{TEST_PASSWORD, get_test_server, get_test_state},
    };

    use super::RegisteredUser;

    #[tokio::test]
    async fn register_creates_user() {
        let server = get_test_server(get_test_state());

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({ "username": " alice ", "password": TEST_PASSWORD }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let user = response.json::<RegisteredUser>();
        assert!(user.id.as_i64() > 0);
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn register_does_not_echo_password() {
        let server = get_test_server(get_test_state());

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({ "username": "alice", "password": TEST_PASSWORD }))
            .await;

        assert!(!response.text().contains(TEST_PASSWORD));
    }

    #[tokio::test]
    async fn register_fails_on_duplicate_username() {
        let server = get_test_server(get_test_state());
        let body = json!({ "username": "alice", "password": TEST_PASSWORD });
        server
            .post(endpoints::REGISTER)
            .json(&body)
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.post(endpoints::REGISTER).json(&body).await;

        response.assert_status(StatusCode::CONFLICT);
        response.assert_json(&json!({ "error": "the username is already taken" }));
    }

    #[tokio::test]
    async fn register_fails_on_empty_username() {
        let server = get_test_server(get_test_state());

        server
            .post(endpoints::REGISTER)
            .json(&json!({ "username": "  ", "password": TEST_PASSWORD }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_fails_on_weak_password() {
        let server = get_test_server(get_test_state());

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({ "username": "alice", "password": "password1234" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body = response.json::<serde_json::Value>();
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("password is too weak")
        );
    }
}

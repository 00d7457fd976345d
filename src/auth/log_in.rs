//! Handles log-in requests by exchanging a username and password for a bearer token.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Error, PasswordHash,
    auth::token::{IssuedToken, encode_token},
    extract::ApiJson,
    user::get_user_by_username,
};

/// The credentials entered during log-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// The name the user registered with.
    pub username: String,
    /// The user's password in plain text.
    pub password: String,
}

/// The body of a successful log-in response.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct LogInResponse {
    /// The bearer token for the `Authorization` header.
    pub token: String,
    /// When the token stops being accepted.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

/// Handler for log-in requests.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The username does not belong to a registered user.
/// - The password is not correct.
/// - An internal error occurred when verifying the password or signing the token.
///
/// The first two cases share [Error::InvalidCredential] so clients cannot
/// tell which usernames are registered.
pub async fn log_in(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<Json<LogInResponse>, Error> {
    let user = {
        let connection = state.connection()?;
        get_user_by_username(&credentials.username, &connection)
    };

    let user = match user {
        Ok(user) => user,
        Err(Error::NotFound) => {
            PasswordHash::verify_without_hash(&credentials.password, state.password_cost);
            tracing::info!("Failed log-in attempt for an unknown username");
            return Err(Error::InvalidCredential);
        }
        Err(error) => return Err(error),
    };

    if !user.password_hash.verify(&credentials.password)? {
        tracing::info!("Failed log-in attempt for user {}", user.id);
        return Err(Error::InvalidCredential);
    }

    let IssuedToken { token, expires_at } = encode_token(
        user.id,
        OffsetDateTime::now_utc(),
        state.token_duration,
        &state.token_keys,
    )?;

    Ok(Json(LogInResponse { token, expires_at }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use time::{Duration, OffsetDateTime};

    use crate::{
        endpoints,
        test_utils::{TEST_PASSWORD, get_test_server, get_test_state, register},
    };

    use super::LogInResponse;

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let server = get_test_server(get_test_state());
        register(&server, "alice").await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "username": "alice", "password": TEST_PASSWORD }))
            .await;

        response.assert_status_ok();
        let body = response.json::<LogInResponse>();
        assert!(!body.token.is_empty());
        let lifetime = body.expires_at - OffsetDateTime::now_utc();
        assert!(lifetime > Duration::hours(23) && lifetime <= Duration::hours(24));
    }

    #[tokio::test]
    async fn log_in_fails_with_wrong_password() {
        let server = get_test_server(get_test_state());
        register(&server, "alice").await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "username": "alice", "password": "definitelyNotTheCorrectPassword" }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({ "error": "invalid credentials" }));
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_username() {
        let server = get_test_server(get_test_state());

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "username": "mallory", "password": TEST_PASSWORD }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({ "error": "invalid credentials" }));
    }

    #[tokio::test]
    async fn unknown_username_and_wrong_password_are_indistinguishable() {
        let server = get_test_server(get_test_state());
        register(&server, "alice").await;

        let wrong_password = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "username": "alice", "password": "definitelyNotTheCorrectPassword" }))
            .await;
        let unknown_username = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "username": "bob", "password": "definitelyNotTheCorrectPassword" }))
            .await;

        assert_eq!(wrong_password.status_code(), unknown_username.status_code());
        assert_eq!(wrong_password.text(), unknown_username.text());
    }

    #[tokio::test]
    async fn log_in_fails_with_missing_credentials() {
        let server = get_test_server(get_test_state());

        server
            .post(endpoints::LOG_IN)
            .json(&json!({ "username": "alice" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}

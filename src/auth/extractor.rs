//! The extractor that guards routes behind a bearer token.

use axum::{
    RequestPartsExt,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{AppState, Error, UserID, auth::token::decode_token, user::get_user_by_id};

/// The user who made the request, resolved from the `Authorization: Bearer`
/// header.
///
/// Add this as a handler argument to require authentication. Requests are
/// rejected with:
/// - [Error::Unauthenticated] if the header is missing or malformed,
/// - [Error::InvalidCredential] if the token fails the signature or expiry
///   check, or the user it was issued to no longer exists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentUser(pub UserID);

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| Error::Unauthenticated)?;

        let state = AppState::from_ref(state);
        let user_id = decode_token(bearer.token(), &state.token_keys)?.user_id()?;

        // The connection must go back to the pool before the handler runs.
        let connection = state.connection()?;
        match get_user_by_id(user_id, &connection) {
            Ok(_) => Ok(CurrentUser(user_id)),
            Err(Error::NotFound) => {
                tracing::debug!("Rejected token for missing user {user_id}");
                Err(Error::InvalidCredential)
            }
            Err(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{Json, Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use time::{Duration, OffsetDateTime};

    use crate::{
        AppState, PasswordHash, UserID,
        auth::token::encode_token,
        test_utils::get_test_state,
        user::create_user,
    };

    use super::CurrentUser;

    async fn whoami(CurrentUser(user_id): CurrentUser) -> Json<UserID> {
        Json(user_id)
    }

    fn get_test_server(state: AppState) -> TestServer {
        let app = Router::new().route("/whoami", get(whoami)).with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn insert_test_user(state: &AppState) -> UserID {
        let connection = state.connection().unwrap();

        create_user("alice", PasswordHash::new_unchecked("hunter2"), &connection)
            .unwrap()
            .id
    }

    fn token_for(user_id: UserID, state: &AppState) -> String {
        encode_token(
            user_id,
            OffsetDateTime::now_utc(),
            Duration::hours(24),
            &state.token_keys,
        )
        .unwrap()
        .token
    }

    #[tokio::test]
    async fn valid_token_resolves_user() {
        let state = get_test_state();
        let user_id = insert_test_user(&state);
        let token = token_for(user_id, &state);
        let server = get_test_server(state);

        let response = server.get("/whoami").authorization_bearer(token).await;

        response.assert_status_ok();
        assert_eq!(response.json::<UserID>(), user_id);
    }

    #[tokio::test]
    async fn missing_header_is_unauthenticated() {
        let server = get_test_server(get_test_state());

        let response = server.get("/whoami").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&serde_json::json!({
            "error": "missing or malformed authorization header"
        }));
    }

    #[tokio::test]
    async fn bad_token_is_invalid_credential() {
        let server = get_test_server(get_test_state());

        let response = server
            .get("/whoami")
            .authorization_bearer("definitely.not.valid")
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&serde_json::json!({ "error": "invalid credentials" }));
    }

    #[tokio::test]
    async fn token_for_missing_user_is_invalid_credential() {
        let state = get_test_state();
        let token = token_for(UserID::new(999), &state);
        let server = get_test_server(state);

        let response = server.get("/whoami").authorization_bearer(token).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&serde_json::json!({ "error": "invalid credentials" }));
    }
}

//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::Error;

/// The maximum number of bytes of a body to log at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// JSON fields whose values are never logged.
const REDACTED_FIELDS: [&str; 2] = ["password", "token"];

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated
/// and the full body is logged at the `debug` level.
/// Bearer tokens in the `Authorization` header and `password` and `token`
/// fields in JSON bodies are redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => return Error::InvalidJson(error.to_string()).into_response(),
    };

    log_message(
        &format!("Received request: {} {}", parts.method, parts.uri),
        &parts.headers,
        &display_body(&parts.headers, &body_bytes),
    );

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    log_message(
        &format!("Sending response: {}", parts.status),
        &parts.headers,
        &display_body(&parts.headers, &body_bytes),
    );

    Response::from_parts(parts, Body::from(body_bytes))
}

fn display_body(headers: &HeaderMap, body_bytes: &[u8]) -> String {
    let body_text = String::from_utf8_lossy(body_bytes);

    if is_json(headers) {
        redact_fields(&body_text)
    } else {
        body_text.into_owned()
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

/// Replace the values of top-level credential fields with asterisks.
///
/// Bodies that are not JSON objects are returned unchanged.
fn redact_fields(body_text: &str) -> String {
    match serde_json::from_str::<Value>(body_text) {
        Ok(Value::Object(mut object))
            if REDACTED_FIELDS.iter().any(|field| object.contains_key(*field)) =>
        {
            for field in REDACTED_FIELDS {
                if let Some(value) = object.get_mut(field) {
                    *value = Value::from(REDACTED);
                }
            }

            Value::Object(object).to_string()
        }
        _ => body_text.to_owned(),
    }
}

fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();

    if headers.contains_key(AUTHORIZATION) {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_static("Bearer ********"),
        );
    }

    headers
}

fn log_message(message: &str, headers: &HeaderMap, body: &str) {
    let headers = redact_headers(headers);

    if body.len() > LOG_BODY_LENGTH_LIMIT {
        let cut = floor_char_boundary(body, LOG_BODY_LENGTH_LIMIT);
        tracing::info!("{message}\nheaders: {headers:#?}\nbody: {}...", &body[..cut]);
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{message}\nheaders: {headers:#?}\nbody: {body:?}");
    }
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    (0..=index)
        .rev()
        .find(|&i| text.is_char_boundary(i))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::{
        io::{self, Write},
        sync::{Arc, Mutex},
    };

    use axum::{
        Router,
        http::{HeaderMap, HeaderValue, header::AUTHORIZATION},
        middleware,
        routing::post,
    };
    use axum_test::TestServer;
    use serde_json::json;
    use tracing_subscriber::fmt::MakeWriter;

    use crate::{
        endpoints,
        test_utils::{TEST_PASSWORD, get_test_server, get_test_state, register_and_log_in},
    };

    use super::{floor_char_boundary, logging_middleware, redact_fields, redact_headers};

    /// Collects everything written by a `tracing_subscriber::fmt` subscriber.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn redacts_password_field() {
        let redacted = redact_fields(r#"{"username":"alice","password":"hunter2hunter2"}"#);

        assert!(!redacted.contains("hunter2"));
        assert!(redacted.contains(r#""password":"********""#));
        assert!(redacted.contains(r#""username":"alice""#));
    }

    #[test]
    fn redacts_token_field() {
        let redacted =
            redact_fields(r#"{"token":"eyJ0eXAi.abc.def","expires_at":"2024-01-01T00:00:00Z"}"#);

        assert!(!redacted.contains("eyJ0eXAi"));
        assert!(redacted.contains(r#""token":"********""#));
        assert!(redacted.contains("expires_at"));
    }

    #[test]
    fn leaves_other_bodies_unchanged() {
        assert_eq!(redact_fields(r#"{"amount":1}"#), r#"{"amount":1}"#);
        assert_eq!(redact_fields("not json"), "not json");
    }

    #[test]
    fn redacts_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer eyJ0eXAi.abc.def"));
        headers.insert("x-request-id", HeaderValue::from_static("42"));

        let redacted = redact_headers(&headers);

        assert_eq!(redacted[AUTHORIZATION], "Bearer ********");
        assert_eq!(redacted["x-request-id"], "42");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "ééé";

        assert_eq!(floor_char_boundary(text, 3), 2);
        assert_eq!(floor_char_boundary(text, 4), 4);
    }

    #[tokio::test]
    async fn middleware_passes_body_through() {
        let app = Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");
        let body = json!({ "username": "alice", "password": "hunter2hunter2" });

        let response = server.post("/echo").json(&body).await;

        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>(), body);
    }

    #[tokio::test]
    async fn credentials_are_not_logged() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let server = get_test_server(get_test_state());
        let token = register_and_log_in(&server, "alice").await;
        server
            .get(endpoints::BALANCE)
            .authorization_bearer(&token)
            .await
            .assert_status_ok();

        let logs = logs.contents();
        assert!(logs.contains("Received request: GET /balance"));
        assert!(logs.contains("Bearer ********"));
        assert!(!logs.contains(&token), "the bearer token was logged");
        assert!(!logs.contains(TEST_PASSWORD), "the password was logged");
    }
}

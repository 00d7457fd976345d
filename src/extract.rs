//! Request extractors that report rejections with the app's JSON error format.

use axum::{
    extract::{FromRequest, FromRequestParts},
    response::{IntoResponse, Response},
};

use crate::Error;

/// Like [axum::Json], but a body that cannot be parsed is rejected with
/// [Error::InvalidJson] (400 Bad Request) instead of axum's plain text
/// rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

impl<T> IntoResponse for ApiJson<T>
where
    axum::Json<T>: IntoResponse,
{
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Like [axum::extract::Path], but a parameter that cannot be parsed is
/// rejected with [Error::InvalidId].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct ApiPath<T>(pub T);

/// Like [axum::extract::Query], but a query string that cannot be parsed is
/// rejected with [Error::InvalidQuery].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct ApiQuery<T>(pub T);

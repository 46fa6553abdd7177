// JSON body extractor whose rejections render as ApiError

use axum::extract::FromRequest;
use axum::response::{IntoResponse, Response};

use super::error::ApiError;

/// Drop-in for `axum::Json` that turns malformed bodies into a 400 with a
/// `detail` field instead of axum's plain-text rejection.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl<T: serde::Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

pub mod comment;
pub mod like;
pub mod subscription;
pub mod user;
pub mod video;

use std::any::Any;

use axum::http::Uri;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;

/// Envelope for requests that match no route.
pub async fn fallback(uri: Uri) -> AppError {
    AppError::NotFound(format!("Route {} not found", uri.path()))
}

/// Turn a handler panic into the standard 500 envelope.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    AppError::Internal(format!("Handler panicked: {detail}")).into_response()
}

//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`; the body is always `{"type": ..., "message": ...}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::{ResolverError, WishlistError};

/// Application-level error type for the wishlist server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Wishlist operation failed.
    #[error(transparent)]
    Wishlist(#[from] WishlistError),

    /// Sales channel lookup failed.
    #[error("Sales channel error: {0}")]
    Resolver(#[from] ResolverError),

}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub message: String,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Wishlist(err) => match err {
                WishlistError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                WishlistError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                WishlistError::NotFound(_) => StatusCode::NOT_FOUND,
                WishlistError::Conflict(_) => StatusCode::CONFLICT,
                WishlistError::Unexpected { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Resolver(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Wishlist(err) => err.kind(),
            Self::Resolver(_) => "unexpected_state",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose lower-layer details to clients
        let message = match &self {
            Self::Resolver(_) => "Internal server error".to_string(),
            Self::Wishlist(_) => self.to_string(),
        };

        let body = ErrorBody {
            kind: self.kind(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a customer ID.
///
/// Call this once the customer is known so errors are associated with them.
pub fn set_sentry_user(customer_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(customer_id.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: impl Into<AppError>) -> StatusCode {
            err.into().into_response().status()
        }

        assert_eq!(
            get_status(WishlistError::NotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(WishlistError::InvalidInput("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(WishlistError::Unauthorized("x".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(WishlistError::Conflict("x".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(ResolverError::Database(sqlx::Error::PoolTimedOut)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let (status, body) = body_json(
            WishlistError::NotFound("Wishlist item not found".to_string()).into(),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["type"], "not_found");
        assert_eq!(body["message"], "Wishlist item not found");
    }

    #[tokio::test]
    async fn test_unexpected_keeps_action_message() {
        let err = WishlistError::Unexpected {
            action: "fetch wishlist",
            cause: "connection reset".to_string(),
        };
        let (status, body) = body_json(err.into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["type"], "unexpected_state");
        assert_eq!(body["message"], "failed to fetch wishlist: connection reset");
    }

    #[tokio::test]
    async fn test_resolver_details_hidden() {
        let err = ResolverError::Database(sqlx::Error::PoolTimedOut);
        let (status, body) = body_json(err.into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["type"], "unexpected_state");
        assert_eq!(body["message"], "Internal server error");
    }
}

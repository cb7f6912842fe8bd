// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::AuthError;
use crate::services::ServiceError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    error_code: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal server error",
        )
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(detail) => {
                Self::new(StatusCode::BAD_REQUEST, "validation_error", detail)
            }
            ServiceError::InvalidId(_) => Self::new(StatusCode::BAD_REQUEST, "invalid_id", "Invalid ID"),
            ServiceError::InvalidRole(_) => Self::new(
                StatusCode::BAD_REQUEST,
                "invalid_role",
                "Role must be doctor or receptionist",
            ),
            ServiceError::InvalidCredentials => Self::new(
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Invalid credentials",
            ),
            ServiceError::Conflict(_) => {
                Self::new(StatusCode::CONFLICT, "conflict", "Resource already exists")
            }
            ServiceError::NotFound(_) => Self::not_found("Resource not found"),
            ServiceError::Forbidden(ref denied) => Self::new(
                StatusCode::FORBIDDEN,
                match denied {
                    crate::auth::AuthzError::UnknownRole(_) => "unknown_role",
                    crate::auth::AuthzError::PermissionDenied { .. } => "permission_denied",
                },
                "You do not have permission to perform this action",
            ),
            ServiceError::NotOwner => Self::new(
                StatusCode::FORBIDDEN,
                "not_owner",
                "You can only modify your own account",
            ),
            ServiceError::Internal(_) => Self::internal(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if let AuthError::SigningFailed(ref cause) = err {
            tracing::error!(error = %cause, "token signing failed");
        }
        Self::new(err.status_code(), err.error_code(), err.public_message())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "request body rejected");
        Self::bad_request("Invalid request")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.code,
        });
        (self.status, body).into_response()
    }
}

/// `Json` extractor whose rejections use the API error body.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Action, AuthzError};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde::Deserialize;

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.message, "bad");

        let internal = ApiError::internal();
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.code, "internal_error");
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data","error_code":"invalid_request"}"#);
    }

    #[test]
    fn service_errors_map_to_status_codes() {
        let cases = [
            (ServiceError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::InvalidId("abc".into()), StatusCode::BAD_REQUEST),
            (ServiceError::InvalidRole("nurse".into()), StatusCode::BAD_REQUEST),
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (
                ServiceError::Forbidden(AuthzError::PermissionDenied {
                    role: "doctor".into(),
                    action: Action::CreatePatient,
                }),
                StatusCode::FORBIDDEN,
            ),
            (ServiceError::NotOwner, StatusCode::FORBIDDEN),
            (ServiceError::NotFound("Patient 1".into()), StatusCode::NOT_FOUND),
            (ServiceError::Conflict("Account a".into()), StatusCode::CONFLICT),
            (ServiceError::Internal("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let err = ApiError::from(ServiceError::Internal("redb commit error: /data/x".into()));
        assert_eq!(err.message, "Internal server error");

        let err = ApiError::from(ServiceError::Conflict("Account alice".into()));
        assert!(!err.message.contains("alice"));
    }

    #[test]
    fn auth_errors_keep_their_status_and_code() {
        let err = ApiError::from(AuthError::TokenExpired);
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, "token_expired");
        assert_eq!(err.message, "Invalid token");

        let err = ApiError::from(AuthError::Forbidden(AuthzError::PermissionDenied {
            role: "doctor".into(),
            action: Action::CreatePatient,
        }));
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.code, "permission_denied");

        let err = ApiError::from(AuthError::SigningFailed("key material".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("key material"));
    }

    #[derive(Debug, Deserialize)]
    struct NamedBody {
        #[allow(dead_code)]
        name: String,
    }

    #[tokio::test]
    async fn api_json_rejects_malformed_body_with_400() {
        let req = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let err = ApiJson::<NamedBody>::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "invalid_request");
    }

    #[tokio::test]
    async fn api_json_rejects_missing_fields_with_400() {
        let req = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let err = ApiJson::<NamedBody>::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account endpoints: signup, login, current account, password change and
//! deletion.
//!
//! Every handler runs its service call on the blocking pool: password hashing
//! and redb transactions both block.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use super::run_blocking;
use crate::{
    auth::Auth,
    error::{ApiError, ApiJson},
    models::{
        AccountEnvelope, LoginRequest, LoginResponse, MessageResponse, SignupRequest,
        UpdateAccountRequest,
    },
    services::AccountPatch,
    state::AppState,
};

/// Create an account.
#[utoipa::path(
    post,
    path = "/api/user/signup",
    tag = "Users",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AccountEnvelope),
        (status = 400, description = "Missing fields or unknown role"),
        (status = 409, description = "Username already taken"),
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<AccountEnvelope>), ApiError> {
    let accounts = state.accounts.clone();
    let user = run_blocking(move || {
        accounts.signup(&request.username, &request.password, &request.role)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(AccountEnvelope { user })))
}

/// Exchange credentials for a session token.
#[utoipa::path(
    post,
    path = "/api/user/login",
    tag = "Users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login succeeded", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let accounts = state.accounts.clone();
    let outcome =
        run_blocking(move || accounts.login(&request.username, &request.password, Utc::now()))
            .await?;

    Ok(Json(LoginResponse {
        user: outcome.user,
        token: outcome.token.token,
        expires_at: outcome.token.expires_at,
    }))
}

/// Get the account the presented token belongs to.
#[utoipa::path(
    get,
    path = "/api/user/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current account", body = AccountEnvelope),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "Account was deleted"),
    )
)]
pub async fn get_current_user(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<AccountEnvelope>, ApiError> {
    let accounts = state.accounts.clone();
    let user = run_blocking(move || accounts.get_by_id(user.account_id)).await?;
    Ok(Json(AccountEnvelope { user }))
}

/// Change the caller's own password.
#[utoipa::path(
    put,
    path = "/api/user/{id}",
    tag = "Users",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Account id; must be the caller's own")),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated", body = AccountEnvelope),
        (status = 400, description = "Invalid id or body"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the caller's account"),
        (status = 404, description = "Account not found"),
    )
)]
pub async fn update_user(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Auth(caller): Auth,
    ApiJson(request): ApiJson<UpdateAccountRequest>,
) -> Result<Json<AccountEnvelope>, ApiError> {
    let accounts = state.accounts.clone();
    let user = run_blocking(move || {
        accounts.update_by_id(
            &caller,
            &id,
            AccountPatch {
                password: request.password,
            },
        )
    })
    .await?;

    Ok(Json(AccountEnvelope { user }))
}

/// Delete the caller's own account.
#[utoipa::path(
    delete,
    path = "/api/user/{id}",
    tag = "Users",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Account id; must be the caller's own")),
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 400, description = "Invalid id"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the caller's account"),
        (status = 404, description = "Account not found"),
    )
)]
pub async fn delete_user(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Auth(caller): Auth,
) -> Result<Json<MessageResponse>, ApiError> {
    let accounts = state.accounts.clone();
    run_blocking(move || accounts.delete_by_id(&caller, &id)).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::state::test_support::test_state;

    #[tokio::test]
    async fn signup_then_login() {
        let (state, _dir) = test_state();

        let (status, Json(created)) = signup(
            State(state.clone()),
            ApiJson(SignupRequest {
                username: "alice".into(),
                password: "pw1".into(),
                role: "receptionist".into(),
            }),
        )
        .await
        .expect("signup succeeds");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.user.role, Role::Receptionist);

        let Json(login) = login(
            State(state.clone()),
            ApiJson(LoginRequest {
                username: "alice".into(),
                password: "pw1".into(),
            }),
        )
        .await
        .expect("login succeeds");
        assert_eq!(login.user, created.user);

        let verified = state.tokens.verify(&login.token, Utc::now()).unwrap();
        assert_eq!(verified.account_id, created.user.id);
    }

    #[tokio::test]
    async fn wrong_password_is_401() {
        let (state, _dir) = test_state();
        state.accounts.signup("bob", "pw1", "doctor").unwrap();

        let err = login(
            State(state),
            ApiJson(LoginRequest {
                username: "bob".into(),
                password: "nope".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn delete_requires_ownership() {
        let (state, _dir) = test_state();
        let alice = state.accounts.signup("alice", "pw1", "doctor").unwrap();
        let bob = state.accounts.signup("bob", "pw1", "doctor").unwrap();

        let issued = state.tokens.issue(bob.id, Role::Doctor, Utc::now()).unwrap();
        let caller = state.gate.authenticate(&issued.token, Utc::now()).unwrap();

        let err = delete_user(Path(alice.id.to_string()), State(state.clone()), Auth(caller.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let Json(message) = delete_user(Path(bob.id.to_string()), State(state), Auth(caller))
            .await
            .expect("own account can be deleted");
        assert_eq!(message.message, "User deleted successfully");
    }
}

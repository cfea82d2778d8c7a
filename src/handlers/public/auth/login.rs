// handlers/public/auth/login.rs - POST /auth/login handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::{BEARER_PREFIX, TOKEN_TTL_SECS};
use crate::database::models::Account;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Ready-to-send header value, `Bearer <jwt>`
    pub token: String,
    pub expires_in: i64,
    pub account: Account,
}

/// POST /auth/login - Exchange email + password for a bearer token
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "data": {
///     "token": "Bearer eyJhbGciOiJIUzI1NiI...",
///     "expires_in": 3600,
///     "account": { "id": "...", "email": "alice@example.com", ... }
///   }
/// }
/// ```
///
/// The same token is also returned in the `Authorization` response header.
/// Unknown email and wrong password both answer 401 with the same message.
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(request) = payload?;
    let outcome = state
        .account_service()
        .login(&request.email, &request.password)
        .await?;

    let bearer = format!("{}{}", BEARER_PREFIX, outcome.token);
    let response = LoginResponse {
        token: bearer.clone(),
        expires_in: TOKEN_TTL_SECS,
        account: outcome.account,
    };

    Ok(ApiResponse::success(response).with_authorization(bearer))
}

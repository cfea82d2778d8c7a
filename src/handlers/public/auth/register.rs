// handlers/public/auth/register.rs - POST /auth/register handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::database::models::Account;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::RegisterAccount;
use crate::state::AppState;

/// POST /auth/register - Create a marketplace account
///
/// Expected Input:
/// ```json
/// {
///   "email": "alice@example.com",   // Required: login identifier
///   "password": "string",           // Required: at least 8 characters
///   "display_name": "Alice",        // Required
///   "phone": "+44 ..."              // Optional
/// }
/// ```
///
/// Returns 201 with the new account, 400 with `field_errors` for invalid
/// input, 409 when the email is already registered.
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Json<RegisterAccount>, JsonRejection>,
) -> ApiResult<Account> {
    let Json(request) = payload?;
    let account = state.account_service().register(request).await?;
    Ok(ApiResponse::created(account))
}

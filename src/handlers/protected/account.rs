use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Serialize;

use crate::auth::{Principal, BEARER_PREFIX};
use crate::database::models::Account;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::UpdateAccount;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AccountUpdated {
    pub account: Account,
    /// Present when the email changed; the old token no longer resolves
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// GET /api/accounts/me - Profile of the authenticated caller
pub async fn me_get(State(state): State<AppState>, principal: Principal) -> ApiResult<Account> {
    let account = state.account_service().find(principal.account_id).await?;
    Ok(ApiResponse::success(account))
}

/// PUT /api/accounts/me - Change email, password, display name or phone
///
/// Absent fields are left as they are. When the email changes the response
/// carries a fresh token, both in the body and the `Authorization` header.
pub async fn me_put(
    State(state): State<AppState>,
    principal: Principal,
    payload: Result<Json<UpdateAccount>, JsonRejection>,
) -> ApiResult<AccountUpdated> {
    let Json(changes) = payload?;
    let outcome = state
        .account_service()
        .update(principal.account_id, changes)
        .await?;

    let token = outcome.token.map(|t| format!("{}{}", BEARER_PREFIX, t));
    let response = ApiResponse::success(AccountUpdated {
        account: outcome.account,
        token: token.clone(),
    });

    Ok(match token {
        Some(bearer) => response.with_authorization(bearer),
        None => response,
    })
}

/// DELETE /api/accounts/me - Close the caller's account
///
/// Listed products are removed with it. Tokens issued for the account stop
/// working at once since their subject no longer resolves.
pub async fn me_delete(State(state): State<AppState>, principal: Principal) -> ApiResult<()> {
    state.account_service().delete(principal.account_id).await?;
    Ok(ApiResponse::no_content())
}

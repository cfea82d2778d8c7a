use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::auth::{Principal, TokenError, BEARER_PREFIX};
use crate::database::StoreError;
use crate::error::ApiError;
use crate::state::AppState;

/// Reasons the gate refuses a presented bearer token
#[derive(Debug, Error)]
pub enum GateError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("token subject does not match any account")]
    PrincipalNotFound,

    #[error("credential lookup failed: {0}")]
    Lookup(#[from] StoreError),
}

/// Where a request ends up after the gate has looked at it.
#[derive(Debug)]
pub enum GateOutcome {
    /// No bearer credentials, or credentials that did not verify
    Anonymous,
    Authenticated(Principal),
    /// Terminal: answered with 403 before any handler runs
    Rejected(GateError),
}

/// Token after the literal `Bearer ` prefix. Any other scheme, or a missing
/// or non-ASCII header, counts as no credentials at all.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
}

/// Verify `token` and load the account it names.
///
/// The token is always decoded. A principal `established` earlier in the
/// chain is kept as is, skipping the account lookup.
pub async fn resolve_principal(
    state: &AppState,
    token: &str,
    established: Option<&Principal>,
) -> GateOutcome {
    let subject = match state.tokens.extract_subject(token) {
        Ok(subject) => subject,
        Err(e) => return GateOutcome::Rejected(e.into()),
    };

    if let Some(principal) = established {
        return GateOutcome::Authenticated(principal.clone());
    }

    let account = match state.accounts.find_by_email(&subject).await {
        Ok(Some(account)) => account,
        Ok(None) => return GateOutcome::Rejected(GateError::PrincipalNotFound),
        Err(e) => return GateOutcome::Rejected(e.into()),
    };

    match state.tokens.verify(token, &account.email) {
        Ok(true) => GateOutcome::Authenticated(Principal::from_account(&account)),
        Ok(false) => GateOutcome::Anonymous,
        Err(e) => GateOutcome::Rejected(e.into()),
    }
}

/// Authentication gate, run once per request ahead of the policy check.
///
/// Requests without bearer credentials pass through anonymously. Any failure
/// to decode, verify or resolve a presented token ends the request with the
/// same opaque 403 whatever the cause.
pub async fn authenticate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let Some(token) = bearer_token(request.headers()).map(str::to_owned) else {
        return next.run(request).await;
    };

    let established = request.extensions().get::<Principal>().cloned();

    match resolve_principal(&state, &token, established.as_ref()).await {
        GateOutcome::Authenticated(principal) => {
            tracing::debug!("Authenticated {} for {}", principal.email, request.uri().path());
            request.extensions_mut().insert(principal);
        }
        GateOutcome::Anonymous => {
            tracing::debug!("Bearer token did not verify, continuing anonymously");
        }
        GateOutcome::Rejected(reason) => {
            match &reason {
                GateError::Lookup(e) => tracing::error!("Rejecting request, {}", e),
                _ => tracing::debug!(%reason, "Rejecting bearer token"),
            }
            return ApiError::forbidden("Access denied").into_response();
        }
    }

    next.run(request).await
}

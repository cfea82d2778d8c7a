use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::database::models::{Account, Role};
use crate::error::ApiError;

/// Authenticated caller for the current request.
///
/// Built by the authentication gate after a token has been verified and the
/// account loaded, stored in the request extensions, and dropped with the
/// request. Handlers take it as an extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub account_id: Uuid,
    pub email: String,
    pub authorities: Vec<String>,
}

impl Principal {
    pub fn from_account(account: &Account) -> Self {
        let mut authorities = vec![Role::User.authority()];
        if account.role == Role::Admin {
            authorities.push(Role::Admin.authority());
        }

        Self {
            account_id: account.id,
            email: account.email.clone(),
            authorities,
        }
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }

    pub fn is_admin(&self) -> bool {
        self.has_authority(&Role::Admin.authority())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::{PasswordError, PasswordHasher, SigningError, TokenService};
use crate::database::models::Account;
use crate::database::{AccountStore, StoreError};

use super::validation::{validate_email_format, validate_name, validate_password};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Invalid account fields")]
    Validation(HashMap<String, String>),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email is already registered")]
    EmailTaken,

    #[error("Account not found")]
    NotFound,

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Signing(#[from] SigningError),
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => AccountError::EmailTaken,
            StoreError::NotFound(_) => AccountError::NotFound,
            other => AccountError::Store(other),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterAccount {
    pub email: String,
    pub password: String,
    pub display_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Profile changes. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAccount {
    pub email: Option<String>,
    pub password: Option<String>,
    pub display_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub account: Account,
    pub token: String,
}

#[derive(Debug)]
pub struct UpdateOutcome {
    pub account: Account,
    /// Fresh token when the login identifier changed
    pub token: Option<String>,
}

/// Account lifecycle on top of the credential store.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    hasher: PasswordHasher,
    tokens: Arc<TokenService>,
    audit: bool,
}

fn collect_field_errors(checks: &[(&str, Option<Result<(), String>>)]) -> Result<(), AccountError> {
    let field_errors: HashMap<String, String> = checks
        .iter()
        .filter_map(|(field, check)| match check {
            Some(Err(msg)) => Some((field.to_string(), msg.clone())),
            _ => None,
        })
        .collect();

    if field_errors.is_empty() {
        Ok(())
    } else {
        Err(AccountError::Validation(field_errors))
    }
}

impl AccountService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        hasher: PasswordHasher,
        tokens: Arc<TokenService>,
        audit: bool,
    ) -> Self {
        Self { store, hasher, tokens, audit }
    }

    /// Create an account. The password is hashed before anything is stored.
    pub async fn register(&self, request: RegisterAccount) -> Result<Account, AccountError> {
        collect_field_errors(&[
            ("email", Some(validate_email_format(&request.email))),
            ("password", Some(validate_password(&request.password))),
            ("display_name", Some(validate_name(&request.display_name))),
        ])?;

        if self.store.find_by_email(&request.email).await?.is_some() {
            return Err(AccountError::EmailTaken);
        }

        let password_hash = self.hasher.hash(&request.password).await?;
        let account = Account::new(
            request.email,
            password_hash,
            request.display_name.trim().to_string(),
            request.phone,
        );
        self.store.insert(&account).await?;

        info!("Registered account {} ({})", account.id, account.email);
        Ok(account)
    }

    /// Check credentials and issue a bearer token.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AccountError> {
        let Some(account) = self.store.find_by_email(email).await? else {
            debug!("Login rejected: unknown email");
            return Err(AccountError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &account.password_hash).await? {
            debug!("Login rejected: password mismatch for {}", account.id);
            return Err(AccountError::InvalidCredentials);
        }

        let token = self.tokens.issue(&account.email)?;
        if self.audit {
            info!(account_id = %account.id, "login succeeded");
        }

        Ok(LoginOutcome { account, token })
    }

    pub async fn find(&self, id: Uuid) -> Result<Account, AccountError> {
        self.store.find_by_id(id).await?.ok_or(AccountError::NotFound)
    }

    /// Apply profile changes.
    ///
    /// The password is re-hashed only when the submitted one differs from the
    /// stored one. An email change returns a fresh token, since tokens carry
    /// the email as their subject.
    pub async fn update(&self, id: Uuid, changes: UpdateAccount) -> Result<UpdateOutcome, AccountError> {
        collect_field_errors(&[
            ("email", changes.email.as_deref().map(validate_email_format)),
            ("password", changes.password.as_deref().map(validate_password)),
            ("display_name", changes.display_name.as_deref().map(validate_name)),
        ])?;

        let mut account = self.find(id).await?;

        let email_changed = match changes.email {
            Some(email) if email != account.email => {
                account.email = email;
                true
            }
            _ => false,
        };

        if let Some(password) = changes.password {
            if !self.hasher.verify(&password, &account.password_hash).await? {
                account.password_hash = self.hasher.hash(&password).await?;
                debug!("Password changed for account {}", account.id);
            }
        }

        if let Some(display_name) = changes.display_name {
            account.display_name = display_name.trim().to_string();
        }
        if let Some(phone) = changes.phone {
            account.phone = Some(phone);
        }

        account.updated_at = Utc::now();
        self.store.update(&account).await?;

        let token = if email_changed {
            Some(self.tokens.issue(&account.email)?)
        } else {
            None
        };

        Ok(UpdateOutcome { account, token })
    }

    /// Remove the account for good.
    pub async fn delete(&self, id: Uuid) -> Result<(), AccountError> {
        self.store.delete(id).await?;
        if self.audit {
            info!(account_id = %id, "account deleted");
        }
        Ok(())
    }
}

use std::sync::Arc;

use crate::auth::{Clock, PasswordHasher, SystemClock, TokenService};
use crate::config::AppConfig;
use crate::database::{AccountStore, CatalogStore, MemoryStore};
use crate::middleware::policy::AccessPolicy;
use crate::services::AccountService;

/// Shared, read-only handles injected into every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenService>,
    pub hasher: PasswordHasher,
    pub accounts: Arc<dyn AccountStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub policy: Arc<AccessPolicy>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        accounts: Arc<dyn AccountStore>,
        catalog: Arc<dyn CatalogStore>,
    ) -> Self {
        Self::with_clock(config, accounts, catalog, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: AppConfig,
        accounts: Arc<dyn AccountStore>,
        catalog: Arc<dyn CatalogStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tokens = TokenService::with_clock(config.security.jwt_secret.as_bytes(), clock);
        let hasher = PasswordHasher::new(config.security.bcrypt_cost);

        Self {
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            hasher,
            accounts,
            catalog,
            policy: Arc::new(AccessPolicy::marketplace()),
        }
    }

    /// State backed by a fresh in-memory store.
    pub fn in_memory(config: AppConfig, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::with_clock(config, store.clone(), store, clock)
    }

    pub fn account_service(&self) -> AccountService {
        AccountService::new(
            self.accounts.clone(),
            self.hasher,
            self.tokens.clone(),
            self.config.security.enable_audit_logging,
        )
    }
}

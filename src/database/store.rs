use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::models::{Account, Category, Product};

/// Errors surfaced by account and catalog stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl StoreError {
    /// Classify constraint violations reported by the database.
    pub(crate) fn from_sqlx(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return StoreError::Conflict(format!("{} already exists", what));
            }
            if db.is_foreign_key_violation() {
                return StoreError::InvalidReference(format!("{} references a missing record", what));
            }
        }
        StoreError::Sqlx(err)
    }
}

/// Credential store: account records keyed by id and by login identifier.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    /// Fails with `Conflict` when the email is already registered.
    async fn insert(&self, account: &Account) -> Result<(), StoreError>;

    async fn update(&self, account: &Account) -> Result<(), StoreError>;

    /// Terminal removal. Products listed by the account go with it.
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, StoreError>;

    async fn insert_category(&self, category: &Category) -> Result<(), StoreError>;

    /// Products in the category are kept, uncategorized.
    async fn delete_category(&self, id: Uuid) -> Result<(), StoreError>;

    async fn list_products(&self, category_id: Option<Uuid>) -> Result<Vec<Product>, StoreError>;

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, StoreError>;

    async fn insert_product(&self, product: &Product) -> Result<(), StoreError>;

    async fn update_product(&self, product: &Product) -> Result<(), StoreError>;

    async fn delete_product(&self, id: Uuid) -> Result<(), StoreError>;
}

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{Account, Category, Product};
use super::store::{AccountStore, CatalogStore, StoreError};

#[derive(Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    categories: HashMap<Uuid, Category>,
    products: HashMap<Uuid, Product>,
}

/// Process-local store with the same constraints as the PostgreSQL schema.
/// Used by tests and by `--memory` development runs.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(tables: &Tables, email: &str, except: Option<Uuid>) -> bool {
    tables
        .accounts
        .values()
        .any(|a| a.email == email && Some(a.id) != except)
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.tables.read().await.accounts.get(&id).cloned())
    }

    async fn insert(&self, account: &Account) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.accounts.contains_key(&account.id) || email_taken(&tables, &account.email, None) {
            return Err(StoreError::Conflict("Account already exists".to_string()));
        }
        tables.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn update(&self, account: &Account) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.accounts.contains_key(&account.id) {
            return Err(StoreError::NotFound("Account not found".to_string()));
        }
        if email_taken(&tables, &account.email, Some(account.id)) {
            return Err(StoreError::Conflict("Account already exists".to_string()));
        }
        tables.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.accounts.remove(&id).is_none() {
            return Err(StoreError::NotFound("Account not found".to_string()));
        }
        tables.products.retain(|_, p| p.seller_id != id);
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, StoreError> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn insert_category(&self, category: &Category) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.categories.values().any(|c| c.name == category.name) {
            return Err(StoreError::Conflict("Category already exists".to_string()));
        }
        tables.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn delete_category(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.categories.remove(&id).is_none() {
            return Err(StoreError::NotFound("Category not found".to_string()));
        }
        for product in tables.products.values_mut() {
            if product.category_id == Some(id) {
                product.category_id = None;
            }
        }
        Ok(())
    }

    async fn list_products(&self, category_id: Option<Uuid>) -> Result<Vec<Product>, StoreError> {
        let tables = self.tables.read().await;
        let mut products: Vec<Product> = tables
            .products
            .values()
            .filter(|p| category_id.is_none() || p.category_id == category_id)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        check_references(&tables, product)?;
        if tables.products.contains_key(&product.id) {
            return Err(StoreError::Conflict("Product already exists".to_string()));
        }
        tables.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.products.contains_key(&product.id) {
            return Err(StoreError::NotFound("Product not found".to_string()));
        }
        check_references(&tables, product)?;
        tables.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn delete_product(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.products.remove(&id).is_none() {
            return Err(StoreError::NotFound("Product not found".to_string()));
        }
        Ok(())
    }
}

fn check_references(tables: &Tables, product: &Product) -> Result<(), StoreError> {
    if !tables.accounts.contains_key(&product.seller_id) {
        return Err(StoreError::InvalidReference("Product references a missing record".to_string()));
    }
    if let Some(category_id) = product.category_id {
        if !tables.categories.contains_key(&category_id) {
            return Err(StoreError::InvalidReference("Product references a missing record".to_string()));
        }
    }
    Ok(())
}

use std::collections::HashMap;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Principal;
use crate::database::models::Product;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::validation::{validate_name, validate_price};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub category: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub category_id: Option<Uuid>,
}

impl ProductInput {
    fn validate(&self) -> Result<(), ApiError> {
        let field_errors: HashMap<String, String> = [
            ("name", validate_name(&self.name)),
            ("price", validate_price(self.price)),
        ]
        .into_iter()
        .filter_map(|(field, check)| check.err().map(|msg| (field.to_string(), msg)))
        .collect();

        if field_errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Invalid product", Some(field_errors)))
        }
    }
}

async fn ensure_category(state: &AppState, category_id: Option<Uuid>) -> Result<(), ApiError> {
    if let Some(id) = category_id {
        if state.catalog.find_category(id).await?.is_none() {
            return Err(ApiError::bad_request(format!("Category {} does not exist", id)));
        }
    }
    Ok(())
}

async fn load_product(state: &AppState, id: Uuid) -> Result<Product, ApiError> {
    state
        .catalog
        .find_product(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))
}

/// GET /api/products[?category=<uuid>]
pub async fn products_get(
    State(state): State<AppState>,
    query: Result<Query<ProductQuery>, QueryRejection>,
) -> ApiResult<Vec<Product>> {
    let Query(query) = query?;
    let products = state.catalog.list_products(query.category).await?;
    Ok(ApiResponse::success(products))
}

/// GET /api/products/:id
pub async fn product_get(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Product> {
    let Path(id) = path?;
    Ok(ApiResponse::success(load_product(&state, id).await?))
}

/// POST /api/products - List a product; the caller becomes the seller
pub async fn products_post(
    State(state): State<AppState>,
    principal: Principal,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> ApiResult<Product> {
    let Json(input) = payload?;
    input.validate()?;
    ensure_category(&state, input.category_id).await?;

    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4(),
        seller_id: principal.account_id,
        category_id: input.category_id,
        name: input.name.trim().to_string(),
        description: input.description,
        price: input.price,
        created_at: now,
        updated_at: now,
    };
    state.catalog.insert_product(&product).await?;

    tracing::debug!("Product {} listed by {}", product.id, principal.email);
    Ok(ApiResponse::created(product))
}

/// PUT /api/products/:id - Replace a listing. Only its seller may do this.
pub async fn product_put(
    State(state): State<AppState>,
    principal: Principal,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> ApiResult<Product> {
    let Path(id) = path?;
    let Json(input) = payload?;
    let mut product = load_product(&state, id).await?;

    if product.seller_id != principal.account_id {
        return Err(ApiError::forbidden("Access denied"));
    }

    input.validate()?;
    ensure_category(&state, input.category_id).await?;

    product.name = input.name.trim().to_string();
    product.description = input.description;
    product.price = input.price;
    product.category_id = input.category_id;
    product.updated_at = Utc::now();
    state.catalog.update_product(&product).await?;

    Ok(ApiResponse::success(product))
}

/// DELETE /api/products/:id - Seller or ROLE_ADMIN
pub async fn product_delete(
    State(state): State<AppState>,
    principal: Principal,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = path?;
    let product = load_product(&state, id).await?;

    if product.seller_id != principal.account_id && !principal.is_admin() {
        return Err(ApiError::forbidden("Access denied"));
    }

    state.catalog.delete_product(id).await?;
    if principal.is_admin() && product.seller_id != principal.account_id {
        tracing::info!("Admin {} removed product {}", principal.email, id);
    }
    Ok(ApiResponse::no_content())
}
